use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::server::LedgerSweeper;
use crate::settings::Settings;
use anyhow::anyhow;
use sqlx::MySqlPool;
use sqlx::mysql::MySqlPoolOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub request_timeout: Duration,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        // No key, no service: refuse to start rather than sign with a default.
        let key = SigningKey::new(settings.jwt.resolve_signing_key()?).map_err(|e| anyhow!(e))?;
        let issuer_config = IssuerConfig::try_new(
            settings.http.issuer(),
            Duration::from_secs(settings.jwt.access_ttl_secs),
            Duration::from_secs(settings.jwt.refresh_ttl_secs),
        )
        .map_err(|e| anyhow!("invalid jwt lifetimes: {e}"))?;
        let signer: Arc<dyn TokenSigner> =
            Arc::new(JwtHs256Signer::new(&key, &issuer_config.issuer));
        let issuer = Arc::new(TokenPairIssuer::new(signer.clone(), issuer_config));

        let (user_repo, ledger, pool): (Arc<dyn UserRepo>, Arc<dyn RefreshLedger>, _) =
            match settings.storage.backend.as_str() {
                "memory" => (
                    Arc::new(MemoryUserRepo::new()),
                    Arc::new(MemoryRefreshLedger::new()),
                    None,
                ),
                "mysql" => {
                    let dsn = settings
                        .storage
                        .mysql_dsn
                        .as_deref()
                        .ok_or_else(|| anyhow!("storage.mysql_dsn is required for mysql"))?;
                    let pool = MySqlPoolOptions::new()
                        .max_connections(settings.storage.max_connections)
                        .acquire_timeout(Duration::from_secs(5))
                        .connect(dsn)
                        .await?;
                    if settings.storage.run_migrations {
                        MIGRATOR.run(&pool).await?;
                        info!("database migrations applied");
                    }
                    (
                        Arc::new(MySqlUserRepo::new(pool.clone())),
                        Arc::new(MySqlRefreshLedger::new(pool.clone())),
                        Some(pool),
                    )
                }
                other => return Err(anyhow!("Unknown storage backend: {}", other)),
            };

        let auth_service: Arc<dyn AuthService> = Arc::new(
            RealAuthService::new(
                user_repo,
                Arc::new(Argon2PasswordHasher),
                signer,
                issuer,
                ledger.clone(),
            )
            .with_min_password_len(settings.auth.min_password_len),
        );

        let cancel = CancellationToken::new();
        let sweeper = LedgerSweeper::new(
            ledger,
            Duration::from_secs(settings.ledger.sweep_interval_secs),
            cancel.clone(),
        );
        let sweeper_handle = tokio::spawn(async move { sweeper.run().await });

        info!(
            backend = %settings.storage.backend,
            issuer = %settings.http.issuer(),
            "server started"
        );

        Ok(Self {
            auth_service,
            request_timeout: Duration::from_millis(settings.http.request_timeout_ms),
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self.sweeper_handle.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
