use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub storage: Storage,
    pub jwt: Jwt,
    #[serde(default)]
    pub ledger: Ledger,
    #[serde(default)]
    pub auth: Auth,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
    /// Advertised base URL; also the token issuer. Defaults to `http://<address>`.
    pub public_url: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    pub tls: Option<Tls>,
}

impl Http {
    pub fn issuer(&self) -> String {
        match &self.public_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.address),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
    pub backend: String, // "mysql" or "memory"
    pub mysql_dsn: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default)]
    pub run_migrations: bool,
}

#[derive(Clone, Deserialize)]
pub struct Jwt {
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    pub signing_key: Option<String>,
    #[serde(default = "default_signing_key_env")]
    pub signing_key_env: String,
}

impl Jwt {
    /// Inline key first, then the environment variable named by `signing_key_env`.
    pub fn resolve_signing_key(&self) -> Result<Vec<u8>> {
        if let Some(key) = self.signing_key.as_ref().filter(|k| !k.is_empty()) {
            return Ok(key.clone().into_bytes());
        }
        match std::env::var(&self.signing_key_env) {
            Ok(key) if !key.is_empty() => Ok(key.into_bytes()),
            _ => Err(anyhow!(
                "no signing key: set jwt.signing_key or {}",
                self.signing_key_env
            )),
        }
    }
}

impl std::fmt::Debug for Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwt")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("signing_key", &self.signing_key.as_ref().map(|_| "<redacted>"))
            .field("signing_key_env", &self.signing_key_env)
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ledger {
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Ledger {
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

impl Default for Auth {
    fn default() -> Self {
        Auth {
            min_password_len: default_min_password_len(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_max_connections() -> u32 {
    10
}

fn default_access_ttl_secs() -> u64 {
    15 * 60
}

fn default_refresh_ttl_secs() -> u64 {
    5 * 24 * 60 * 60
}

fn default_signing_key_env() -> String {
    "JWT_SIGNING_KEY".to_string()
}

fn default_sweep_interval_secs() -> u64 {
    60 * 60
}

fn default_min_password_len() -> usize {
    1
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub const ENV_PREFIX: &str = "GATEHOUSE";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
