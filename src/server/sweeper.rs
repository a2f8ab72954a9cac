use crate::domain_port::*;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Periodically drops ledger rows that can no longer be rotated.
pub struct LedgerSweeper {
    ledger: Arc<dyn RefreshLedger>,
    interval: Duration,
    cancellation_token: CancellationToken,
}

impl LedgerSweeper {
    pub fn new(
        ledger: Arc<dyn RefreshLedger>,
        interval: Duration,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            ledger,
            interval: interval.max(Duration::from_secs(1)),
            cancellation_token,
        }
    }

    pub async fn sweep_once(&self) -> Result<u64, LedgerError> {
        let purged = self.ledger.purge_expired(Utc::now()).await?;
        if purged > 0 {
            tracing::info!(purged, "expired refresh tokens purged");
        }
        Ok(purged)
    }

    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("Ledger sweeper shutting down...");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!("Ledger sweeper error: {e}");
                    }
                }
            }
        }
    }
}
