use super::manager::{JailService, UnjailOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{error, info};

/// What one pass of the expiry runner did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub unjailed: usize,
    pub failed: usize,
}

impl JailService {
    /// Starts the background task that lifts expired jails every `period`.
    pub fn start_unjail_runner(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Jail unjail runner started (every {:?}).", period);
            loop {
                sleep(period).await;
                let summary = self.sweep_expired(Utc::now()).await;
                if summary != SweepSummary::default() {
                    info!(
                        "Jail sweep finished: {} unjailed, {} failed",
                        summary.unjailed, summary.failed
                    );
                }
            }
        })
    }

    /// Unjail every member whose jail expired at or before `now`.
    ///
    /// Each member goes through the same transition as a manual unjail; a
    /// failure for one member is logged and the sweep moves on.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> SweepSummary {
        let mut summary = SweepSummary::default();

        let expired = match self.store.expired_records(now).await {
            Ok(expired) => expired,
            Err(e) => {
                error!("Failed to fetch expired jails: {:?}", e);
                return summary;
            }
        };

        for record in expired {
            info!(
                "Unjailing user {} (jail expired at {})",
                record.user_id, record.expires_at
            );

            match self.unjail_expired(record.user_id, now).await {
                Ok(UnjailOutcome::Unjailed(_)) => summary.unjailed += 1,
                Ok(UnjailOutcome::NotJailed) => {}
                Err(e) => {
                    summary.failed += 1;
                    error!("Failed to unjail user {}: {:?}", record.user_id, e);
                }
            }
        }

        summary
    }
}
