use crate::orchestrator::PipelineRun;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};
use trendwatch_core::ErrorExt;

/// Drives pipeline runs back-to-back, one polling interval apart.
pub struct BackgroundService {
    polling_interval: Duration,
}

impl BackgroundService {
    pub fn new(polling_interval_minutes: u64) -> Self {
        Self::from_interval(Duration::from_secs(polling_interval_minutes.saturating_mul(60)))
    }

    pub fn from_interval(polling_interval: Duration) -> Self {
        Self { polling_interval }
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    /// Run until `shutdown` resolves and return how many runs were started.
    ///
    /// A run is never interrupted: shutdown is only observed while waiting for
    /// the next interval. A failed run is logged and the loop carries on.
    pub async fn run_periodically<P, F>(&self, runner: &mut P, shutdown: F) -> usize
    where
        P: PipelineRun,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut runs = 0usize;

        loop {
            runs += 1;
            match runner.run_once().await {
                Ok(report) => info!(
                    "Run {} finished ({} posts, {} likes)",
                    report.run_id,
                    report.posts_processed,
                    report.likes()
                ),
                Err(e) => {
                    e.log_error();
                    warn!("Run failed; next attempt in {:?}", self.polling_interval);
                }
            }

            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested, stopping after {} runs", runs);
                    return runs;
                }
                _ = sleep(self.polling_interval) => {}
            }
        }
    }
}
