//! Background worker for continuous quality monitoring

use crate::QualityMonitor;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{interval, Duration};

/// Background worker that sweeps the quality monitor on a schedule
///
/// Each tick evaluates the alert thresholds against the rolling windows
/// and logs anything raised. Alerts are observational; the worker never
/// touches ingestion or query serving.
pub struct MonitorWorker {
    monitor: Arc<QualityMonitor>,
    interval: Duration,
}

impl MonitorWorker {
    /// Create a worker sweeping at the given interval
    pub fn new(monitor: Arc<QualityMonitor>, interval: Duration) -> Self {
        Self { monitor, interval }
    }

    /// Run until a shutdown signal (Ctrl+C) is received
    pub async fn run(&self) {
        let mut ticker = interval(self.interval);

        tracing::info!("quality monitor started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let raised = self.monitor.sweep(now_ms());
                    if !raised.is_empty() {
                        tracing::info!("sweep raised {} alert(s)", raised.len());
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("shutdown signal received, stopping quality monitor");
                    break;
                }
            }
        }

        tracing::info!("quality monitor stopped\n{}", self.monitor.report(now_ms()));
    }

    /// Run for a specific number of sweep cycles (useful for testing)
    pub async fn run_cycles(&self, cycles: usize) {
        let mut ticker = interval(self.interval);

        for cycle in 0..cycles {
            ticker.tick().await;
            let raised = self.monitor.sweep(now_ms());
            tracing::debug!("sweep {}/{} raised {} alert(s)", cycle + 1, cycles, raised.len());
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
