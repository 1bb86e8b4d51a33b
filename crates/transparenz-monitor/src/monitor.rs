//! Quality monitor
//!
//! Consumes ingestion and fact-check outcomes, maintains rolling metric
//! windows and raises threshold alerts. Alerts are observational only:
//! they never block ingestion or query serving.

use crate::window::{MetricSample, QualityMetricWindow};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::warn;
use transparenz_domain::{Decision, VerificationResult};

/// Maximum number of alerts kept in history
pub const MAX_ALERTS: usize = 100;

/// Alert thresholds
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct QualityThresholds {
    /// Alert when the success rate drops below this
    pub min_success_rate: f64,
    /// Alert when average confidence drops below this
    pub min_average_confidence: f64,
    /// Alert when p95 extraction latency exceeds this
    pub max_p95_latency_ms: u64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            min_success_rate: 0.8,
            min_average_confidence: 0.7,
            max_p95_latency_ms: 5_000,
        }
    }
}

/// What an alert is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    /// Success rate below threshold
    SuccessRate,
    /// Average confidence below threshold
    Confidence,
    /// p95 latency above bound
    Latency,
}

/// A raised alert condition
#[derive(Debug, Clone, serde::Serialize)]
pub struct Alert {
    /// What the alert is about
    pub kind: AlertKind,
    /// Human-readable description
    pub message: String,
    /// When the alert was raised (milliseconds since Unix epoch)
    pub at_ms: u64,
    /// Whether an operator marked it resolved
    pub resolved: bool,
}

/// One ingestion outcome as seen by the monitor
#[derive(Debug, Clone)]
pub struct IngestObservation {
    /// Whether the file was extracted and persisted
    pub success: bool,
    /// Wall-clock extraction time
    pub latency: Duration,
}

/// Rolling quality metrics with threshold alerting
pub struct QualityMonitor {
    thresholds: QualityThresholds,
    windows: Mutex<Vec<(&'static str, QualityMetricWindow)>>,
    alerts: Mutex<Vec<Alert>>,
}

impl QualityMonitor {
    /// Create a monitor with 1 h and 24 h windows
    pub fn new(thresholds: QualityThresholds) -> Self {
        Self {
            thresholds,
            windows: Mutex::new(vec![
                ("1h", QualityMetricWindow::new(Duration::from_secs(3600))),
                ("24h", QualityMetricWindow::new(Duration::from_secs(24 * 3600))),
            ]),
            alerts: Mutex::new(Vec::new()),
        }
    }

    /// Create a monitor with default thresholds
    pub fn default_thresholds() -> Self {
        Self::new(QualityThresholds::default())
    }

    /// Record an ingestion outcome
    pub fn observe_ingest(&self, observation: IngestObservation) {
        self.observe_ingest_at(observation, now_ms());
    }

    /// Record an ingestion outcome at an explicit timestamp
    pub fn observe_ingest_at(&self, observation: IngestObservation, at_ms: u64) {
        self.push(MetricSample {
            at_ms,
            success: observation.success,
            confidence: None,
            latency_ms: Some(observation.latency.as_millis() as u64),
        });
    }

    /// Record a fact-check outcome
    ///
    /// A rejected claim counts as an unsuccessful sample; Verified and
    /// Unverified both count as successes with their confidence.
    pub fn observe_verification(&self, result: &VerificationResult) {
        self.observe_verification_at(result, now_ms());
    }

    /// Record a fact-check outcome at an explicit timestamp
    pub fn observe_verification_at(&self, result: &VerificationResult, at_ms: u64) {
        self.push(MetricSample {
            at_ms,
            success: result.decision != Decision::Rejected,
            confidence: Some(result.confidence),
            latency_ms: None,
        });
    }

    fn push(&self, sample: MetricSample) {
        let mut windows = self.windows.lock().unwrap();
        for (_, window) in windows.iter_mut() {
            window.push(sample.clone());
        }
    }

    /// Evaluate thresholds against the short window, raising alerts
    ///
    /// Returns the alerts raised by this sweep. The alert history is
    /// bounded to the last `MAX_ALERTS` entries.
    pub fn sweep(&self, now_ms: u64) -> Vec<Alert> {
        let mut raised = Vec::new();

        {
            let mut windows = self.windows.lock().unwrap();
            for (_, window) in windows.iter_mut() {
                window.evict(now_ms);
            }

            let (_, short) = &windows[0];

            if let Some(rate) = short.success_rate() {
                if rate < self.thresholds.min_success_rate {
                    raised.push(Alert {
                        kind: AlertKind::SuccessRate,
                        message: format!(
                            "success rate {:.1}% below threshold {:.1}%",
                            rate * 100.0,
                            self.thresholds.min_success_rate * 100.0
                        ),
                        at_ms: now_ms,
                        resolved: false,
                    });
                }
            }

            if let Some(confidence) = short.average_confidence() {
                if confidence < self.thresholds.min_average_confidence {
                    raised.push(Alert {
                        kind: AlertKind::Confidence,
                        message: format!(
                            "average confidence {:.2} below threshold {:.2}",
                            confidence, self.thresholds.min_average_confidence
                        ),
                        at_ms: now_ms,
                        resolved: false,
                    });
                }
            }

            if let Some(p95) = short.p95_latency_ms() {
                if p95 > self.thresholds.max_p95_latency_ms {
                    raised.push(Alert {
                        kind: AlertKind::Latency,
                        message: format!(
                            "p95 extraction latency {}ms above bound {}ms",
                            p95, self.thresholds.max_p95_latency_ms
                        ),
                        at_ms: now_ms,
                        resolved: false,
                    });
                }
            }
        }

        if !raised.is_empty() {
            let mut alerts = self.alerts.lock().unwrap();
            for alert in &raised {
                warn!(kind = ?alert.kind, "{}", alert.message);
                alerts.push(alert.clone());
            }
            let len = alerts.len();
            if len > MAX_ALERTS {
                alerts.drain(0..len - MAX_ALERTS);
            }
        }

        raised
    }

    /// Alerts not yet marked resolved
    pub fn active_alerts(&self) -> Vec<Alert> {
        self.alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    /// Mark an alert resolved by its position in the history
    pub fn resolve_alert(&self, index: usize) {
        let mut alerts = self.alerts.lock().unwrap();
        if let Some(alert) = alerts.get_mut(index) {
            alert.resolved = true;
        }
    }

    /// Generate a plain-text quality report
    pub fn report(&self, now_ms: u64) -> String {
        let mut windows = self.windows.lock().unwrap();
        let mut lines = vec![
            "Quality Report".to_string(),
            "==============".to_string(),
        ];

        for (name, window) in windows.iter_mut() {
            window.evict(now_ms);
            lines.push(format!("Window {} ({} samples):", name, window.len()));
            match window.success_rate() {
                Some(rate) => lines.push(format!("  success rate: {:.1}%", rate * 100.0)),
                None => lines.push("  success rate: n/a".to_string()),
            }
            match window.average_confidence() {
                Some(c) => lines.push(format!("  avg confidence: {:.2}", c)),
                None => lines.push("  avg confidence: n/a".to_string()),
            }
            match window.p95_latency_ms() {
                Some(p95) => lines.push(format!("  p95 latency: {}ms", p95)),
                None => lines.push("  p95 latency: n/a".to_string()),
            }
        }

        let active = self
            .alerts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| !a.resolved)
            .count();
        lines.push(format!("Active alerts: {}", active));

        lines.join("\n")
    }

    /// Export metrics and alert history as JSON
    pub fn export_json(&self, now_ms: u64) -> serde_json::Value {
        let mut windows = self.windows.lock().unwrap();
        let windows_json: Vec<serde_json::Value> = windows
            .iter_mut()
            .map(|(name, window)| {
                window.evict(now_ms);
                serde_json::json!({
                    "name": name,
                    "samples": window.len(),
                    "success_rate": window.success_rate(),
                    "average_confidence": window.average_confidence(),
                    "p95_latency_ms": window.p95_latency_ms(),
                })
            })
            .collect();

        serde_json::json!({
            "windows": windows_json,
            "alerts": &*self.alerts.lock().unwrap(),
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
