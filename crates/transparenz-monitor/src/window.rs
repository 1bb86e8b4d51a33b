//! Sliding metric windows
//!
//! A window is append-and-evict only: samples enter at the back, expire at
//! the front, and are never edited retroactively.

use std::collections::VecDeque;
use std::time::Duration;

/// One observation entering the window
#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricSample {
    /// Observation timestamp (milliseconds since Unix epoch)
    pub at_ms: u64,
    /// Whether the observed operation succeeded
    pub success: bool,
    /// Verification confidence, when the sample came from a fact check
    pub confidence: Option<f64>,
    /// Extraction latency, when the sample came from ingestion
    pub latency_ms: Option<u64>,
}

/// Rolling counters over a sliding time window
#[derive(Debug, Clone, serde::Serialize)]
pub struct QualityMetricWindow {
    window_ms: u64,
    samples: VecDeque<MetricSample>,
}

impl QualityMetricWindow {
    /// Create a window of the given duration
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: window.as_millis() as u64,
            samples: VecDeque::new(),
        }
    }

    /// Append a sample, evicting everything that has aged out
    pub fn push(&mut self, sample: MetricSample) {
        let now = sample.at_ms;
        self.samples.push_back(sample);
        self.evict(now);
    }

    /// Evict samples older than the window relative to `now_ms`
    pub fn evict(&mut self, now_ms: u64) {
        let cutoff = now_ms.saturating_sub(self.window_ms);
        while let Some(front) = self.samples.front() {
            if front.at_ms < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Number of samples currently in the window
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Fraction of successful samples, if any samples exist
    pub fn success_rate(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let successes = self.samples.iter().filter(|s| s.success).count();
        Some(successes as f64 / self.samples.len() as f64)
    }

    /// Mean confidence over samples that carry one
    pub fn average_confidence(&self) -> Option<f64> {
        let confidences: Vec<f64> = self.samples.iter().filter_map(|s| s.confidence).collect();
        if confidences.is_empty() {
            return None;
        }
        Some(confidences.iter().sum::<f64>() / confidences.len() as f64)
    }

    /// 95th percentile latency over samples that carry one
    pub fn p95_latency_ms(&self) -> Option<u64> {
        let mut latencies: Vec<u64> = self.samples.iter().filter_map(|s| s.latency_ms).collect();
        if latencies.is_empty() {
            return None;
        }
        latencies.sort_unstable();
        let rank = ((latencies.len() as f64) * 0.95).ceil() as usize;
        Some(latencies[rank.saturating_sub(1)])
    }
}
