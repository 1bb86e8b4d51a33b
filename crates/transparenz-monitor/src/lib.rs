//! Transparenz Quality Monitoring
//!
//! Consumes ingestion completion events and verification results,
//! maintains rolling metric windows (1 h and 24 h) and raises threshold
//! alerts for operators. Everything here is observational; nothing blocks
//! ingestion or query serving.

#![warn(missing_docs)]

pub mod monitor;
pub mod window;
pub mod worker;

pub use monitor::{
    Alert, AlertKind, IngestObservation, QualityMonitor, QualityThresholds, MAX_ALERTS,
};
pub use window::{MetricSample, QualityMetricWindow};
pub use worker::MonitorWorker;
