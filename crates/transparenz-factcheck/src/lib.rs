//! Transparenz Fact-Checking Layer
//!
//! The gate between stored evidence and anything a caller gets to see.
//! A question is decomposed into claims, every claim is cross-referenced
//! against the document store, and only claims with a computable, backed
//! confidence survive. Verification failure is a normal outcome here, not
//! an error: a claim without evidence is Rejected, and an answer with no
//! surviving claims is an explicit "no verified data" result.

#![warn(missing_docs)]

pub mod checker;
pub mod query;

pub use checker::{Answer, AnsweredClaim, CheckerConfig, FactChecker, QueryResponse};
pub use query::{parse_german_amount, QueryAnalysis, QueryAnalyzer, QueryIntent};

use thiserror::Error;

/// Errors surfaced by the fact checker
///
/// Only infrastructure problems are errors; unverifiable claims are
/// regular `Rejected` outcomes.
#[derive(Error, Debug)]
pub enum FactCheckError {
    /// The document store failed
    #[error("Store error: {0}")]
    Store(String),
}
