//! The fact-check gate
//!
//! Every answer-producing query passes through here before anything is
//! returned to a caller. Claims are checked against the document store and
//! scored with the pure functions in `transparenz_domain::scoring`; an
//! answer consisting only of rejected claims becomes an explicit
//! "no verified data" result instead of a fabricated response.

use crate::query::QueryAnalyzer;
use crate::FactCheckError;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};
use transparenz_domain::scoring::{self, ScoringConfig};
use transparenz_domain::traits::{DocumentStore, RecordFilter};
use transparenz_domain::{Claim, Decision, RecordId, VerificationResult};

/// Configuration for the fact checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Scoring weights and decision thresholds
    pub scoring: ScoringConfig,
    /// Maximum records fetched per claim
    pub query_limit: usize,
    /// Current year, anchoring relative year phrases in queries
    pub current_year: u16,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            scoring: ScoringConfig::default(),
            query_limit: 100,
            current_year: 2025,
        }
    }
}

/// One claim as returned to the caller
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnsweredClaim {
    /// Subject of the claim
    pub subject: String,
    /// Asserted value
    pub value: String,
    /// Verdict (Verified or Unverified; Rejected claims are dropped)
    pub decision: Decision,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Records backing the claim
    pub cited_record_ids: Vec<RecordId>,
}

/// Final answer for one query
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// No claim survived verification; nothing is fabricated in its place
    NoVerifiedData,
    /// At least one claim is backed by stored records
    Answered {
        /// Surviving claims with citations
        claims: Vec<AnsweredClaim>,
    },
}

/// Answer plus the raw verification results, for observers
#[derive(Debug, Clone)]
pub struct QueryResponse {
    /// The answer as returned to the caller
    pub answer: Answer,
    /// Every verification result, including rejections
    pub results: Vec<VerificationResult>,
}

/// The gate that verifies claims against stored extracted records
pub struct FactChecker<S> {
    store: Arc<Mutex<S>>,
    config: CheckerConfig,
    analyzer: QueryAnalyzer,
}

impl<S> FactChecker<S>
where
    S: DocumentStore,
    S::Error: std::fmt::Display,
{
    /// Create a checker over a shared document store
    pub fn new(store: Arc<Mutex<S>>, config: CheckerConfig) -> Self {
        let analyzer = QueryAnalyzer::new(config.current_year);
        Self {
            store,
            config,
            analyzer,
        }
    }

    /// Verify a single claim against the store
    ///
    /// Queries by the claim's category/year filters, then applies the pure
    /// scoring function. Holds no lock beyond the store query itself.
    pub fn verify(&self, claim: &Claim) -> Result<VerificationResult, FactCheckError> {
        let filter = RecordFilter {
            category: claim.category,
            year: claim.year,
            text_match: None,
            limit: Some(self.config.query_limit),
        };

        let records = {
            let store = self.store.lock().unwrap();
            store
                .query(&filter)
                .map_err(|e| FactCheckError::Store(e.to_string()))?
        };

        debug!(
            subject = %claim.subject,
            candidates = records.len(),
            "verifying claim"
        );

        Ok(scoring::verify_claim(claim, &records, &self.config.scoring))
    }

    /// Answer a natural-language question
    ///
    /// Decomposes the question into claims, verifies each one and drops
    /// everything Rejected. When nothing survives, the caller gets an
    /// explicit `NoVerifiedData` answer.
    pub fn answer(&self, question: &str) -> Result<QueryResponse, FactCheckError> {
        let analysis = self.analyzer.analyze(question);
        let claims = analysis.claims();

        info!(
            question,
            intent = ?analysis.intent,
            claims = claims.len(),
            "checking query"
        );

        let mut answered = Vec::new();
        let mut results = Vec::new();

        for claim in &claims {
            let result = self.verify(claim)?;

            if result.decision != Decision::Rejected {
                answered.push(AnsweredClaim {
                    subject: claim.subject.clone(),
                    value: claim.value.clone(),
                    decision: result.decision,
                    confidence: result.confidence,
                    cited_record_ids: result.matched_record_ids.clone(),
                });
            }

            results.push(result);
        }

        let answer = if answered.is_empty() {
            Answer::NoVerifiedData
        } else {
            Answer::Answered { claims: answered }
        };

        Ok(QueryResponse { answer, results })
    }

    /// The analyzer's view of a question, without verification
    pub fn analyze(&self, question: &str) -> crate::query::QueryAnalysis {
        self.analyzer.analyze(question)
    }
}
