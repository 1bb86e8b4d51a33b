//! Claims and verification results
//!
//! A claim is a normalized factual assertion derived from a candidate query
//! answer. Every claim must pass the fact-check gate before it reaches a
//! caller; the gate's verdict is a `VerificationResult`.

use crate::{Category, ClaimId, RecordId};

/// A normalized (subject, predicate, value, unit?) assertion
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,

    /// What the claim is about, e.g. "Straßensanierung"
    pub subject: String,

    /// The asserted relation, e.g. "ausgaben"
    pub predicate: String,

    /// The asserted value, e.g. "25000"
    pub value: String,

    /// Optional unit for numeric values, e.g. "EUR"
    pub unit: Option<String>,

    /// Category filter for evidence lookup
    pub category: Option<Category>,

    /// Year filter for evidence lookup
    pub year: Option<u16>,
}

impl Claim {
    /// Create a claim with a fresh id
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: ClaimId::new(),
            subject: subject.into(),
            predicate: predicate.into(),
            value: value.into(),
            unit: None,
            category: None,
            year: None,
        }
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Set the category filter
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the year filter
    pub fn with_year(mut self, year: u16) -> Self {
        self.year = Some(year);
        self
    }

    /// Numeric interpretation of the value, if it parses
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.parse::<f64>().ok()
    }
}

/// Verdict for a single claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    /// Confidence at or above the high threshold, with citable evidence
    Verified,
    /// Between the thresholds; returned to the caller flagged as uncertain
    Unverified,
    /// Below the low threshold; dropped from the final answer
    Rejected,
}

impl Decision {
    /// Get the decision name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Verified => "verified",
            Decision::Unverified => "unverified",
            Decision::Rejected => "rejected",
        }
    }
}

/// Outcome of fact-checking one claim against the document store
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct VerificationResult {
    /// The claim that was checked
    pub claim_id: ClaimId,

    /// Records that support the claim; empty when nothing matched
    pub matched_record_ids: Vec<RecordId>,

    /// Confidence in [0, 1]
    pub confidence: f64,

    /// The verdict
    pub decision: Decision,
}

impl VerificationResult {
    /// Check the core invariant: Verified implies citable evidence
    ///
    /// A verified result must cite at least one record and carry a
    /// confidence of at least `high_threshold`.
    pub fn holds_invariant(&self, high_threshold: f64) -> bool {
        match self.decision {
            Decision::Verified => {
                !self.matched_record_ids.is_empty() && self.confidence >= high_threshold
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_builder() {
        let claim = Claim::new("Straßensanierung", "ausgaben", "25000")
            .with_unit("EUR")
            .with_category(Category::Finanzen)
            .with_year(2023);

        assert_eq!(claim.unit.as_deref(), Some("EUR"));
        assert_eq!(claim.category, Some(Category::Finanzen));
        assert_eq!(claim.year, Some(2023));
        assert_eq!(claim.numeric_value(), Some(25000.0));
    }

    #[test]
    fn test_non_numeric_value() {
        let claim = Claim::new("Gemeinderat", "beschluss", "Sanierung");
        assert_eq!(claim.numeric_value(), None);
    }

    #[test]
    fn test_verified_invariant() {
        let ok = VerificationResult {
            claim_id: ClaimId::new(),
            matched_record_ids: vec![RecordId::new()],
            confidence: 0.85,
            decision: Decision::Verified,
        };
        assert!(ok.holds_invariant(0.7));

        let uncited = VerificationResult {
            claim_id: ClaimId::new(),
            matched_record_ids: vec![],
            confidence: 0.85,
            decision: Decision::Verified,
        };
        assert!(!uncited.holds_invariant(0.7));

        let rejected = VerificationResult {
            claim_id: ClaimId::new(),
            matched_record_ids: vec![],
            confidence: 0.1,
            decision: Decision::Rejected,
        };
        assert!(rejected.holds_invariant(0.7));
    }
}
