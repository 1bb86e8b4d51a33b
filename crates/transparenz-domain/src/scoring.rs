//! Confidence scoring for fact verification
//!
//! Implements the deterministic scoring formula applied to every claim
//! before an answer leaves the system. The whole module is pure functions
//! over (claim, candidate records): no clocks, no I/O, no hidden state, so
//! re-running verification against unchanged records yields the same
//! verdict.

use crate::{Claim, Decision, ExtractedRecord, VerificationResult};

/// Weight of the lexical/numeric match component (default: 0.55)
pub const WEIGHT_MATCH: f64 = 0.55;

/// Weight of the OCR confidence component (default: 0.25)
pub const WEIGHT_OCR: f64 = 0.25;

/// Weight of the corroboration component (default: 0.20)
pub const WEIGHT_CORROBORATION: f64 = 0.20;

/// Configuration for confidence scoring
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    /// Weight of the match-strength component
    pub weight_match: f64,
    /// Weight of the OCR-confidence component
    pub weight_ocr: f64,
    /// Weight of the corroboration component
    pub weight_corroboration: f64,
    /// Corroboration saturates at this many independent records
    pub corroboration_cap: usize,
    /// Minimum per-record match strength for the record to count as evidence
    pub min_match_strength: f64,
    /// Confidence at or above this is Verified
    pub high_threshold: f64,
    /// Confidence below this is Rejected
    pub low_threshold: f64,
    /// Amounts above this are implausible for a municipality (10 M EUR)
    pub max_plausible_amount: f64,
    /// Years before this are implausible
    pub min_year: u16,
    /// Years after this are implausible
    pub max_year: u16,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weight_match: WEIGHT_MATCH,
            weight_ocr: WEIGHT_OCR,
            weight_corroboration: WEIGHT_CORROBORATION,
            corroboration_cap: 3,
            min_match_strength: 0.35,
            high_threshold: 0.7,
            low_threshold: 0.4,
            max_plausible_amount: 10_000_000.0,
            min_year: 1990,
            max_year: 2100,
        }
    }
}

/// Compute how strongly one record supports a claim, in [0, 1]
///
/// Two components: the fraction of claim subject/predicate tokens present
/// in the record text, and (for numeric claims) whether the claimed number
/// appears in the text. Implausible claims score zero outright.
pub fn match_strength(claim: &Claim, record: &ExtractedRecord, config: &ScoringConfig) -> f64 {
    if !is_plausible(claim, config) {
        return 0.0;
    }

    let text = record.text.to_lowercase();

    let tokens: Vec<String> = claim
        .subject
        .split(|c: char| !c.is_alphanumeric())
        .chain(claim.predicate.split(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.len() > 2)
        .map(|t| t.to_lowercase())
        .collect();

    let lexical = if tokens.is_empty() {
        0.0
    } else {
        let hits = tokens.iter().filter(|t| text.contains(t.as_str())).count();
        hits as f64 / tokens.len() as f64
    };

    match claim.numeric_value() {
        Some(amount) => {
            let numeric = if contains_amount(&text, amount) { 1.0 } else { 0.0 };
            0.5 * lexical + 0.5 * numeric
        }
        None => lexical,
    }
}

/// Reject claims outside the plausible range for municipal data
///
/// Mirrors the plausibility rules applied at verification time: amounts
/// above the cap and years outside the configured range cannot be backed
/// by real evidence, so they never match.
fn is_plausible(claim: &Claim, config: &ScoringConfig) -> bool {
    if let Some(amount) = claim.numeric_value() {
        if amount.abs() > config.max_plausible_amount {
            return false;
        }
    }
    if let Some(year) = claim.year {
        if year < config.min_year || year > config.max_year {
            return false;
        }
    }
    true
}

/// Check whether an amount appears in the text
///
/// Accepts the plain digit form and the German thousands-dot form
/// (25000 or 25.000).
fn contains_amount(text: &str, amount: f64) -> bool {
    if amount.fract() != 0.0 {
        return text.contains(&format!("{}", amount).replace('.', ","));
    }

    let plain = format!("{}", amount as i64);
    if text.contains(&plain) {
        return true;
    }
    text.contains(&german_grouped(amount as i64))
}

/// Format an integer with German thousands separators (25000 -> "25.000")
fn german_grouped(n: i64) -> String {
    let digits = n.abs().to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Corroboration factor: more independent matching records raise
/// confidence, saturating at the configured cap
fn corroboration_factor(matched: usize, cap: usize) -> f64 {
    if cap == 0 {
        return 0.0;
    }
    (matched.min(cap)) as f64 / cap as f64
}

/// Verify a claim against candidate records
///
/// This is the fact-check gate as a pure function: score each record,
/// keep those above the evidence floor, blend match strength, OCR
/// confidence and corroboration into a single confidence, then band the
/// result into a decision. A claim with no qualifying evidence is
/// Rejected with zero confidence.
pub fn verify_claim(
    claim: &Claim,
    records: &[ExtractedRecord],
    config: &ScoringConfig,
) -> VerificationResult {
    let mut scored: Vec<(f64, &ExtractedRecord)> = records
        .iter()
        .map(|r| (match_strength(claim, r, config), r))
        .filter(|(s, _)| *s >= config.min_match_strength)
        .collect();

    if scored.is_empty() {
        return VerificationResult {
            claim_id: claim.id,
            matched_record_ids: Vec::new(),
            confidence: 0.0,
            decision: Decision::Rejected,
        };
    }

    // Strongest evidence first; tie-break on id for determinism
    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    let best_match = scored[0].0;
    let ocr_confidence =
        scored.iter().map(|(_, r)| r.mean_confidence()).sum::<f64>() / scored.len() as f64;
    let corroboration = corroboration_factor(scored.len(), config.corroboration_cap);

    let confidence = (config.weight_match * best_match
        + config.weight_ocr * ocr_confidence
        + config.weight_corroboration * corroboration)
        .clamp(0.0, 1.0);

    let decision = if confidence >= config.high_threshold {
        Decision::Verified
    } else if confidence >= config.low_threshold {
        Decision::Unverified
    } else {
        Decision::Rejected
    };

    VerificationResult {
        claim_id: claim.id,
        matched_record_ids: scored.iter().map(|(_, r)| r.id).collect(),
        confidence,
        decision,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, RecordId, TaskId};

    fn record(text: &str, confidences: Vec<f64>) -> ExtractedRecord {
        ExtractedRecord {
            id: RecordId::new(),
            source_task: TaskId::new(),
            text: text.to_string(),
            page_confidences: confidences,
            extracted_at: 1000,
            category: Category::Finanzen,
            year: Some(2023),
        }
    }

    fn amount_claim() -> Claim {
        Claim::new("Straßen", "ausgaben", "25000")
            .with_unit("EUR")
            .with_category(Category::Finanzen)
            .with_year(2023)
    }

    #[test]
    fn test_match_strength_full_hit() {
        let config = ScoringConfig::default();
        let r = record("Straßensanierung Ausgaben 25000 Euro im Jahr 2023", vec![]);
        let s = match_strength(&amount_claim(), &r, &config);
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_strength_german_grouping() {
        let config = ScoringConfig::default();
        let r = record("Ausgaben für Straßen: 25.000 Euro", vec![]);
        let s = match_strength(&amount_claim(), &r, &config);
        assert!((s - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_match_strength_no_hit() {
        let config = ScoringConfig::default();
        let r = record("Kulturveranstaltung am Stadtplatz", vec![]);
        let s = match_strength(&amount_claim(), &r, &config);
        assert!(s < config.min_match_strength);
    }

    #[test]
    fn test_implausible_amount_scores_zero() {
        let config = ScoringConfig::default();
        let claim = Claim::new("Straßen", "ausgaben", "99000000000");
        let r = record("Straßen ausgaben 99000000000", vec![]);
        assert_eq!(match_strength(&claim, &r, &config), 0.0);
    }

    #[test]
    fn test_implausible_year_scores_zero() {
        let config = ScoringConfig::default();
        let claim = Claim::new("Straßen", "ausgaben", "25000").with_year(1850);
        let r = record("Straßen ausgaben 25000", vec![]);
        assert_eq!(match_strength(&claim, &r, &config), 0.0);
    }

    #[test]
    fn test_verify_matching_record_is_verified() {
        let config = ScoringConfig::default();
        let records = vec![record("Straßensanierung Ausgaben 25000 Euro", vec![0.95, 0.92])];
        let result = verify_claim(&amount_claim(), &records, &config);

        assert_eq!(result.decision, Decision::Verified);
        assert!(result.confidence >= config.high_threshold);
        assert_eq!(result.matched_record_ids, vec![records[0].id]);
        assert!(result.holds_invariant(config.high_threshold));
    }

    #[test]
    fn test_verify_no_records_is_rejected() {
        let config = ScoringConfig::default();
        let result = verify_claim(&amount_claim(), &[], &config);

        assert_eq!(result.decision, Decision::Rejected);
        assert_eq!(result.confidence, 0.0);
        assert!(result.matched_record_ids.is_empty());
    }

    #[test]
    fn test_verify_unrelated_records_is_rejected() {
        let config = ScoringConfig::default();
        let records = vec![
            record("Kulturveranstaltung am Stadtplatz", vec![]),
            record("Personalkosten der Verwaltung", vec![]),
        ];
        let result = verify_claim(&amount_claim(), &records, &config);

        assert_eq!(result.decision, Decision::Rejected);
        assert!(result.matched_record_ids.is_empty());
    }

    #[test]
    fn test_corroboration_raises_confidence() {
        let config = ScoringConfig::default();
        let one = vec![record("Straßen ausgaben 25000", vec![])];
        let three = vec![
            record("Straßen ausgaben 25000", vec![]),
            record("Straßen ausgaben 25000 laut Budget", vec![]),
            record("Ausgaben Straßen 25000 Euro", vec![]),
        ];

        let single = verify_claim(&amount_claim(), &one, &config);
        let corroborated = verify_claim(&amount_claim(), &three, &config);

        assert!(corroborated.confidence > single.confidence);
    }

    #[test]
    fn test_corroboration_saturates() {
        let config = ScoringConfig::default();
        let make = |n: usize| -> Vec<ExtractedRecord> {
            (0..n).map(|_| record("Straßen ausgaben 25000", vec![])).collect()
        };

        let at_cap = verify_claim(&amount_claim(), &make(3), &config);
        let beyond_cap = verify_claim(&amount_claim(), &make(8), &config);

        assert!((at_cap.confidence - beyond_cap.confidence).abs() < 1e-9);
    }

    #[test]
    fn test_verification_is_idempotent() {
        let config = ScoringConfig::default();
        let records = vec![
            record("Straßensanierung 25000 Euro", vec![0.9]),
            record("Budget Straßen 2023", vec![]),
        ];
        let claim = amount_claim();

        let first = verify_claim(&claim, &records, &config);
        let second = verify_claim(&claim, &records, &config);

        assert_eq!(first, second);
    }

    #[test]
    fn test_german_grouped() {
        assert_eq!(german_grouped(25000), "25.000");
        assert_eq!(german_grouped(1234567), "1.234.567");
        assert_eq!(german_grouped(999), "999");
        assert_eq!(german_grouped(-25000), "-25.000");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::{Category, RecordId, TaskId};
    use proptest::prelude::*;

    fn arb_record() -> impl Strategy<Value = ExtractedRecord> {
        ("[a-zA-Z0-9 ]{0,80}", proptest::collection::vec(0.0f64..=1.0, 0..4)).prop_map(
            |(text, confidences)| ExtractedRecord {
                id: RecordId::new(),
                source_task: TaskId::new(),
                text,
                page_confidences: confidences,
                extracted_at: 0,
                category: Category::Dokumente,
                year: None,
            },
        )
    }

    proptest! {
        /// Property: confidence is always within [0, 1]
        #[test]
        fn test_confidence_range(records in proptest::collection::vec(arb_record(), 0..6)) {
            let config = ScoringConfig::default();
            let claim = Claim::new("Straßen", "ausgaben", "25000");
            let result = verify_claim(&claim, &records, &config);

            prop_assert!(result.confidence >= 0.0 && result.confidence <= 1.0);
        }

        /// Property: Verified always cites at least one record
        #[test]
        fn test_verified_implies_citable(records in proptest::collection::vec(arb_record(), 0..6)) {
            let config = ScoringConfig::default();
            let claim = Claim::new("Straßen", "ausgaben", "25000");
            let result = verify_claim(&claim, &records, &config);

            prop_assert!(result.holds_invariant(config.high_threshold));
        }

        /// Property: match strength is bounded
        #[test]
        fn test_match_strength_range(record in arb_record()) {
            let config = ScoringConfig::default();
            let claim = Claim::new("Straßen", "ausgaben", "25000");
            let s = match_strength(&claim, &record, &config);

            prop_assert!((0.0..=1.0).contains(&s));
        }
    }
}
