//! German query analysis
//!
//! Extracts structured filters (years, amounts, categories) and search
//! terms from a natural-language question, then derives the claims the
//! verification gate has to check. Pattern-based on purpose: the heavy
//! NLP model sits outside the system boundary, and everything the gate
//! relies on must be deterministic.

use regex::Regex;
use transparenz_domain::{Category, Claim};

/// Intent of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    /// Spending, income, budget questions
    Financial,
    /// Document and protocol lookups
    Documents,
    /// Statistics and trend questions
    Statistics,
    /// Anything else
    General,
}

impl QueryIntent {
    /// Predicate keyword used in derived claims
    fn predicate(&self) -> &'static str {
        match self {
            QueryIntent::Financial => "ausgaben",
            QueryIntent::Documents => "dokument",
            QueryIntent::Statistics => "statistik",
            QueryIntent::General => "",
        }
    }
}

/// Structured view of one analyzed question
#[derive(Debug, Clone)]
pub struct QueryAnalysis {
    /// The original question, verbatim
    pub original: String,
    /// Detected intent
    pub intent: QueryIntent,
    /// Years mentioned (absolute, relative or as a range)
    pub years: Vec<u16>,
    /// Amounts mentioned, parsed from German number format
    pub amounts: Vec<f64>,
    /// Document categories matched by keyword
    pub categories: Vec<Category>,
    /// Remaining content-bearing search terms
    pub search_terms: Vec<String>,
    /// How much structure the analyzer found, in [0, 1]
    pub confidence: f64,
}

impl QueryAnalysis {
    /// Derive the claims this question asserts
    ///
    /// Each mentioned amount becomes one numeric claim; a question without
    /// amounts becomes a single lexical claim over its search terms. An
    /// empty analysis yields no claims, which the checker reports as "no
    /// verified data".
    pub fn claims(&self) -> Vec<Claim> {
        let subject = self.search_terms.join(" ");
        if subject.is_empty() && self.amounts.is_empty() {
            return Vec::new();
        }

        let category = self.categories.first().copied();
        let year = self.years.first().copied();

        let decorate = |claim: Claim| {
            let claim = match category {
                Some(c) => claim.with_category(c),
                None => claim,
            };
            match year {
                Some(y) => claim.with_year(y),
                None => claim,
            }
        };

        if self.amounts.is_empty() {
            return vec![decorate(Claim::new(
                subject.clone(),
                self.intent.predicate(),
                subject,
            ))];
        }

        self.amounts
            .iter()
            .map(|amount| {
                let value = if amount.fract() == 0.0 {
                    format!("{}", *amount as i64)
                } else {
                    format!("{}", amount)
                };
                decorate(
                    Claim::new(subject.clone(), self.intent.predicate(), value).with_unit("EUR"),
                )
            })
            .collect()
    }
}

/// Pattern-based analyzer for German queries
pub struct QueryAnalyzer {
    current_year: u16,
    year: Regex,
    year_range: Regex,
    amount: Regex,
}

/// German stopwords and question words dropped from search terms
const STOPWORDS: &[&str] = &[
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einer", "einem", "einen", "und",
    "oder", "aber", "für", "von", "mit", "aus", "bei", "nach", "über", "unter", "zwischen", "bis",
    "auf", "wie", "was", "wer", "wann", "wieviel", "viel", "viele", "wurde", "wurden", "wird",
    "werden", "hat", "haben", "ist", "sind", "war", "waren", "gibt", "gab", "zeige", "finde",
    "suche", "alle", "jahr", "jahre", "euro",
];

const FINANCIAL_KEYWORDS: &[&str] = &[
    "ausgaben", "kosten", "aufwand", "bezahlt", "gezahlt", "einnahmen", "budget", "haushalt",
    "etat", "geld", "euro", "finanz",
];
const DOCUMENT_KEYWORDS: &[&str] = &["dokument", "protokoll", "bericht", "datei", "pdf", "sitzung"];
const STATISTICS_KEYWORDS: &[&str] = &["statistik", "entwicklung", "trend", "vergleich", "analyse"];

impl QueryAnalyzer {
    /// Create an analyzer; `current_year` anchors relative year phrases
    pub fn new(current_year: u16) -> Self {
        Self {
            current_year,
            year: Regex::new(r"\b(19|20)\d{2}\b").expect("static year pattern is valid"),
            year_range: Regex::new(r"(?:zwischen|von)\s+((?:19|20)\d{2})\s+(?:und|bis)\s+((?:19|20)\d{2})")
                .expect("static range pattern is valid"),
            amount: Regex::new(r"\b\d{1,3}(?:\.\d{3})+(?:,\d{1,2})?\b|\b\d+(?:,\d{1,2})?\s*(?:€|euro)")
                .expect("static amount pattern is valid"),
        }
    }

    /// Analyze one question
    pub fn analyze(&self, query: &str) -> QueryAnalysis {
        let lower = query.to_lowercase();

        let intent = self.detect_intent(&lower);
        let years = self.extract_years(&lower);
        let amounts = self.extract_amounts(&lower);
        let categories = self.extract_categories(&lower);
        let search_terms = self.extract_search_terms(&lower);

        let mut confidence: f64 = 0.5;
        if !years.is_empty() {
            confidence += 0.2;
        }
        if !amounts.is_empty() {
            confidence += 0.2;
        }
        if !categories.is_empty() {
            confidence += 0.2;
        }
        if !search_terms.is_empty() {
            confidence += 0.1;
        }

        QueryAnalysis {
            original: query.to_string(),
            intent,
            years,
            amounts,
            categories,
            search_terms,
            confidence: confidence.min(1.0),
        }
    }

    fn detect_intent(&self, query: &str) -> QueryIntent {
        if FINANCIAL_KEYWORDS.iter().any(|k| query.contains(k)) {
            QueryIntent::Financial
        } else if DOCUMENT_KEYWORDS.iter().any(|k| query.contains(k)) {
            QueryIntent::Documents
        } else if STATISTICS_KEYWORDS.iter().any(|k| query.contains(k)) {
            QueryIntent::Statistics
        } else {
            QueryIntent::General
        }
    }

    fn extract_years(&self, query: &str) -> Vec<u16> {
        // Ranges win over single mentions: "von 2020 bis 2022" is all three
        if let Some(range) = self.year_range.captures(query) {
            let start: u16 = range[1].parse().unwrap_or(0);
            let end: u16 = range[2].parse().unwrap_or(0);
            if start > 0 && end >= start {
                return (start..=end).collect();
            }
        }

        let mut years: Vec<u16> = self
            .year
            .find_iter(query)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();

        if query.contains("letztes jahr") || query.contains("voriges jahr") {
            years.push(self.current_year - 1);
        } else if query.contains("dieses jahr") {
            years.push(self.current_year);
        }

        years.dedup();
        years
    }

    fn extract_amounts(&self, query: &str) -> Vec<f64> {
        self.amount
            .find_iter(query)
            .filter_map(|m| {
                let raw = m
                    .as_str()
                    .trim_end_matches("euro")
                    .trim_end_matches('€')
                    .trim();
                parse_german_amount(raw)
            })
            .collect()
    }

    fn extract_categories(&self, query: &str) -> Vec<Category> {
        let mut categories = Vec::new();

        const TABLE: &[(&[&str], Category)] = &[
            (&["protokoll", "sitzung", "gemeinderat"], Category::Protokolle),
            (
                &["budget", "haushalt", "finanz", "ausgaben", "kosten", "rechnung"],
                Category::Finanzen,
            ),
            (&["bericht", "statistik", "analyse"], Category::Berichte),
        ];

        for (keywords, category) in TABLE {
            if keywords.iter().any(|k| query.contains(k)) {
                categories.push(*category);
            }
        }

        categories
    }

    fn extract_search_terms(&self, query: &str) -> Vec<String> {
        let mut terms: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() > 2)
            .filter(|t| !STOPWORDS.contains(t))
            .filter(|t| t.chars().any(|c| c.is_alphabetic()))
            .map(str::to_string)
            .collect();

        terms.dedup();
        terms
    }
}

/// Parse a German-formatted amount ("25.000,50" -> 25000.50)
pub fn parse_german_amount(raw: &str) -> Option<f64> {
    let normalized = raw.replace('.', "").replace(',', ".");
    normalized.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzer() -> QueryAnalyzer {
        QueryAnalyzer::new(2024)
    }

    #[test]
    fn test_financial_query() {
        let analysis = analyzer().analyze("Wieviel Ausgaben gab es 2023 für Straßen?");

        assert_eq!(analysis.intent, QueryIntent::Financial);
        assert_eq!(analysis.years, vec![2023]);
        assert_eq!(analysis.categories, vec![Category::Finanzen]);
        assert!(analysis.search_terms.contains(&"straßen".to_string()));
        assert!(analysis.confidence > 0.8);
    }

    #[test]
    fn test_year_range() {
        let analysis = analyzer().analyze("Entwicklung der Kosten zwischen 2020 und 2022");
        assert_eq!(analysis.years, vec![2020, 2021, 2022]);
    }

    #[test]
    fn test_relative_year() {
        let analysis = analyzer().analyze("Was wurde letztes Jahr bezahlt?");
        assert_eq!(analysis.years, vec![2023]);
    }

    #[test]
    fn test_german_amount_extraction() {
        let analysis = analyzer().analyze("Gab es Ausgaben über 25.000 Euro?");
        assert_eq!(analysis.amounts, vec![25000.0]);
    }

    #[test]
    fn test_amount_with_decimal_comma() {
        assert_eq!(parse_german_amount("25.000,50"), Some(25000.50));
        assert_eq!(parse_german_amount("999"), Some(999.0));
        assert_eq!(parse_german_amount("1.234.567"), Some(1234567.0));
    }

    #[test]
    fn test_document_intent() {
        let analysis = analyzer().analyze("Zeige alle Protokolle der Sitzung");
        assert_eq!(analysis.intent, QueryIntent::Documents);
        assert_eq!(analysis.categories, vec![Category::Protokolle]);
    }

    #[test]
    fn test_claims_from_amount_query() {
        let analysis = analyzer().analyze("Wurden 2023 für Straßensanierung 25.000 Euro ausgegeben?");
        let claims = analysis.claims();

        assert_eq!(claims.len(), 1);
        let claim = &claims[0];
        assert_eq!(claim.value, "25000");
        assert_eq!(claim.unit.as_deref(), Some("EUR"));
        assert_eq!(claim.year, Some(2023));
        assert!(claim.subject.contains("straßensanierung"));
    }

    #[test]
    fn test_claims_from_lexical_query() {
        let analysis = analyzer().analyze("Gemeinderat Beschluss Uferpromenade");
        let claims = analysis.claims();

        assert_eq!(claims.len(), 1);
        assert!(claims[0].numeric_value().is_none());
        assert_eq!(claims[0].category, Some(Category::Protokolle));
    }

    #[test]
    fn test_empty_query_yields_no_claims() {
        let analysis = analyzer().analyze("und oder aber");
        assert!(analysis.claims().is_empty());
    }

    #[test]
    fn test_stopwords_removed() {
        let analysis = analyzer().analyze("Wie viele Dokumente gibt es über die Schule?");
        assert!(!analysis.search_terms.iter().any(|t| t == "wie" || t == "gibt"));
        assert!(analysis.search_terms.contains(&"schule".to_string()));
    }
}
