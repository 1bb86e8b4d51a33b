//! Document categories and filename-derived metadata

/// Category of a municipal document
///
/// Derived from filename keywords at ingestion time; used as a query filter
/// by the fact checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Council meeting minutes
    Protokolle,
    /// Budget and financial records
    Finanzen,
    /// Reports, statistics, analyses
    Berichte,
    /// Everything else
    Dokumente,
}

impl Category {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Protokolle => "protokolle",
            Category::Finanzen => "finanzen",
            Category::Berichte => "berichte",
            Category::Dokumente => "dokumente",
        }
    }

    /// Parse a category from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "protokolle" => Some(Category::Protokolle),
            "finanzen" => Some(Category::Finanzen),
            "berichte" => Some(Category::Berichte),
            "dokumente" => Some(Category::Dokumente),
            _ => None,
        }
    }

    /// Derive a category from a filename
    ///
    /// Keyword table: protokoll/sitzung/gemeinderat map to minutes,
    /// budget/finanz/rechnung/kosten to finance, bericht/statistik/analyse
    /// to reports. Unmatched filenames land in the catch-all category.
    pub fn from_filename(filename: &str) -> Self {
        let name = filename.to_lowercase();

        const PROTOKOLLE: &[&str] = &["protokoll", "sitzung", "gemeinderat"];
        const FINANZEN: &[&str] = &["budget", "finanz", "rechnung", "kosten", "haushalt"];
        const BERICHTE: &[&str] = &["bericht", "statistik", "analyse"];

        if PROTOKOLLE.iter().any(|k| name.contains(k)) {
            Category::Protokolle
        } else if FINANZEN.iter().any(|k| name.contains(k)) {
            Category::Finanzen
        } else if BERICHTE.iter().any(|k| name.contains(k)) {
            Category::Berichte
        } else {
            Category::Dokumente
        }
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid category: {}", s))
    }
}

/// Extract a four-digit year from a filename
///
/// Matches the first 19xx or 20xx sequence that is not part of a longer
/// digit run (so `20230115` yields nothing, `budget_2023.pdf` yields 2023).
pub fn year_from_filename(filename: &str) -> Option<u16> {
    let bytes = filename.as_bytes();

    for start in 0..bytes.len().saturating_sub(3) {
        let window = &bytes[start..start + 4];
        if !window.iter().all(|b| b.is_ascii_digit()) {
            continue;
        }
        // Reject digits that extend beyond a clean four-digit run
        let before_digit = start > 0 && bytes[start - 1].is_ascii_digit();
        let after_digit = start + 4 < bytes.len() && bytes[start + 4].is_ascii_digit();
        if before_digit || after_digit {
            continue;
        }
        let year: u16 = filename[start..start + 4].parse().ok()?;
        if (1900..2100).contains(&year) {
            return Some(year);
        }
    }

    None
}
