//! Integration tests for transparenz-store
//!
//! These tests verify the full put/get/query cycle for both backends and
//! the immutability guarantee for stored records.

use transparenz_domain::traits::{DocumentStore, RecordFilter};
use transparenz_domain::{Category, ExtractedRecord, RecordId, TaskId};
use transparenz_store::{MemoryStore, SqliteStore, StoreError};

fn record(text: &str, category: Category, year: Option<u16>) -> ExtractedRecord {
    ExtractedRecord {
        id: RecordId::new(),
        source_task: TaskId::new(),
        text: text.to_string(),
        page_confidences: vec![],
        extracted_at: 1700000000,
        category,
        year,
    }
}

fn seed<S: DocumentStore>(store: &mut S)
where
    S::Error: std::fmt::Debug,
{
    store.put(record("Straßensanierung 25.000 Euro", Category::Finanzen, Some(2023))).unwrap();
    store.put(record("Gemeinderatsprotokoll Sitzung Mai", Category::Protokolle, Some(2023))).unwrap();
    store.put(record("Jahresbericht Statistik", Category::Berichte, Some(2022))).unwrap();
    store.put(record("Personalkosten Verwaltung", Category::Finanzen, Some(2022))).unwrap();
}

#[test]
fn test_query_by_category_both_backends() {
    let mut mem = MemoryStore::new();
    let mut sql = SqliteStore::new(":memory:").unwrap();
    seed(&mut mem);
    seed(&mut sql);

    let filter = RecordFilter {
        category: Some(Category::Finanzen),
        ..Default::default()
    };

    assert_eq!(mem.query(&filter).unwrap().len(), 2);
    assert_eq!(sql.query(&filter).unwrap().len(), 2);
}

#[test]
fn test_query_by_year() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    seed(&mut store);

    let filter = RecordFilter { year: Some(2022), ..Default::default() };
    let results = store.query(&filter).unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.year == Some(2022)));
}

#[test]
fn test_query_by_text_match() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    seed(&mut store);

    let filter = RecordFilter {
        text_match: Some("25.000".to_string()),
        ..Default::default()
    };
    let results = store.query(&filter).unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].text.contains("Straßensanierung"));
}

#[test]
fn test_combined_filters() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    seed(&mut store);

    let filter = RecordFilter {
        category: Some(Category::Finanzen),
        year: Some(2023),
        ..Default::default()
    };
    let results = store.query(&filter).unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].text.contains("Straßensanierung"));
}

#[test]
fn test_query_results_ordered_by_id() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    seed(&mut store);

    let results = store.query(&RecordFilter::default()).unwrap();
    let ids: Vec<_> = results.iter().map(|r| r.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn test_records_are_immutable() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let original = record("Originaltext", Category::Dokumente, None);
    store.put(original.clone()).unwrap();

    // A "re-ingestion" with the same id must be rejected, not overwrite
    let mut changed = original.clone();
    changed.text = "Anderer Text".to_string();
    assert!(matches!(store.put(changed), Err(StoreError::Duplicate)));

    let fetched = store.get(original.id).unwrap().unwrap();
    assert_eq!(fetched.text, "Originaltext");
}

#[test]
fn test_persistence_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");

    let r = record("Budget 2023", Category::Finanzen, Some(2023));
    let id = {
        let mut store = SqliteStore::new(&path).unwrap();
        store.put(r.clone()).unwrap()
    };

    let store = SqliteStore::new(&path).unwrap();
    let fetched = store.get(id).unwrap().unwrap();
    assert_eq!(fetched, r);
}

#[test]
fn test_ocr_confidences_round_trip() {
    let mut store = SqliteStore::new(":memory:").unwrap();
    let mut r = record("Gescanntes Protokoll", Category::Protokolle, Some(2021));
    r.page_confidences = vec![0.91, 0.85, 0.78];

    let id = store.put(r.clone()).unwrap();
    let fetched = store.get(id).unwrap().unwrap();

    assert_eq!(fetched.page_confidences, vec![0.91, 0.85, 0.78]);
    assert!(fetched.is_ocr());
}
