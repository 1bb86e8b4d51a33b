//! SQLite-backed document store

use crate::StoreError;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use transparenz_domain::traits::{DocumentStore, RecordFilter};
use transparenz_domain::{Category, ExtractedRecord, RecordId, TaskId};

/// SQLite-based implementation of `DocumentStore`
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Each thread should have its own
/// `SqliteStore` instance, or the store should sit behind a mutex.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a store at the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use transparenz_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("transparenz.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn id_to_bytes(value: u128) -> Vec<u8> {
        value.to_be_bytes().to_vec()
    }

    fn bytes_to_u128(bytes: &[u8]) -> Result<u128, StoreError> {
        if bytes.len() != 16 {
            return Err(StoreError::InvalidData(format!(
                "Expected 16 bytes for id, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(bytes);
        Ok(u128::from_be_bytes(arr))
    }

    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExtractedRecord> {
        let id_bytes: Vec<u8> = row.get(0)?;
        let task_bytes: Vec<u8> = row.get(1)?;
        let confidences_json: String = row.get(3)?;
        let category_str: String = row.get(5)?;
        let year: Option<i64> = row.get(6)?;

        let id = Self::bytes_to_u128(&id_bytes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Blob, Box::new(e))
        })?;
        let task = Self::bytes_to_u128(&task_bytes).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Blob, Box::new(e))
        })?;

        let page_confidences: Vec<f64> = serde_json::from_str(&confidences_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let category = Category::parse(&category_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                5,
                rusqlite::types::Type::Text,
                Box::new(StoreError::InvalidData(format!(
                    "Unknown category: {}",
                    category_str
                ))),
            )
        })?;

        Ok(ExtractedRecord {
            id: RecordId::from_value(id),
            source_task: TaskId::from_value(task),
            text: row.get(2)?,
            page_confidences,
            extracted_at: row.get::<_, i64>(4)? as u64,
            category,
            year: year.map(|y| y as u16),
        })
    }
}

impl DocumentStore for SqliteStore {
    type Error = StoreError;

    fn put(&mut self, record: ExtractedRecord) -> Result<RecordId, Self::Error> {
        let id_bytes = Self::id_to_bytes(record.id.value());

        // Records are immutable: a second put of the same id is an error
        let exists: bool = self
            .conn
            .query_row(
                "SELECT 1 FROM records WHERE id = ?1",
                params![&id_bytes],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if exists {
            return Err(StoreError::Duplicate);
        }

        let confidences_json = serde_json::to_string(&record.page_confidences)
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        self.conn.execute(
            "INSERT INTO records (id, source_task, text, page_confidences, extracted_at, category, year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                &id_bytes,
                &Self::id_to_bytes(record.source_task.value()),
                &record.text,
                &confidences_json,
                record.extracted_at as i64,
                record.category.as_str(),
                record.year.map(|y| y as i64),
            ],
        )?;

        Ok(record.id)
    }

    fn get(&self, id: RecordId) -> Result<Option<ExtractedRecord>, Self::Error> {
        let id_bytes = Self::id_to_bytes(id.value());

        let record = self
            .conn
            .query_row(
                "SELECT id, source_task, text, page_confidences, extracted_at, category, year
                 FROM records WHERE id = ?1",
                params![&id_bytes],
                Self::row_to_record,
            )
            .optional()?;

        Ok(record)
    }

    fn query(&self, filter: &RecordFilter) -> Result<Vec<ExtractedRecord>, Self::Error> {
        let mut sql = String::from(
            "SELECT id, source_task, text, page_confidences, extracted_at, category, year
             FROM records WHERE 1=1",
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(category) = filter.category {
            sql.push_str(" AND category = ?");
            params.push(Box::new(category.as_str().to_string()));
        }

        if let Some(year) = filter.year {
            sql.push_str(" AND year = ?");
            params.push(Box::new(year as i64));
        }

        if let Some(text) = &filter.text_match {
            sql.push_str(" AND text LIKE ?");
            params.push(Box::new(format!("%{}%", text)));
        }

        sql.push_str(" ORDER BY id");

        if let Some(limit) = filter.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let records = stmt
            .query_map(&param_refs[..], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, category: Category, year: Option<u16>) -> ExtractedRecord {
        ExtractedRecord {
            id: RecordId::new(),
            source_task: TaskId::new(),
            text: text.to_string(),
            page_confidences: vec![0.9, 0.8],
            extracted_at: 1700000000,
            category,
            year,
        }
    }

    #[test]
    fn test_store_initialization() {
        assert!(SqliteStore::new(":memory:").is_ok());
    }

    #[test]
    fn test_put_get_round_trip() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let r = record("Budget Straßen 25.000 Euro", Category::Finanzen, Some(2023));

        let id = store.put(r.clone()).unwrap();
        let fetched = store.get(id).unwrap().unwrap();

        assert_eq!(fetched, r);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let r = record("Budget", Category::Finanzen, Some(2023));

        store.put(r.clone()).unwrap();
        assert!(matches!(store.put(r), Err(StoreError::Duplicate)));
    }

    #[test]
    fn test_get_missing_returns_none() {
        let store = SqliteStore::new(":memory:").unwrap();
        assert!(store.get(RecordId::new()).unwrap().is_none());
    }
}
