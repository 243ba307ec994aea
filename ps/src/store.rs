//! RowStore trait definition and in-memory implementation

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{PlanEntry, Record, StoreError};

/// Append/query gateway over the backing table
///
/// Rows are only ever appended; there is no update or delete.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Make sure the table exists with the fixed header (idempotent)
    async fn ensure_table(&self) -> Result<(), StoreError>;

    /// Append one row in backend insertion order
    async fn append(&self, entry: &PlanEntry) -> Result<(), StoreError>;

    /// Fetch every stored row as a header-keyed record
    async fn fetch_all(&self) -> Result<Vec<Record>, StoreError>;
}

/// Process-local store, used for dry runs and tests
///
/// Can be switched into a failing mode to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Record>>,
    fail_with: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        debug!("MemoryStore::new: called");
        Self::default()
    }

    /// Create a store pre-filled with records
    pub fn with_records(records: Vec<Record>) -> Self {
        debug!(count = records.len(), "MemoryStore::with_records: called");
        Self {
            rows: Mutex::new(records),
            fail_with: Mutex::new(None),
        }
    }

    /// Make every subsequent call fail with `StoreError::ApiError { status: 503 }`
    pub async fn set_failing(&self, message: Option<&str>) {
        debug!(?message, "MemoryStore::set_failing: called");
        *self.fail_with.lock().await = message.map(str::to_string);
    }

    /// Snapshot of the stored rows
    pub async fn records(&self) -> Vec<Record> {
        self.rows.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.lock().await.is_empty()
    }

    async fn check_failing(&self) -> Result<(), StoreError> {
        match self.fail_with.lock().await.as_ref() {
            Some(message) => Err(StoreError::ApiError {
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn ensure_table(&self) -> Result<(), StoreError> {
        debug!("MemoryStore::ensure_table: called");
        self.check_failing().await
    }

    async fn append(&self, entry: &PlanEntry) -> Result<(), StoreError> {
        debug!(date = %entry.date(), class = %entry.class(), "MemoryStore::append: called");
        self.check_failing().await?;
        self.rows.lock().await.push(entry.to_record());
        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, StoreError> {
        debug!("MemoryStore::fetch_all: called");
        self.check_failing().await?;
        Ok(self.records().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(date: &str, class: &str) -> PlanEntry {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        PlanEntry::new(ts, date, class, "Title", "note https://a.test")
    }

    #[tokio::test]
    async fn test_append_then_fetch_preserves_order() {
        let store = MemoryStore::new();
        store.append(&entry("2025-01-02", "8B")).await.unwrap();
        store.append(&entry("2025-01-01", "8A")).await.unwrap();

        let rows = store.fetch_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date(), "2025-01-02");
        assert_eq!(rows[1].date(), "2025-01-01");
        assert_eq!(rows[1].field("links"), "https://a.test");
    }

    #[tokio::test]
    async fn test_append_does_not_dedup() {
        let store = MemoryStore::new();
        let e = entry("2025-01-01", "8A");
        store.append(&e).await.unwrap();
        store.append(&e).await.unwrap();
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let store = MemoryStore::new();
        store.set_failing(Some("backend down")).await;

        let result = store.append(&entry("2025-01-01", "8A")).await;
        assert!(matches!(result, Err(StoreError::ApiError { status: 503, .. })));
        assert!(store.fetch_all().await.is_err());
        assert!(store.is_empty().await);

        store.set_failing(None).await;
        assert!(store.fetch_all().await.is_ok());
    }
}
