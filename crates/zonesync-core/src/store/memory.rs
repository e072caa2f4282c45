// # Memory Store
//
// In-memory implementation of RecordStore.
//
// Holds a zone as text behind a lock. Nothing persists; useful for tests and
// for piping a zone through `generate` without touching disk.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{apply_edit, Edit};
use crate::record::Record;
use crate::traits::RecordStore;
use crate::Error;

/// In-memory zone store
///
/// Clones share the same buffer.
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::store::MemoryStore;
/// use zonesync_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStore::new("$ORIGIN example.com.\n@ 3600 A 192.0.2.1\n");
///
///     let records = store.records().await?;
///     assert_eq!(records.len(), 1);
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<String>>,
}

impl MemoryStore {
    /// Create a store holding `text`
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(text.into())),
        }
    }

    /// Current zone text
    pub async fn contents(&self) -> String {
        self.inner.read().await.clone()
    }

    async fn edit(&self, edit: Edit<'_>) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        *guard = apply_edit(&guard, edit)?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn read(&self) -> Result<String, Error> {
        Ok(self.contents().await)
    }

    async fn write(&self, text: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        *guard = text.to_string();
        Ok(())
    }

    async fn add(&self, record: &Record) -> Result<(), Error> {
        self.edit(Edit::Add(record)).await
    }

    async fn remove(&self, record: &Record) -> Result<(), Error> {
        self.edit(Edit::Remove(record)).await
    }

    async fn change(&self, old: &Record, new: &Record) -> Result<(), Error> {
        self.edit(Edit::Change(old, new)).await
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
