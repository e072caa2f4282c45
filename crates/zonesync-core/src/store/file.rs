// # Filesystem Store
//
// RecordStore backed by a zone file on disk.
//
// ## Writes
//
// - Atomic: new text goes to `<file>.tmp`, flushed, then renamed over the
//   zone file, so a crash never leaves a half-written zone
// - Parent directories are created on first write
// - Mutations hold a lock across read-modify-write

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{apply_edit, Edit};
use crate::record::Record;
use crate::traits::RecordStore;
use crate::Error;

/// Zone file store
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::store::FilesystemStore;
/// use zonesync_core::traits::RecordStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FilesystemStore::new("Zonefile");
///
///     for record in store.diffable_records().await? {
///         println!("{}", record);
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FilesystemStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FilesystemStore {
    /// Store for the zone file at `path`; nothing is touched until first use
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    /// Zone file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_file(&self) -> Result<String, Error> {
        fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read zone file {}: {}", self.path.display(), e),
            ))
        })
    }

    /// Write `text` to the zone file atomically
    async fn write_file(&self, text: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(text.as_bytes()).await?;
            file.flush().await?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::config(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Zone written to file: {}", self.path.display());
        Ok(())
    }

    async fn edit(&self, edit: Edit<'_>) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let text = self.read_file().await?;
        let updated = apply_edit(&text, edit)?;
        self.write_file(&updated).await
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RecordStore for FilesystemStore {
    async fn read(&self) -> Result<String, Error> {
        let _guard = self.lock.lock().await;
        self.read_file().await
    }

    async fn write(&self, text: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        self.write_file(text).await
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
        "filesystem"
    }
}
