//! Sync engine
//!
//! The [`SyncEngine`] converges a destination zone onto a source zone:
//!
//! ```text
//! ┌──────────┐  diffable records  ┌──────────┐
//! │  source  │───────────────────▶│          │
//! └──────────┘                    │   diff   │──▶ validate ──▶ + manifest ops ──▶ apply
//! ┌──────────┐  diffable records  │          │                                     │
//! │  dest    │───────────────────▶│          │                                     │
//! └──────────┘                    └──────────┘                                     │
//!       ▲                                                                          │
//!       └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flow
//!
//! 1. Read both sides once and derive their manifests
//! 2. Diff destination → source over diffable records
//! 3. Validate the operations against the destination manifest
//! 4. Append the manifest update and, for legacy zones, the checksum update
//! 5. Log each operation and apply it unless dry-running
//!
//! Operations are applied strictly one after another; the first failure
//! stops the run.

use tracing::{debug, info, warn};

use crate::config::SyncOptions;
use crate::diff::{diff, Operation};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::traits::RecordStore;
use crate::validator::validate;

/// Log target of the per-operation lines a sync emits
pub const OPERATION_LOG_TARGET: &str = "zonesync::operation";

/// One-way zone synchronization
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Inspect with [`SyncEngine::plan()`] or apply with [`SyncEngine::run()`]
pub struct SyncEngine {
    /// Zone being copied from
    source: Box<dyn RecordStore>,

    /// Zone being converged
    destination: Box<dyn RecordStore>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Parameters
    ///
    /// - `source`: Authoritative zone definition
    /// - `destination`: Live zone to update
    pub fn new(source: Box<dyn RecordStore>, destination: Box<dyn RecordStore>) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Compute and validate the operations a run would apply
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Operation>)`: Record operations, then manifest and checksum operations
    /// - `Err(Error)`: A validation failure or a store error
    pub async fn plan(&self, force: bool) -> Result<Vec<Operation>> {
        let source = self.source.manifest().await?;
        let destination = self.destination.manifest().await?;

        let from = destination.diffable_records();
        let to = source.diffable_records();
        debug!(
            "Diffing {} destination records against {} source records",
            from.len(),
            to.len()
        );

        let mut operations = diff(&from, &to);
        validate(&operations, &destination, Some(source.records()), force)?;

        operations.extend(manifest_operations(&source, &destination));
        operations.extend(checksum_operations(&source, &destination));
        Ok(operations)
    }

    /// Plan, log and apply
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Operation>)`: Every operation logged (and applied, unless dry-running)
    /// - `Err(Error)`: Validation failed before any mutation, or a store call failed
    pub async fn run(&self, options: SyncOptions) -> Result<Vec<Operation>> {
        let operations = self.plan(options.force).await?;

        for operation in &operations {
            info!(target: OPERATION_LOG_TARGET, dry_run = options.dry_run, "{}", operation);
            if !options.dry_run {
                self.apply(operation).await?;
            }
        }

        Ok(operations)
    }

    /// Apply a single operation to the destination
    async fn apply(&self, operation: &Operation) -> Result<()> {
        match operation {
            Operation::Add(record) => match self.destination.add(record).await {
                Err(Error::DuplicateRecord { record, .. }) => {
                    warn!(
                        target: OPERATION_LOG_TARGET,
                        "Record already exists in {}: {} {} - will start tracking it",
                        self.destination.provider_name(),
                        record.name,
                        record.record_type
                    );
                    Ok(())
                }
                other => other,
            },
            Operation::Remove(record) => self.destination.remove(record).await,
            Operation::Change(old, new) => self.destination.change(old, new).await,
        }
    }
}

/// Add or change the destination manifest to match the source
fn manifest_operations(source: &Manifest, destination: &Manifest) -> Option<Operation> {
    let generated = source.generate();
    match destination.existing() {
        Some(existing) if *existing == generated => None,
        Some(existing) => Some(Operation::Change(existing.clone(), generated)),
        None => Some(Operation::Add(generated)),
    }
}

/// Keep the legacy checksum in step, or drop it once the manifest is hash-format
fn checksum_operations(source: &Manifest, destination: &Manifest) -> Option<Operation> {
    let existing = destination.existing_checksum();

    // no source manifest: the generated manifest is hash-format
    if !source.exists() {
        return existing.cloned().map(Operation::Remove);
    }

    if !(source.is_legacy_format() || destination.is_legacy_format()) {
        return None;
    }

    let generated = source.generate_checksum();
    match existing {
        Some(existing) if *existing == generated => None,
        Some(existing) => Some(Operation::Change(existing.clone(), generated)),
        None => Some(Operation::Add(generated)),
    }
}

/// Copy one store's zone text to another verbatim
pub struct Generate {
    source: Box<dyn RecordStore>,
    destination: Box<dyn RecordStore>,
}

impl Generate {
    /// Create a generate job
    pub fn new(source: Box<dyn RecordStore>, destination: Box<dyn RecordStore>) -> Self {
        Self {
            source,
            destination,
        }
    }

    /// Write the source's zone text to the destination
    pub async fn run(&self) -> Result<()> {
        let text = self.source.read().await?;
        info!(
            "Generating {} zone from {}",
            self.destination.provider_name(),
            self.source.provider_name()
        );
        self.destination.write(&text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use crate::store::MemoryStore;

    #[test]
    fn test_manifest_is_added_when_missing() {
        let source = Manifest::new(vec![Record::new("example.com.", "A", 3600, "192.0.2.1")], "example.com.");
        let destination = Manifest::new(Vec::new(), "example.com.");

        let op = manifest_operations(&source, &destination).unwrap();
        assert_eq!(
            op,
            Operation::Add(Record::new(
                "zonesync_manifest.example.com.",
                "TXT",
                3600,
                "\"1r81el0\""
            ))
        );
    }

    const ORIGIN: &str = "example.com.";
    const APEX_CHECKSUM: &str = "\"e3e666f7d1da8833c0dd52632ac2a02f9d5ba2d860b36ddcb815b031fd078fdd\"";

    fn meta(prefix: &str, rdata: &str) -> Record {
        Record::new(format!("{}{}", prefix, ORIGIN), "TXT", 3600, rdata)
    }

    fn hash_manifest() -> Record {
        meta("zonesync_manifest.", "\"1r81el0\"")
    }

    fn legacy_manifest() -> Record {
        meta("zonesync_manifest.", "\"A:@\"")
    }

    fn checksum(rdata: &str) -> Record {
        meta("zonesync_checksum.", rdata)
    }

    /// The apex A record plus `meta_records`
    fn zone(meta_records: &[Record]) -> Manifest {
        let mut records = vec![Record::new(ORIGIN, "A", 3600, "192.0.2.1")];
        records.extend_from_slice(meta_records);
        Manifest::new(records, ORIGIN)
    }

    #[test]
    fn test_manifest_operations() {
        let cases = vec![
            ("missing", zone(&[]), Some(Operation::Add(hash_manifest()))),
            ("up to date", zone(&[hash_manifest()]), None),
            (
                "legacy upgraded",
                zone(&[legacy_manifest()]),
                Some(Operation::Change(legacy_manifest(), hash_manifest())),
            ),
        ];

        for (name, destination, expected) in cases {
            assert_eq!(manifest_operations(&zone(&[]), &destination), expected, "{}", name);
        }
    }

    #[test]
    fn test_checksum_operations() {
        let stale = checksum("\"deadbeef\"");
        let cases = vec![
            (
                "source without manifest drops checksum",
                zone(&[]),
                zone(&[legacy_manifest(), checksum(APEX_CHECKSUM)]),
                Some(Operation::Remove(checksum(APEX_CHECKSUM))),
            ),
            (
                "source without manifest, nothing to drop",
                zone(&[]),
                zone(&[hash_manifest()]),
                None,
            ),
            (
                "both hash format",
                zone(&[hash_manifest()]),
                zone(&[hash_manifest(), checksum(APEX_CHECKSUM)]),
                None,
            ),
            (
                "legacy checksum current",
                zone(&[legacy_manifest()]),
                zone(&[legacy_manifest(), checksum(APEX_CHECKSUM)]),
                None,
            ),
            (
                "legacy checksum stale",
                zone(&[legacy_manifest()]),
                zone(&[legacy_manifest(), stale.clone()]),
                Some(Operation::Change(stale, checksum(APEX_CHECKSUM))),
            ),
            (
                "legacy destination without checksum",
                zone(&[hash_manifest()]),
                zone(&[legacy_manifest()]),
                Some(Operation::Add(checksum(APEX_CHECKSUM))),
            ),
        ];

        for (name, source, destination, expected) in cases {
            assert_eq!(checksum_operations(&source, &destination), expected, "{}", name);
        }
    }

    #[tokio::test]
    async fn test_generate_copies_text() {
        let source = MemoryStore::new("$ORIGIN example.com.\n@ 3600 A 192.0.2.1\n");
        let destination = MemoryStore::new("");
        Generate::new(Box::new(source), Box::new(destination.clone()))
            .run()
            .await
            .unwrap();
        assert_eq!(destination.contents().await, "$ORIGIN example.com.\n@ 3600 A 192.0.2.1\n");
    }
}
