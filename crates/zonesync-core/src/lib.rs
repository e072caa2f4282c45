// # zonesync-core
//
// Core library for one-way, declarative DNS zone synchronization.
//
// ## Architecture Overview
//
// A source zone (usually a local zone file) is the single source of truth.
// The destination zone (usually a DNS provider) is converged onto it while
// records created by other actors on the same zone are left alone:
//
// - **Record**: DNS resource record value with canonical ordering
// - **Manifest**: Synthetic TXT record listing the records zonesync owns
// - **Diff**: Add/change/remove operations between two record sets
// - **Validator**: Refuses to apply operations that would clobber records
//   zonesync does not own, or that someone else changed since the last sync
// - **RecordStore**: Trait every zone backend implements
// - **SyncEngine**: Diff → validate → manifest update → apply
//
// ## Design Principles
//
// 1. **Ownership is explicit**: Only records in the manifest are touched
// 2. **Validate, then apply**: No mutation once any check fails
// 3. **Fail fast**: No retries; the next run re-derives safety from scratch
// 4. **Library-First**: The CLI is a thin wrapper over this crate

pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod record;
pub mod record_hash;
pub mod store;
pub mod traits;
pub mod validator;
pub mod zonefile;

// Re-export core types for convenience
pub use config::{Credentials, ProviderConfig, SyncOptions};
pub use diff::{diff, Operation, OperationKind};
pub use engine::{Generate, SyncEngine, OPERATION_LOG_TARGET};
pub use error::{Conflict, ConflictError, Error, IntegrityViolation, Result};
pub use manifest::{Manifest, ManifestFormat};
pub use record::Record;
pub use store::{FilesystemStore, MemoryStore};
pub use traits::RecordStore;
pub use validator::validate;
pub use zonefile::Zone;
