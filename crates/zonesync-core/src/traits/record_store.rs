// # Record Store Trait
//
// Defines the interface every zone backend implements: the local zone file,
// an in-memory buffer, and the remote DNS providers.
//
// ## Implementations
//
// - Filesystem / memory: `crate::store`
// - Cloudflare: `zonesync-provider-cloudflare` crate
// - Route 53: `zonesync-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use zonesync_core::RecordStore;
//
// async fn show(store: &dyn RecordStore) -> zonesync_core::Result<()> {
//     for record in store.diffable_records().await? {
//         println!("{}", record);
//     }
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::manifest::Manifest;
use crate::record::Record;
use crate::zonefile::Zone;
use crate::Error;

/// Trait for zone backends
///
/// A store exposes its whole zone as master-file text (`read`/`write`) and
/// accepts single-record mutations. Everything else (records, manifest,
/// diffable set) is derived from `read()` by the provided methods.
///
/// # Contract
///
/// - `add` of a record the backend already holds must fail with
///   [`Error::DuplicateRecord`]; the sync engine turns that into a no-op.
/// - `remove` and `change` of a record the backend does not hold fail with
///   [`Error::NotFound`].
/// - No retries: a failed call is returned as-is and the engine stops.
/// - No background work: every call completes before returning.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Whole zone as master-file text
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: Zone text, parseable by [`Zone::load`]
    /// - `Err(Error)`: If the backend could not be read
    async fn read(&self) -> Result<String, Error>;

    /// Replace the whole zone with `text`
    async fn write(&self, text: &str) -> Result<(), Error>;

    /// Create a record
    ///
    /// # Parameters
    ///
    /// - `record`: The fully-qualified record to create
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The record now exists
    /// - `Err(Error::DuplicateRecord)`: The backend already had it
    /// - `Err(Error)`: Any other failure
    async fn add(&self, record: &Record) -> Result<(), Error>;

    /// Delete a record
    async fn remove(&self, record: &Record) -> Result<(), Error>;

    /// Replace `old` with `new`
    ///
    /// # Parameters
    ///
    /// - `old`: A record currently held by the backend
    /// - `new`: Its replacement, usually with the same name and type
    async fn change(&self, old: &Record, new: &Record) -> Result<(), Error>;

    /// Short identifier used in logs (e.g. "filesystem", "cloudflare")
    fn provider_name(&self) -> &'static str;

    /// Parsed zone
    async fn zone(&self) -> Result<Zone, Error> {
        Zone::load(&self.read().await?)
    }

    /// Every record, meta records included
    async fn records(&self) -> Result<Vec<Record>, Error> {
        Ok(self.zone().await?.records)
    }

    /// Manifest view over the current records
    async fn manifest(&self) -> Result<Manifest, Error> {
        Ok(self.zone().await?.manifest())
    }

    /// Managed records in canonical order
    async fn diffable_records(&self) -> Result<Vec<Record>, Error> {
        Ok(self.manifest().await?.diffable_records())
    }
}
