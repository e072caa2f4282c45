//! Record store factory
//!
//! Maps a [`ProviderConfig`] to the store that serves it. Remote providers
//! are behind the `cloudflare` and `route53` features.

use std::path::Path;

use tracing::debug;
use zonesync_core::config::{Credentials, ProviderConfig};
use zonesync_core::traits::RecordStore;
use zonesync_core::{Error, FilesystemStore, MemoryStore, Result};

/// Build the record store for `config`
///
/// # Returns
///
/// - `Ok(store)`: Ready to read and mutate
/// - `Err(Error::Config)`: Invalid config, or the provider is not compiled in
pub fn create_store(config: &ProviderConfig) -> Result<Box<dyn RecordStore>> {
    config.validate()?;
    debug!("Creating {} record store", config.type_name());

    let store: Box<dyn RecordStore> = match config {
        ProviderConfig::Filesystem { path } => Box::new(FilesystemStore::new(path)),
        ProviderConfig::Memory { string } => Box::new(MemoryStore::new(string.clone())),
        #[cfg(feature = "cloudflare")]
        ProviderConfig::Cloudflare { .. } => Box::new(
            zonesync_provider_cloudflare::CloudflareStore::from_config(config)?,
        ),
        #[cfg(feature = "route53")]
        ProviderConfig::Route53 { .. } => Box::new(
            zonesync_provider_route53::Route53Store::from_config(config)?,
        ),
        #[allow(unreachable_patterns)]
        other => {
            return Err(Error::config(format!(
                "Provider '{}' is not enabled in this build",
                other.type_name()
            )));
        }
    };
    Ok(store)
}

/// Read the credentials file at `path`
pub fn load_credentials(path: &Path) -> Result<Credentials> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read credentials file {}: {}",
            path.display(),
            e
        ))
    })?;
    Credentials::from_json(&text)
}

/// Store configured under `name` in the credentials file at `path`
pub fn named_store(path: &Path, name: &str) -> Result<Box<dyn RecordStore>> {
    let credentials = load_credentials(path)?;
    create_store(credentials.get(name)?)
}
