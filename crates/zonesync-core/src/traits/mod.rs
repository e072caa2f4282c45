//! Core traits for zonesync
//!
//! - [`RecordStore`]: Read and mutate a zone, locally or at a provider

pub mod record_store;

pub use record_store::RecordStore;
