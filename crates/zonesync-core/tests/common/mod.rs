//! Test doubles and fixtures for sync contract tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use zonesync_core::error::{Error, Result};
use zonesync_core::store::MemoryStore;
use zonesync_core::traits::RecordStore;
use zonesync_core::{Operation, Record};

/// SOA shared by the fixture zones
pub const SOA: &str =
    "example.com. 3600 SOA ns.example.com. admin.example.com. 2000010101 3600 600 604800 3600";

/// A zone store that records every mutation it receives
///
/// Clones share the zone and the call log, so a test can hand one clone to
/// the engine and inspect the other.
#[derive(Clone)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Arc<Mutex<Vec<Operation>>>,
    duplicate_adds: bool,
}

impl RecordingStore {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            inner: MemoryStore::new(text),
            calls: Arc::new(Mutex::new(Vec::new())),
            duplicate_adds: false,
        }
    }

    /// Reject every `add` as a duplicate, like a provider that already has the record
    pub fn rejecting_adds_as_duplicates(mut self) -> Self {
        self.duplicate_adds = true;
        self
    }

    /// Mutations received so far, in order
    pub fn calls(&self) -> Vec<Operation> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn contents(&self) -> String {
        self.inner.contents().await
    }

    fn log(&self, operation: Operation) {
        self.calls.lock().unwrap().push(operation);
    }
}

#[async_trait::async_trait]
impl RecordStore for RecordingStore {
    async fn read(&self) -> Result<String> {
        self.inner.read().await
    }

    async fn write(&self, text: &str) -> Result<()> {
        self.inner.write(text).await
    }

    async fn add(&self, record: &Record) -> Result<()> {
        self.log(Operation::Add(record.clone()));
        if self.duplicate_adds {
            return Err(Error::duplicate(
                record.clone(),
                Some("An identical record already exists.".to_string()),
            ));
        }
        self.inner.add(record).await
    }

    async fn remove(&self, record: &Record) -> Result<()> {
        self.log(Operation::Remove(record.clone()));
        self.inner.remove(record).await
    }

    async fn change(&self, old: &Record, new: &Record) -> Result<()> {
        self.log(Operation::Change(old.clone(), new.clone()));
        self.inner.change(old, new).await
    }

    fn provider_name(&self) -> &'static str {
        "recording"
    }
}

/// Zone text: `$ORIGIN example.com.`, the SOA, then `lines`
pub fn zone(lines: &[&str]) -> String {
    let mut text = format!("$ORIGIN example.com.\n{}\n", SOA);
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}

/// An `A` record at `name` (relative to example.com.) with ttl 3600
pub fn a(name: &str, rdata: &str) -> Record {
    Record::new(qualify(name), "A", 3600, rdata)
}

/// The hash-format manifest record with the given fingerprints
pub fn manifest(hashes: &str) -> Record {
    Record::new(
        "zonesync_manifest.example.com.",
        "TXT",
        3600,
        format!("\"{}\"", hashes),
    )
}

/// A legacy-format manifest record, e.g. `legacy_manifest("A:@,mail")`
pub fn legacy_manifest(body: &str) -> Record {
    Record::new(
        "zonesync_manifest.example.com.",
        "TXT",
        3600,
        format!("\"{}\"", body),
    )
}

/// The deprecated checksum record holding `digest`
pub fn checksum(digest: &str) -> Record {
    Record::new(
        "zonesync_checksum.example.com.",
        "TXT",
        3600,
        format!("\"{}\"", digest),
    )
}

fn qualify(name: &str) -> String {
    if name == "@" {
        "example.com.".to_string()
    } else {
        format!("{}.example.com.", name)
    }
}
