//! Ownership manifest
//!
//! The manifest is a synthetic TXT record, `zonesync_manifest.<origin>`,
//! listing the records zonesync manages in a zone. It is never stored
//! separately: it is derived from whatever record set is being examined.
//!
//! ## Wire formats
//!
//! - **hash**: comma-joined record fingerprints in canonical order,
//!   e.g. `"1r81el0,y2xy9a"`. Always emitted by [`Manifest::generate`].
//! - **legacy**: `"TYPE:short,short;TYPE:short"` with MX entries suffixed
//!   by their priority. Read for compatibility only.
//!
//! The legacy format was paired with a `zonesync_checksum.<origin>` TXT
//! record holding a SHA-256 over the tracked records' text.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::record::Record;
use crate::record_hash;

/// Owner-name prefix of the manifest record
pub const MANIFEST_PREFIX: &str = "zonesync_manifest.";

/// Owner-name prefix of the deprecated checksum record
pub const CHECKSUM_PREFIX: &str = "zonesync_checksum.";

/// Record types zonesync manages, sorted
pub const DIFFABLE_TYPES: [&str; 8] = ["A", "AAAA", "CNAME", "MX", "NAPTR", "PTR", "SPF", "TXT"];

/// TTL of generated meta records when the zone sets no default
pub const DEFAULT_MANIFEST_TTL: u32 = 3600;

/// Parsed manifest payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestFormat {
    /// Type to shorthand names
    Legacy(BTreeMap<String, Vec<String>>),
    /// Record fingerprints
    Hash(Vec<String>),
}

impl ManifestFormat {
    /// Parse manifest rdata, detecting its format
    ///
    /// Any `;` or `:` marks the legacy format.
    pub fn parse(rdata: &str) -> Self {
        let body = unquote(rdata);

        if body.contains(';') || body.contains(':') {
            let mut groups = BTreeMap::new();
            for pair in body.split(';').filter(|p| !p.is_empty()) {
                let (record_type, names) = pair.split_once(':').unwrap_or((pair, ""));
                let names = names
                    .split(',')
                    .filter(|n| !n.is_empty())
                    .map(String::from)
                    .collect();
                groups.insert(record_type.to_string(), names);
            }
            ManifestFormat::Legacy(groups)
        } else {
            ManifestFormat::Hash(
                body.split(',')
                    .map(str::trim)
                    .filter(|h| !h.is_empty())
                    .map(String::from)
                    .collect(),
            )
        }
    }

    /// Whether this is the legacy shorthand format
    pub fn is_legacy(&self) -> bool {
        matches!(self, ManifestFormat::Legacy(_))
    }
}

/// Strip TXT quoting, joining multi-string values
fn unquote(rdata: &str) -> String {
    rdata.trim().replace("\" \"", "").trim_matches('"').to_string()
}

/// Manifest view over a zone's records
#[derive(Debug, Clone)]
pub struct Manifest {
    records: Vec<Record>,
    origin: String,
    default_ttl: Option<u32>,
    format: Option<ManifestFormat>,
}

impl Manifest {
    /// Create a manifest view over `records` in the zone rooted at `origin`
    ///
    /// The manifest record, if present, is parsed once here.
    pub fn new(records: Vec<Record>, origin: impl Into<String>) -> Self {
        let format = records
            .iter()
            .find(|r| r.is_manifest())
            .map(|r| ManifestFormat::parse(&r.rdata));
        Self {
            records,
            origin: origin.into(),
            default_ttl: None,
            format,
        }
    }

    /// Use the zone's `$TTL` for generated meta records
    pub fn with_default_ttl(mut self, ttl: Option<u32>) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Zone origin
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Every record in the zone, meta records included
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The manifest record currently present, if any
    pub fn existing(&self) -> Option<&Record> {
        self.records.iter().find(|r| r.is_manifest())
    }

    /// Whether a manifest record is present
    pub fn exists(&self) -> bool {
        self.format.is_some()
    }

    /// Parsed payload of the existing manifest
    pub fn format(&self) -> Option<&ManifestFormat> {
        self.format.as_ref()
    }

    /// Existing manifest uses the legacy shorthand format
    pub fn is_legacy_format(&self) -> bool {
        matches!(self.format(), Some(ManifestFormat::Legacy(_)))
    }

    /// Existing manifest uses the fingerprint format
    pub fn is_hash_format(&self) -> bool {
        matches!(self.format(), Some(ManifestFormat::Hash(_)))
    }

    /// Fingerprints listed by a hash-format manifest
    pub fn tracked_hashes(&self) -> Vec<String> {
        match self.format() {
            Some(ManifestFormat::Hash(hashes)) => hashes.clone(),
            _ => Vec::new(),
        }
    }

    /// Build the hash-format manifest for the current diffable records
    pub fn generate(&self) -> Record {
        let hashes: Vec<String> = self
            .diffable_records()
            .iter()
            .filter(|r| DIFFABLE_TYPES.contains(&r.record_type.as_str()))
            .map(record_hash::generate)
            .collect();

        Record::new(
            format!("{}{}", MANIFEST_PREFIX, self.origin),
            "TXT",
            self.meta_ttl(),
            format!("\"{}\"", hashes.join(",")),
        )
    }

    /// The checksum record currently present, if any
    pub fn existing_checksum(&self) -> Option<&Record> {
        self.records.iter().find(|r| r.is_checksum())
    }

    /// Build the legacy checksum record for the current diffable records
    pub fn generate_checksum(&self) -> Record {
        let input: String = self
            .diffable_records()
            .iter()
            .map(|r| r.to_string())
            .collect();
        let digest = hex::encode(Sha256::digest(input.as_bytes()));

        Record::new(
            format!("{}{}", CHECKSUM_PREFIX, self.origin),
            "TXT",
            self.meta_ttl(),
            format!("\"{}\"", digest),
        )
    }

    /// Whether `record` takes part in diffing
    ///
    /// Without a manifest every record of a managed type is provisionally
    /// ours; with one, only the records it lists.
    pub fn is_diffable(&self, record: &Record) -> bool {
        if record.is_meta() {
            return false;
        }
        if self.exists() {
            self.matches(record)
        } else {
            DIFFABLE_TYPES.contains(&record.record_type.as_str())
        }
    }

    /// Whether the existing manifest lists `record`
    pub fn matches(&self, record: &Record) -> bool {
        match self.format() {
            None => false,
            Some(ManifestFormat::Hash(hashes)) => hashes.contains(&record_hash::generate(record)),
            Some(ManifestFormat::Legacy(groups)) => groups
                .get(&record.record_type)
                .is_some_and(|names| names.contains(&self.shorthand_for(record, false))),
        }
    }

    /// Legacy shorthand: origin-relative name, optional `TYPE:` prefix,
    /// MX priority suffix
    pub fn shorthand_for(&self, record: &Record, with_type: bool) -> String {
        let mut shorthand = record.short_name(&self.origin);
        if with_type {
            shorthand = format!("{}:{}", record.record_type, shorthand);
        }
        if let Some(priority) = record.mx_priority() {
            let digits: String = priority.chars().take_while(char::is_ascii_digit).collect();
            shorthand = format!("{} {}", shorthand, digits);
        }
        shorthand
    }

    /// Diffable records in canonical order
    pub fn diffable_records(&self) -> Vec<Record> {
        let mut records: Vec<Record> = self
            .records
            .iter()
            .filter(|r| self.is_diffable(r))
            .cloned()
            .collect();
        records.sort();
        records
    }

    fn meta_ttl(&self) -> u32 {
        self.default_ttl.unwrap_or(DEFAULT_MANIFEST_TTL)
    }
}
