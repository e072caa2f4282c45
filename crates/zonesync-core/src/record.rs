//! DNS resource record value type
//!
//! A [`Record`] is compared, hashed and ordered by its identity fields
//! (`name`, `type`, `ttl`, `rdata`). The comment is carried for display only.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::manifest::{CHECKSUM_PREFIX, MANIFEST_PREFIX};
use crate::zonefile::ParsedRecord;

/// A single DNS resource record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Fully-qualified owner name with trailing dot
    pub name: String,
    /// Record type, uppercase (A, MX, TXT, ...)
    #[serde(rename = "type")]
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Textual payload; MX is "priority target"
    pub rdata: String,
    /// Display-only comment, never part of identity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Record {
    /// Create a record without a comment
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        ttl: u32,
        rdata: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ttl,
            rdata: rdata.into(),
            comment: None,
        }
    }

    /// Attach a display comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Convert a parser record into the core type
    pub fn from_parsed(parsed: ParsedRecord) -> Self {
        Self {
            name: parsed.owner,
            record_type: parsed.record_type,
            ttl: parsed.ttl,
            rdata: parsed.rdata,
            comment: parsed.comment,
        }
    }

    /// Origin-relative name used by the legacy manifest format
    ///
    /// `www.example.com.` under `example.com.` becomes `www`; the apex
    /// becomes `@`.
    pub fn short_name(&self, origin: &str) -> String {
        let stripped = if origin.is_empty() {
            self.name.clone()
        } else {
            self.name.replacen(origin, "", 1)
        };
        let stripped = stripped.strip_suffix('.').unwrap_or(&stripped);
        if stripped.is_empty() {
            "@".to_string()
        } else {
            stripped.to_string()
        }
    }

    /// Whether this is the synthetic manifest record
    pub fn is_manifest(&self) -> bool {
        self.record_type == "TXT" && self.name.starts_with(MANIFEST_PREFIX)
    }

    /// Whether this is the deprecated checksum record
    pub fn is_checksum(&self) -> bool {
        self.record_type == "TXT" && self.name.starts_with(CHECKSUM_PREFIX)
    }

    /// Manifest or checksum
    pub fn is_meta(&self) -> bool {
        self.is_manifest() || self.is_checksum()
    }

    /// Whether this record is an SOA
    pub fn is_soa(&self) -> bool {
        self.record_type == "SOA"
    }

    /// Leading priority token of an MX rdata
    pub fn mx_priority(&self) -> Option<&str> {
        if self.record_type != "MX" {
            return None;
        }
        self.rdata.split_whitespace().next()
    }

    /// Same name, type, ttl and rdata
    pub fn identical_to(&self, other: &Record) -> bool {
        self == other
    }

    /// Whether adding `other` would overwrite `self`
    ///
    /// CNAME and SOA allow one record per name; MX collides on equal
    /// priority; every other type allows coexisting values.
    pub fn conflicts_with(&self, other: &Record) -> bool {
        if self.name != other.name || self.record_type != other.record_type {
            return false;
        }
        match self.record_type.as_str() {
            "CNAME" | "SOA" => true,
            "MX" => self.rdata.split_whitespace().next() == other.rdata.split_whitespace().next(),
            _ => false,
        }
    }

    /// Types that permit exactly one record per owner name
    pub fn single_record_per_name(record_type: &str) -> bool {
        matches!(record_type, "CNAME" | "SOA")
    }

    /// Drop manifest and checksum records
    pub fn non_meta(records: &[Record]) -> Vec<Record> {
        records.iter().filter(|r| !r.is_meta()).cloned().collect()
    }

    fn sort_key(&self) -> (u8, &str, &str, &str, u32) {
        (
            if self.is_soa() { 0 } else { 1 },
            self.record_type.as_str(),
            self.name.as_str(),
            self.rdata.as_str(),
            self.ttl,
        )
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.record_type == other.record_type
            && self.ttl == other.ttl
            && self.rdata == other.rdata
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.record_type.hash(state);
        self.ttl.hash(state);
        self.rdata.hash(state);
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// SOA first, then by type, name, rdata, ttl
impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.name, self.ttl, self.record_type, self.rdata)?;
        if let Some(comment) = &self.comment {
            write!(f, " ; {}", comment)?;
        }
        Ok(())
    }
}
