//! Error types for zonesync
//!
//! This module defines all error types used throughout the crate.
//!
//! Validation failures (`MissingManifest`, `Integrity`, `Conflict` and the
//! `Multiple` aggregate) are raised before any mutation is attempted.
//! `DuplicateRecord` is raised by record stores and recovered by the sync
//! engine. Everything else is plumbing.

use crate::record::Record;
use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Operations are pending but the destination carries no manifest
    #[error(
        "The zonesync_manifest TXT record is missing. If this is the very first sync, make sure the Zonefile matches what's on the DNS server exactly. Otherwise, someone else may have removed it.\n  manifest: {manifest}"
    )]
    MissingManifest {
        /// The manifest that would have been written
        manifest: Record,
    },

    /// Tracked records no longer match what the manifest recorded
    #[error(transparent)]
    Integrity(#[from] IntegrityViolation),

    /// One or more additions would overwrite untracked records
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// A store rejected an add because the record already exists
    #[error("Record already exists: {} {}{}", .record.name, .record.record_type, provider_suffix(.provider_message))]
    DuplicateRecord {
        /// The record that was being added
        record: Record,
        /// Message returned by the provider, if any
        provider_message: Option<String>,
    },

    /// More than one independent validation failure in a single run
    #[error("{}", join_errors(.0))]
    Multiple(Vec<Error>),

    /// Zone file could not be parsed
    #[error("Parse error on line {line}: {message}")]
    Parse {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Integrity failures: tracked state diverged from what the manifest says
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Legacy checksum record does not match the tracked records
    #[error(
        "The zonesync_checksum TXT record does not match the current state of the DNS records. This probably means that someone else has changed them.\n  existing: {existing}\n  new:      {expected}"
    )]
    ChecksumMismatch {
        /// Checksum record found at the destination
        existing: Record,
        /// Checksum computed from the destination's tracked records
        expected: Record,
    },

    /// A tracked record was replaced by a different value outside zonesync
    #[error(
        "The following tracked DNS record has been modified externally since the last sync.\n  expected: {expected} ({expected_hash})\n  actual:   {actual} ({actual_hash})"
    )]
    ModifiedExternally {
        /// Record the manifest was tracking
        expected: Record,
        /// Record currently at the destination
        actual: Record,
        /// Fingerprint of `expected`
        expected_hash: String,
        /// Fingerprint of `actual`
        actual_hash: String,
    },

    /// A tracked record disappeared outside zonesync
    #[error(
        "The following tracked DNS record has been deleted externally since the last sync.\n  expected: {expected} ({expected_hash})"
    )]
    DeletedExternally {
        /// Record the manifest was tracking
        expected: Record,
        /// Fingerprint of `expected`
        expected_hash: String,
    },

    /// A manifest fingerprint has no matching record and cannot be attributed
    #[error(
        "The zonesync_manifest TXT record tracks a record with fingerprint {hash} that no longer exists on the DNS server. This probably means that someone else has changed it."
    )]
    MissingFingerprint {
        /// The fingerprint with no matching record
        hash: String,
    },
}

/// A single untracked-record collision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Untracked record already at the destination
    pub existing: Record,
    /// Record the sync wanted to add
    pub new: Record,
}

/// All conflicts found in one batch, sorted by the new record's name
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", describe_conflicts(.conflicts))]
pub struct ConflictError {
    /// Individual collisions
    pub conflicts: Vec<Conflict>,
}

impl ConflictError {
    /// Build from an unordered list of conflicts
    pub fn new(mut conflicts: Vec<Conflict>) -> Self {
        conflicts.sort_by(|a, b| a.new.name.cmp(&b.new.name));
        Self { conflicts }
    }
}

impl Error {
    /// Create a parse error
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate-record error
    pub fn duplicate(record: Record, provider_message: Option<String>) -> Self {
        Self::DuplicateRecord {
            record,
            provider_message,
        }
    }

    /// Collapse a list of violations: none, the single error, or an aggregate
    pub fn from_violations(mut violations: Vec<Error>) -> Option<Self> {
        match violations.len() {
            0 => None,
            1 => violations.pop(),
            _ => Some(Self::Multiple(violations)),
        }
    }

    /// Whether this error was raised by pre-flight validation
    ///
    /// The CLI reports these with exit status 1.
    pub fn is_validation_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingManifest { .. } | Self::Integrity(_) | Self::Conflict(_) | Self::Multiple(_)
        )
    }
}

fn provider_suffix(message: &Option<String>) -> String {
    message
        .as_ref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

fn join_errors(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn describe_conflicts(conflicts: &[Conflict]) -> String {
    let header = if conflicts.len() == 1 {
        "The following untracked DNS record already exists and would be overwritten."
    } else {
        "The following untracked DNS records already exist and would be overwritten."
    };
    let mut message = header.to_string();
    for conflict in conflicts {
        message.push_str(&format!(
            "\n  existing: {}\n  new:      {}",
            conflict.existing, conflict.new
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(name: &str, rdata: &str) -> Record {
        Record::new(name, "A", 3600, rdata)
    }

    #[test]
    fn duplicate_message_includes_provider_text() {
        let err = Error::duplicate(a("www.example.com.", "192.0.2.1"), Some("RRSet already exists".into()));
        assert_eq!(
            err.to_string(),
            "Record already exists: www.example.com. A (RRSet already exists)"
        );

        let err = Error::duplicate(a("www.example.com.", "192.0.2.1"), None);
        assert_eq!(err.to_string(), "Record already exists: www.example.com. A");
    }

    #[test]
    fn conflicts_are_sorted_by_new_record_name() {
        let err = ConflictError::new(vec![
            Conflict {
                existing: Record::new("www.example.com.", "CNAME", 3600, "a.example.com."),
                new: Record::new("www.example.com.", "CNAME", 3600, "b.example.com."),
            },
            Conflict {
                existing: Record::new("api.example.com.", "CNAME", 3600, "a.example.com."),
                new: Record::new("api.example.com.", "CNAME", 3600, "b.example.com."),
            },
        ]);
        assert_eq!(err.conflicts[0].new.name, "api.example.com.");
        assert!(err.to_string().starts_with("The following untracked DNS records"));
    }

    #[test]
    fn single_violation_is_not_wrapped() {
        let single = Error::from_violations(vec![Error::config("x")]);
        assert!(matches!(single, Some(Error::Config(_))));

        let many = Error::from_violations(vec![Error::config("x"), Error::config("y")]);
        assert!(matches!(many, Some(Error::Multiple(ref v)) if v.len() == 2));

        assert!(Error::from_violations(Vec::new()).is_none());
    }

    #[test]
    fn validation_failures_are_classified() {
        let missing = Error::MissingManifest {
            manifest: Record::new("zonesync_manifest.example.com.", "TXT", 3600, "\"\""),
        };
        assert!(missing.is_validation_failure());
        assert!(!Error::config("bad").is_validation_failure());
        assert!(!Error::duplicate(a("example.com.", "192.0.2.1"), None).is_validation_failure());
    }
}
