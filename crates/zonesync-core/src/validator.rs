//! Pre-flight safety checks
//!
//! [`validate`] decides whether a batch of operations may be applied to a
//! destination. Checks, in order:
//!
//! 1. **Missing manifest**: operations are pending but the destination has
//!    no manifest.
//! 2. **Legacy checksum**: a legacy manifest's checksum record no longer
//!    matches the destination's tracked records.
//! 3. **Fingerprint integrity**: every fingerprint in a hash-format manifest
//!    must still have a matching record at the destination.
//! 4. **Conflicts**: an addition must not overwrite an untracked record.
//!
//! `force` skips all of them. A single violation is returned as is; several
//! are wrapped in [`Error::Multiple`].

use std::collections::HashSet;

use tracing::debug;

use crate::diff::Operation;
use crate::error::{Conflict, ConflictError, Error, IntegrityViolation, Result};
use crate::manifest::Manifest;
use crate::record::Record;
use crate::record_hash;

/// Validate `operations` against the destination's current state
///
/// # Parameters
///
/// - `operations`: planned record operations
/// - `destination`: manifest view over the destination's records
/// - `source`: the source's records, used to name records that went
///   missing at the destination
/// - `force`: skip every check
pub fn validate(
    operations: &[Operation],
    destination: &Manifest,
    source: Option<&[Record]>,
    force: bool,
) -> Result<()> {
    if force {
        debug!("Skipping validation (force)");
        return Ok(());
    }

    let mut violations = Vec::new();

    if !operations.is_empty() && !destination.exists() {
        violations.push(Error::MissingManifest {
            manifest: destination.generate(),
        });
    }

    if let Some(violation) = check_legacy_checksum(destination) {
        violations.push(violation.into());
    }

    violations.extend(
        check_fingerprints(destination, source)
            .into_iter()
            .map(Error::from),
    );

    let conflicts: Vec<Conflict> = operations
        .iter()
        .filter_map(|op| match op {
            Operation::Add(record) => find_conflict(destination, record),
            _ => None,
        })
        .collect();
    if !conflicts.is_empty() {
        violations.push(ConflictError::new(conflicts).into());
    }

    match Error::from_violations(violations) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn check_legacy_checksum(destination: &Manifest) -> Option<IntegrityViolation> {
    if !destination.is_legacy_format() {
        return None;
    }
    let existing = destination.existing_checksum()?;
    let expected = destination.generate_checksum();
    if existing.rdata == expected.rdata {
        return None;
    }
    Some(IntegrityViolation::ChecksumMismatch {
        existing: existing.clone(),
        expected,
    })
}

fn check_fingerprints(destination: &Manifest, source: Option<&[Record]>) -> Vec<IntegrityViolation> {
    let tracked = destination.tracked_hashes();
    if tracked.is_empty() {
        return Vec::new();
    }

    let current = Record::non_meta(destination.records());
    let present: HashSet<String> = current.iter().map(record_hash::generate).collect();

    tracked
        .into_iter()
        .filter(|hash| !present.contains(hash))
        .map(|hash| classify_missing(hash, &current, source))
        .collect()
}

/// Explain a tracked fingerprint that has no record at the destination
///
/// A same-`(name, type)` replacement is only attributed when it is
/// unambiguous: any record for single-value types, otherwise exactly one.
/// Several candidates yield the generic missing-fingerprint error.
fn classify_missing(hash: String, current: &[Record], source: Option<&[Record]>) -> IntegrityViolation {
    let expected = source.and_then(|records| {
        records
            .iter()
            .find(|r| !r.is_meta() && record_hash::generate(r) == hash)
    });
    let Some(expected) = expected else {
        return IntegrityViolation::MissingFingerprint { hash };
    };

    let candidates: Vec<&Record> = current
        .iter()
        .filter(|r| r.name == expected.name && r.record_type == expected.record_type)
        .collect();

    let single = Record::single_record_per_name(&expected.record_type);
    match candidates.as_slice() {
        [] => IntegrityViolation::DeletedExternally {
            expected: expected.clone(),
            expected_hash: hash,
        },
        [actual] => modified(expected, actual, hash),
        [actual, ..] if single => modified(expected, actual, hash),
        _ => IntegrityViolation::MissingFingerprint { hash },
    }
}

fn modified(expected: &Record, actual: &Record, expected_hash: String) -> IntegrityViolation {
    IntegrityViolation::ModifiedExternally {
        expected: expected.clone(),
        actual: actual.clone(),
        expected_hash,
        actual_hash: record_hash::generate(actual),
    }
}

fn find_conflict(destination: &Manifest, record: &Record) -> Option<Conflict> {
    if destination.matches(record) {
        return None;
    }

    let candidate = if destination.is_hash_format() {
        let tracked: HashSet<String> = destination.tracked_hashes().into_iter().collect();
        destination.records().iter().find(|r| {
            !tracked.contains(&record_hash::generate(r))
                && *r != record
                && r.conflicts_with(record)
        })
    } else if destination.is_legacy_format() {
        let shorthand = destination.shorthand_for(record, true);
        destination
            .records()
            .iter()
            .find(|r| destination.shorthand_for(r, true) == shorthand)
    } else {
        destination.records().iter().find(|r| *r == record)
    };
    let existing = candidate?;

    if existing == record {
        return None;
    }

    Some(Conflict {
        existing: existing.clone(),
        new: record.clone(),
    })
}
