//! Contract Test: Diff and Manifest Properties
//!
//! Constraints verified:
//! - Diff is order-independent and reflexive
//! - A rename is always remove + add, never a change
//! - A generated manifest matches exactly the records it was built from
//! - Records parsed from zone text hash the same as hand-built ones

mod common;

use common::*;
use zonesync_core::record_hash;
use zonesync_core::{diff, Manifest, OperationKind, Record, Zone};

fn records() -> Vec<Record> {
    vec![
        a("@", "192.0.2.1"),
        a("@", "192.0.2.2"),
        a("mail", "192.0.2.3"),
        Record::new("www.example.com.", "CNAME", 3600, "example.com."),
        Record::new("example.com.", "MX", 3600, "10 mail.example.com."),
        Record::new("example.com.", "MX", 3600, "20 mail2.example.com."),
        Record::new("example.com.", "TXT", 3600, "\"v=spf1 -all\""),
    ]
}

/// Deterministic permutations: every rotation, forwards and reversed
fn permutations(records: &[Record]) -> Vec<Vec<Record>> {
    let mut out = Vec::new();
    for shift in 0..records.len() {
        let mut rotated = records.to_vec();
        rotated.rotate_left(shift);
        out.push(rotated.clone());
        rotated.reverse();
        out.push(rotated);
    }
    out
}

#[test]
fn diff_is_order_independent() {
    let from = records();
    let mut to = records();
    to.retain(|r| r.rdata != "192.0.2.2");
    to.push(a("test", "192.0.2.4"));
    to[2] = Record::new("www.example.com.", "CNAME", 3600, "other.example.net.");

    let expected = diff(&from, &to);
    assert!(!expected.is_empty());

    for (shuffled_from, shuffled_to) in permutations(&from).into_iter().zip(permutations(&to)) {
        assert_eq!(diff(&shuffled_from, &shuffled_to), expected);
    }
}

#[test]
fn diff_is_reflexive() {
    for shuffled in permutations(&records()) {
        assert!(diff(&records(), &shuffled).is_empty());
    }
}

#[test]
fn rename_is_never_a_change() {
    let from = vec![a("old", "192.0.2.1")];
    let to = vec![a("new", "192.0.2.1")];
    let kinds: Vec<OperationKind> = diff(&from, &to).iter().map(|op| op.kind()).collect();
    assert_eq!(kinds, vec![OperationKind::Remove, OperationKind::Add]);
}

#[test]
fn manifest_round_trip() {
    let tracked = records();
    let generated = Manifest::new(tracked.clone(), "example.com.").generate();

    let mut zone = tracked.clone();
    zone.push(generated);
    let manifest = Manifest::new(zone, "example.com.");

    for record in &tracked {
        assert!(manifest.matches(record), "{} should be tracked", record);
    }
    assert!(!manifest.matches(&a("@", "192.0.2.99")));
    assert!(!manifest.matches(&Record::new("example.com.", "A", 300, "192.0.2.1")));
}

#[test]
fn parsed_records_hash_like_built_ones() {
    let zone = Zone::load(&zone(&["@ A 192.0.2.1 ; apex", "@ A 192.0.2.2"])).unwrap();
    let hashes: Vec<String> = zone
        .records
        .iter()
        .filter(|r| !r.is_soa())
        .map(record_hash::generate)
        .collect();
    assert_eq!(hashes, vec!["1r81el0", "y2xy9a"]);
}
