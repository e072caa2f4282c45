//! Diff engine
//!
//! Computes the operations that converge one record set onto another.
//! Records are grouped by `(name, type)`; a group holding exactly one
//! record on each side becomes a single `change`, every other group is
//! reconciled by set difference so that unrelated values of a multi-value
//! RRset are never paired up.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::record::Record;

/// Kind of an [`Operation`], ordered the way operations are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    Remove,
    Change,
    Add,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OperationKind::Remove => "Remove",
            OperationKind::Change => "Change",
            OperationKind::Add => "Add",
        };
        f.write_str(label)
    }
}

/// A single mutation of a record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Create a record
    Add(Record),
    /// Replace the first record with the second
    Change(Record, Record),
    /// Delete a record
    Remove(Record),
}

impl Operation {
    /// The operation's kind
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Add(_) => OperationKind::Add,
            Operation::Change(_, _) => OperationKind::Change,
            Operation::Remove(_) => OperationKind::Remove,
        }
    }

    /// Records touched, in argument order
    pub fn records(&self) -> Vec<&Record> {
        match self {
            Operation::Add(record) | Operation::Remove(record) => vec![record],
            Operation::Change(old, new) => vec![old, new],
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Add(record) | Operation::Remove(record) => {
                write!(f, "{} {}", self.kind(), record)
            }
            Operation::Change(old, new) => write!(f, "Change {} -> {}", old, new),
        }
    }
}

/// Compute the operations turning `from` into `to`
///
/// Inputs need not be sorted. Output lists every remove, then every
/// change, then every add.
pub fn diff(from: &[Record], to: &[Record]) -> Vec<Operation> {
    let mut from = from.to_vec();
    let mut to = to.to_vec();
    from.sort();
    to.sort();

    let mut keys = KeyOrder::default();
    let from_groups = group_by_key(&from, &mut keys);
    let to_groups = group_by_key(&to, &mut keys);

    let mut operations = Vec::new();
    for key in &keys.keys {
        let old = from_groups.get(key).map(Vec::as_slice).unwrap_or_default();
        let new = to_groups.get(key).map(Vec::as_slice).unwrap_or_default();

        match (old, new) {
            ([], added) => operations.extend(added.iter().cloned().map(Operation::Add)),
            (removed, []) => operations.extend(removed.iter().cloned().map(Operation::Remove)),
            ([old], [new]) => {
                if old != new {
                    operations.push(Operation::Change(old.clone(), new.clone()));
                }
            }
            (old, new) => {
                let old_set: HashSet<&Record> = old.iter().collect();
                let new_set: HashSet<&Record> = new.iter().collect();
                operations.extend(
                    old.iter()
                        .filter(|r| !new_set.contains(r))
                        .cloned()
                        .map(Operation::Remove),
                );
                operations.extend(
                    new.iter()
                        .filter(|r| !old_set.contains(r))
                        .cloned()
                        .map(Operation::Add),
                );
            }
        }
    }

    // stable: keeps canonical order within each kind
    operations.sort_by_key(Operation::kind);
    operations
}

/// `(name, type)` of an RRset
type GroupKey = (String, String);

/// Group keys in first-seen order
#[derive(Default)]
struct KeyOrder {
    keys: Vec<GroupKey>,
    seen: HashSet<GroupKey>,
}

impl KeyOrder {
    fn insert(&mut self, key: &GroupKey) {
        if self.seen.insert(key.clone()) {
            self.keys.push(key.clone());
        }
    }
}

fn group_by_key(records: &[Record], keys: &mut KeyOrder) -> HashMap<GroupKey, Vec<Record>> {
    let mut groups: HashMap<GroupKey, Vec<Record>> = HashMap::new();
    for record in records {
        let key = (record.name.clone(), record.record_type.clone());
        keys.insert(&key);
        groups.entry(key).or_default().push(record.clone());
    }
    groups
}
