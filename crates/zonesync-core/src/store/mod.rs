// # Record Store Implementations
//
// Local backends holding a zone as master-file text. Both apply single-record
// mutations the same way: parse, then splice the touched lines.
//
// ## Splicing
//
// - Add appends the record as one fully-qualified line
// - Remove drops the lines the record spans
// - Change replaces them with the new record's line
// - Every other line is kept verbatim, so relative names, `$TTL` and
//   comments survive
// - A record that inherited the removed owner gets that owner written out

pub mod file;
pub mod memory;

pub use file::FilesystemStore;
pub use memory::MemoryStore;

use crate::record::Record;
use crate::zonefile::{self, SourceLines};
use crate::{Error, Result};

/// A single-record mutation of zone text
#[derive(Debug, Clone, Copy)]
pub(crate) enum Edit<'a> {
    Add(&'a Record),
    Remove(&'a Record),
    Change(&'a Record, &'a Record),
}

/// Apply `edit` to zone `text`, returning the edited text
pub(crate) fn apply_edit(text: &str, edit: Edit<'_>) -> Result<String> {
    let records: Vec<(Record, SourceLines)> = zonefile::parse(text)?
        .records
        .into_iter()
        .map(|parsed| {
            let lines = parsed.lines;
            (Record::from_parsed(parsed), lines)
        })
        .collect();
    let mut lines: Vec<String> = text.lines().map(String::from).collect();

    match edit {
        Edit::Add(record) => {
            if records.iter().any(|(r, _)| r == record) {
                return Err(Error::duplicate(record.clone(), None));
            }
            lines.push(record.to_string());
        }
        Edit::Remove(record) => {
            let index = position(&records, record)?;
            splice(&mut lines, &records, index, None);
        }
        Edit::Change(old, new) => {
            let index = position(&records, old)?;
            splice(&mut lines, &records, index, Some(new));
        }
    }

    if lines.is_empty() {
        return Ok(String::new());
    }
    let mut out = lines.join("\n");
    out.push('\n');
    Ok(out)
}

/// Replace the lines of `records[index]` with `replacement`, or drop them
fn splice(
    lines: &mut Vec<String>,
    records: &[(Record, SourceLines)],
    index: usize,
    replacement: Option<&Record>,
) {
    let (old, span) = &records[index];

    if let Some((next, next_span)) = records.get(index + 1) {
        let owner_changes = replacement.is_none_or(|new| new.name != old.name);
        if next_span.inherited_owner && owner_changes {
            let line = &mut lines[next_span.start - 1];
            *line = format!("{}{}", next.name, line);
        }
    }

    let new_lines: Vec<String> = replacement.map(Record::to_string).into_iter().collect();
    lines.splice(span.start - 1..span.end, new_lines);
}

fn position(records: &[(Record, SourceLines)], record: &Record) -> Result<usize> {
    records
        .iter()
        .position(|(r, _)| r == record)
        .ok_or_else(|| Error::not_found(format!("record not in zone: {}", record)))
}
