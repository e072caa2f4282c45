//! Route 53 XML bodies
//!
//! Parses `ListResourceRecordSetsResponse` and error documents, and builds
//! `ChangeResourceRecordSetsRequest` batches.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use zonesync_core::{Error, Record, Result};

/// Namespace of the 2013-04-01 API
pub const XMLNS: &str = "https://route53.amazonaws.com/doc/2013-04-01/";

/// One resource record set: every value sharing a name and type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordSet {
    pub name: String,
    pub record_type: String,
    pub ttl: u32,
    pub values: Vec<String>,
}

impl RecordSet {
    /// A one-value set holding `record`
    pub fn single(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            ttl: record.ttl,
            values: vec![record.rdata.clone()],
        }
    }

    /// Whether `record` belongs to this set's name and type
    pub fn holds_name_of(&self, record: &Record) -> bool {
        self.name.eq_ignore_ascii_case(&record.name) && self.record_type == record.record_type
    }

    /// Whether `record` is one of this set's values at this set's TTL
    pub fn contains(&self, record: &Record) -> bool {
        self.holds_name_of(record) && self.ttl == record.ttl && self.values.contains(&record.rdata)
    }

    /// One record per value
    pub fn records(&self) -> Vec<Record> {
        self.values
            .iter()
            .map(|value| Record::new(self.name.clone(), self.record_type.clone(), self.ttl, value.clone()))
            .collect()
    }
}

/// One page of a record set listing
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listing {
    pub sets: Vec<RecordSet>,
    /// `(NextRecordName, NextRecordType)` when the listing is truncated
    pub next: Option<(String, String)>,
}

/// `ChangeBatch` action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Delete,
}

impl Action {
    fn as_str(self) -> &'static str {
        match self {
            Action::Create => "CREATE",
            Action::Delete => "DELETE",
        }
    }
}

/// Parse a `ListResourceRecordSetsResponse` page
///
/// Alias sets carry no `ResourceRecords` and come back with no values.
pub fn parse_listing(xml: &str) -> Result<Listing> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut path: Vec<String> = Vec::new();
    let mut listing = Listing::default();
    let mut truncated = false;
    let mut next_name = None;
    let mut next_type = None;

    loop {
        match reader.read_event().map_err(xml_error)? {
            Event::Start(element) => {
                let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
                if name == "ResourceRecordSet" {
                    listing.sets.push(RecordSet::default());
                }
                path.push(name);
            }
            Event::End(_) => {
                path.pop();
            }
            Event::Text(text) => {
                let text = unescape_octal(&text.unescape().map_err(xml_error)?);
                let (parent, current) = match path.as_slice() {
                    [.., parent, current] => (parent.as_str(), current.as_str()),
                    _ => continue,
                };
                let set = listing.sets.last_mut();
                match (parent, current, set) {
                    ("ResourceRecordSet", "Name", Some(set)) => set.name = with_trailing_period(&text),
                    ("ResourceRecordSet", "Type", Some(set)) => set.record_type = text,
                    ("ResourceRecordSet", "TTL", Some(set)) => {
                        set.ttl = text.parse().map_err(|_| {
                            Error::provider("route53", format!("Invalid TTL in listing: {}", text))
                        })?;
                    }
                    ("ResourceRecord", "Value", Some(set)) => set.values.push(text),
                    (_, "IsTruncated", _) => truncated = text == "true",
                    (_, "NextRecordName", _) => next_name = Some(text),
                    (_, "NextRecordType", _) => next_type = Some(text),
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if truncated {
        match (next_name, next_type) {
            (Some(name), Some(record_type)) => listing.next = Some((name, record_type)),
            _ => {
                return Err(Error::provider(
                    "route53",
                    "Truncated listing without NextRecordName/NextRecordType",
                ));
            }
        }
    }
    Ok(listing)
}

/// First `<Message>` of an error document
pub fn error_message(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut in_message = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => in_message = element.local_name().as_ref() == b"Message",
            Ok(Event::Text(text)) if in_message => {
                return text.unescape().ok().map(|message| message.into_owned());
            }
            Ok(Event::End(_)) => in_message = false,
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Build a `ChangeResourceRecordSetsRequest` body
pub fn change_batch(changes: &[(Action, RecordSet)]) -> String {
    let mut xml = String::from(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    xml.push_str(&format!(r#"<ChangeResourceRecordSetsRequest xmlns="{}">"#, XMLNS));
    xml.push_str("<ChangeBatch><Changes>");
    for (action, set) in changes {
        xml.push_str(&format!(
            "<Change><Action>{}</Action><ResourceRecordSet><Name>{}</Name><Type>{}</Type><TTL>{}</TTL><ResourceRecords>",
            action.as_str(),
            escape(&set.name),
            escape(&set.record_type),
            set.ttl
        ));
        for value in &set.values {
            xml.push_str(&format!(
                "<ResourceRecord><Value>{}</Value></ResourceRecord>",
                escape(value)
            ));
        }
        xml.push_str("</ResourceRecords></ResourceRecordSet></Change>");
    }
    xml.push_str("</Changes></ChangeBatch></ChangeResourceRecordSetsRequest>");
    xml
}

/// Decode `\NNN` octal escapes Route 53 uses for special characters
pub fn unescape_octal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        let byte = tail
            .get(..3)
            .filter(|digits| digits.bytes().all(|b| (b'0'..=b'7').contains(&b)))
            .and_then(|digits| u8::from_str_radix(digits, 8).ok());
        match byte {
            Some(byte) => {
                out.push(char::from(byte));
                rest = &tail[3..];
            }
            None => {
                out.push('\\');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

fn with_trailing_period(value: &str) -> String {
    if value.ends_with('.') {
        value.to_string()
    } else {
        format!("{}.", value)
    }
}

fn xml_error(err: quick_xml::Error) -> Error {
    Error::provider("route53", format!("Failed to parse response: {}", err))
}
