//! RFC 1035 master-file parsing
//!
//! [`parse`] turns zone file text into [`ParsedRecord`]s with fully
//! qualified owners and domain-name rdata, each remembering the lines it
//! came from. [`Zone`] is the core view of a parsed zone, built through
//! [`Record::from_parsed`].
//!
//! Supported: `$ORIGIN`, `$TTL` (with `s/m/h/d/w` units), `@`, inherited
//! owners, optional TTL and class in either order, parenthesised
//! continuations, quoted strings and `;` comments. `$INCLUDE` is rejected.

mod lexer;

use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::record::Record;

use lexer::Entry;

/// TTL used when neither the record nor the zone sets one
pub const FALLBACK_TTL: u32 = 3600;

const CLASSES: [&str; 4] = ["IN", "CH", "HS", "CS"];

/// A record as read from a zone file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRecord {
    /// Fully-qualified owner name
    pub owner: String,
    /// Uppercase record type
    pub record_type: String,
    /// Resolved TTL in seconds
    pub ttl: u32,
    /// Record class, `IN` unless stated
    pub class: String,
    /// Normalized rdata
    pub rdata: String,
    /// Trailing comment
    pub comment: Option<String>,
    /// Position in the source text
    pub lines: SourceLines,
}

/// Where a record sits in zone file text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLines {
    /// First line (1-based)
    pub start: usize,
    /// Last line, inclusive
    pub end: usize,
    /// The owner was left blank and taken from the record before
    pub inherited_owner: bool,
}

/// Parser output for a whole zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedZone {
    /// Zone origin with trailing dot
    pub origin: String,
    /// Value of `$TTL`, if present
    pub default_ttl: Option<u32>,
    /// Records in file order
    pub records: Vec<ParsedRecord>,
}

/// Parse zone file text
pub fn parse(text: &str) -> Result<ParsedZone> {
    let mut parser = Parser::default();
    for entry in lexer::tokenize(text)? {
        parser.entry(entry)?;
    }
    parser.finish()
}

#[derive(Default)]
struct Parser {
    origin: Option<String>,
    zone_origin: Option<String>,
    default_ttl: Option<u32>,
    last_owner: Option<String>,
    records: Vec<ParsedRecord>,
}

impl Parser {
    fn entry(&mut self, entry: Entry) -> Result<()> {
        let first = entry.tokens[0].as_str();
        if first.starts_with('$') && !entry.inherits_owner {
            self.directive(&entry)
        } else {
            self.record(entry)
        }
    }

    fn directive(&mut self, entry: &Entry) -> Result<()> {
        let argument = entry.tokens.get(1).map(String::as_str);
        match entry.tokens[0].to_uppercase().as_str() {
            "$ORIGIN" => {
                let name = argument.ok_or_else(|| Error::parse(entry.line, "$ORIGIN needs a name"))?;
                let origin = self.qualify(name, entry.line)?;
                if self.zone_origin.is_none() {
                    self.zone_origin = Some(origin.clone());
                }
                self.origin = Some(origin);
                Ok(())
            }
            "$TTL" => {
                let value = argument.ok_or_else(|| Error::parse(entry.line, "$TTL needs a value"))?;
                self.default_ttl = Some(parse_ttl(value).ok_or_else(|| {
                    Error::parse(entry.line, format!("invalid $TTL value '{}'", value))
                })?);
                Ok(())
            }
            "$INCLUDE" => Err(Error::parse(entry.line, "$INCLUDE is not supported")),
            other => Err(Error::parse(entry.line, format!("unknown directive {}", other))),
        }
    }

    fn record(&mut self, entry: Entry) -> Result<()> {
        let line = entry.line;
        let lines = SourceLines {
            start: entry.line,
            end: entry.end_line,
            inherited_owner: entry.inherits_owner,
        };
        let mut tokens = entry.tokens.into_iter().peekable();

        let owner = if entry.inherits_owner {
            self.last_owner
                .clone()
                .ok_or_else(|| Error::parse(line, "record has no owner and none to inherit"))?
        } else {
            let name = tokens.next().unwrap_or_default();
            self.qualify(&name, line)?
        };

        let mut ttl = None;
        let mut class = None;
        for _ in 0..2 {
            let Some(token) = tokens.peek() else { break };
            if class.is_none() && CLASSES.contains(&token.to_uppercase().as_str()) {
                class = tokens.next().map(|c| c.to_uppercase());
            } else if ttl.is_none() && token.starts_with(|c: char| c.is_ascii_digit()) {
                ttl = Some(parse_ttl(token).ok_or_else(|| {
                    Error::parse(line, format!("invalid TTL '{}'", token))
                })?);
                tokens.next();
            } else {
                break;
            }
        }

        let record_type = tokens
            .next()
            .map(|t| t.to_uppercase())
            .ok_or_else(|| Error::parse(line, "missing record type"))?;
        let rdata: Vec<String> = tokens.collect();
        if rdata.is_empty() {
            return Err(Error::parse(line, format!("{} record has no data", record_type)));
        }
        let rdata = self.normalize_rdata(&record_type, rdata, line)?;

        if record_type == "SOA" && self.zone_origin.is_none() {
            self.zone_origin = Some(owner.clone());
        }
        self.last_owner = Some(owner.clone());

        self.records.push(ParsedRecord {
            owner,
            record_type,
            ttl: ttl.or(self.default_ttl).unwrap_or(FALLBACK_TTL),
            class: class.unwrap_or_else(|| "IN".to_string()),
            rdata,
            comment: entry.comment,
            lines,
        });
        Ok(())
    }

    fn normalize_rdata(&self, record_type: &str, mut rdata: Vec<String>, line: usize) -> Result<String> {
        let qualify_at = |rdata: &mut Vec<String>, index: usize| -> Result<()> {
            let name = rdata.get(index).ok_or_else(|| {
                Error::parse(line, format!("{} record is missing a field", record_type))
            })?;
            let qualified = self.qualify(name, line)?;
            rdata[index] = qualified;
            Ok(())
        };

        match record_type {
            "CNAME" | "NS" | "PTR" | "DNAME" => qualify_at(&mut rdata, 0)?,
            "MX" => qualify_at(&mut rdata, 1)?,
            "SRV" => qualify_at(&mut rdata, 3)?,
            "SOA" => {
                qualify_at(&mut rdata, 0)?;
                qualify_at(&mut rdata, 1)?;
                for field in rdata.iter_mut().skip(3) {
                    if let Some(seconds) = parse_ttl(field) {
                        *field = seconds.to_string();
                    }
                }
            }
            _ => {}
        }
        Ok(rdata.join(" "))
    }

    /// Make `name` absolute against the current origin
    fn qualify(&self, name: &str, line: usize) -> Result<String> {
        if name == "@" {
            return self
                .origin
                .clone()
                .ok_or_else(|| Error::parse(line, "'@' used before $ORIGIN"));
        }
        if name.ends_with('.') {
            return Ok(name.to_string());
        }
        Ok(match self.origin.as_deref() {
            None | Some(".") => format!("{}.", name),
            Some(origin) => format!("{}.{}", name, origin),
        })
    }

    fn finish(self) -> Result<ParsedZone> {
        let origin = self
            .zone_origin
            .ok_or_else(|| Error::parse(0, "zone has neither $ORIGIN nor an SOA record"))?;
        Ok(ParsedZone {
            origin,
            default_ttl: self.default_ttl,
            records: self.records,
        })
    }
}

/// Parse a TTL such as `3600`, `1h` or `1h30m` into seconds
pub fn parse_ttl(value: &str) -> Option<u32> {
    if let Ok(seconds) = value.parse::<u32>() {
        return Some(seconds);
    }

    let mut total: u32 = 0;
    let mut digits = String::new();
    for c in value.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
            continue;
        }
        let unit = match c.to_ascii_lowercase() {
            's' => 1,
            'm' => 60,
            'h' => 3_600,
            'd' => 86_400,
            'w' => 604_800,
            _ => return None,
        };
        let amount: u32 = digits.parse().ok()?;
        total = total.checked_add(amount.checked_mul(unit)?)?;
        digits.clear();
    }
    if !digits.is_empty() {
        return None;
    }
    Some(total)
}

/// A parsed zone in core terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    /// Zone origin with trailing dot
    pub origin: String,
    /// Value of `$TTL`, if present
    pub default_ttl: Option<u32>,
    /// Records in file order
    pub records: Vec<Record>,
}

impl Zone {
    /// Parse zone text into core records
    pub fn load(text: &str) -> Result<Self> {
        let parsed = parse(text)?;
        Ok(Self {
            origin: parsed.origin,
            default_ttl: parsed.default_ttl,
            records: parsed.records.into_iter().map(Record::from_parsed).collect(),
        })
    }

    /// Manifest view over this zone's records
    pub fn manifest(&self) -> Manifest {
        Manifest::new(self.records.clone(), self.origin.clone()).with_default_ttl(self.default_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ZONE: &str = r#"$ORIGIN example.com.
$TTL 1h
@       IN  SOA ns.example.com. admin.example.com. (
                2024010101 ; serial
                1d 2h 4w 1h )
@           NS  ns
@       300 IN  A   192.0.2.1
            IN  A   192.0.2.2
www         CNAME @
mail    IN 600 MX  10 mail
@           TXT "v=spf1 include:spf.protection.outlook.com -all" ; spf
_sip._tcp   SRV 10 60 5060 sip
"#;

    #[test]
    fn parses_complete_zone() {
        let zone = parse(ZONE).unwrap();
        assert_eq!(zone.origin, "example.com.");
        assert_eq!(zone.default_ttl, Some(3600));

        let lines: Vec<String> = zone
            .records
            .iter()
            .map(|r| format!("{} {} {} {}", r.owner, r.ttl, r.record_type, r.rdata))
            .collect();
        assert_eq!(
            lines,
            vec![
                "example.com. 3600 SOA ns.example.com. admin.example.com. 2024010101 86400 7200 2419200 3600",
                "example.com. 3600 NS ns.example.com.",
                "example.com. 300 A 192.0.2.1",
                "example.com. 3600 A 192.0.2.2",
                "www.example.com. 3600 CNAME example.com.",
                "mail.example.com. 600 MX 10 mail.example.com.",
                "example.com. 3600 TXT \"v=spf1 include:spf.protection.outlook.com -all\"",
                "_sip._tcp.example.com. 3600 SRV 10 60 5060 sip.example.com.",
            ]
        );
        assert_eq!(zone.records[6].comment.as_deref(), Some("spf"));
        assert_eq!(zone.records[0].comment.as_deref(), Some("serial"));
    }

    #[test]
    fn origin_falls_back_to_soa_owner() {
        let zone = parse("example.org. 3600 IN SOA ns.example.org. admin.example.org. 1 1 1 1 1\n").unwrap();
        assert_eq!(zone.origin, "example.org.");
    }

    #[test]
    fn zone_without_origin_is_rejected() {
        assert!(matches!(parse("www.example.com. 3600 A 192.0.2.1\n"), Err(Error::Parse { .. })));
    }

    #[test]
    fn include_is_rejected() {
        let err = parse("$ORIGIN example.com.\n$INCLUDE other.zone\n").unwrap_err();
        assert!(err.to_string().contains("$INCLUDE"));
    }

    #[test]
    fn ttl_units() {
        assert_eq!(parse_ttl("3600"), Some(3600));
        assert_eq!(parse_ttl("1h30m"), Some(5400));
        assert_eq!(parse_ttl("1W"), Some(604_800));
        assert_eq!(parse_ttl("10x"), None);
        assert_eq!(parse_ttl("h"), None);
        assert_eq!(parse_ttl("5m3"), None);
    }

    #[test]
    fn records_remember_their_lines() {
        let zone = parse(ZONE).unwrap();
        let spans: Vec<(usize, usize, bool)> = zone
            .records
            .iter()
            .map(|r| (r.lines.start, r.lines.end, r.lines.inherited_owner))
            .collect();
        assert_eq!(
            spans,
            vec![
                (3, 5, false),
                (6, 6, false),
                (7, 7, false),
                (8, 8, true),
                (9, 9, false),
                (10, 10, false),
                (11, 11, false),
                (12, 12, false),
            ]
        );
    }

    #[test]
    fn manifest_view_uses_zone_origin() {
        let zone = Zone::load("$ORIGIN example.com.\n@ 3600 A 192.0.2.1\n").unwrap();
        let manifest = zone.manifest();
        assert_eq!(manifest.origin(), "example.com.");
        assert_eq!(manifest.generate().rdata, "\"1r81el0\"");
    }
}
