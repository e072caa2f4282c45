//! Zone file lexer
//!
//! Splits master-file text into logical entries: one per record or
//! directive, with parenthesised continuations folded in, quoted strings
//! kept intact and `;` comments collected separately.

use crate::error::{Error, Result};

/// One logical line of a zone file
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    /// Line the entry starts on (1-based)
    pub line: usize,
    /// Last line the entry occupies
    pub end_line: usize,
    /// Entry began with whitespace: the owner is inherited
    pub inherits_owner: bool,
    /// Whitespace-separated tokens; quoted strings keep their quotes
    pub tokens: Vec<String>,
    /// Trailing comment text
    pub comment: Option<String>,
}

/// Tokenize `text` into entries, dropping blank and comment-only lines
pub(crate) fn tokenize(text: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let mut chars = text.chars().peekable();

    let mut line = 1;
    let mut depth = 0usize;
    let mut entry = Entry::start(line, chars.peek().is_some_and(|c| is_blank(*c)));
    let mut token = String::new();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                token.push('"');
                let open_line = line;
                loop {
                    match chars.next() {
                        Some('\\') => {
                            token.push('\\');
                            if let Some(escaped) = chars.next() {
                                if escaped == '\n' {
                                    line += 1;
                                }
                                token.push(escaped);
                            }
                        }
                        Some('"') => {
                            token.push('"');
                            break;
                        }
                        Some('\n') => {
                            line += 1;
                            token.push('\n');
                        }
                        Some(other) => token.push(other),
                        None => return Err(Error::parse(open_line, "unterminated quoted string")),
                    }
                }
            }
            ';' => {
                flush(&mut token, &mut entry);
                let mut comment = String::new();
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    comment.push(next);
                    chars.next();
                }
                let comment = comment.trim();
                if !comment.is_empty() {
                    entry.comment = Some(match entry.comment.take() {
                        Some(existing) => format!("{} {}", existing, comment),
                        None => comment.to_string(),
                    });
                }
            }
            '(' => {
                flush(&mut token, &mut entry);
                depth += 1;
            }
            ')' => {
                flush(&mut token, &mut entry);
                if depth == 0 {
                    return Err(Error::parse(line, "unbalanced ')'"));
                }
                depth -= 1;
            }
            '\n' => {
                flush(&mut token, &mut entry);
                entry.end_line = line;
                line += 1;
                if depth == 0 {
                    let next_inherits = chars.peek().is_some_and(|c| is_blank(*c));
                    let finished = std::mem::replace(&mut entry, Entry::start(line, next_inherits));
                    if !finished.tokens.is_empty() {
                        entries.push(finished);
                    }
                }
            }
            c if is_blank(c) || c == '\r' => flush(&mut token, &mut entry),
            other => token.push(other),
        }
    }

    if depth > 0 {
        return Err(Error::parse(entry.line, "unbalanced '('"));
    }
    flush(&mut token, &mut entry);
    entry.end_line = line;
    if !entry.tokens.is_empty() {
        entries.push(entry);
    }
    Ok(entries)
}

impl Entry {
    fn start(line: usize, inherits_owner: bool) -> Self {
        Self {
            line,
            end_line: line,
            inherits_owner,
            tokens: Vec::new(),
            comment: None,
        }
    }
}

fn flush(token: &mut String, entry: &mut Entry) {
    if !token.is_empty() {
        entry.tokens.push(std::mem::take(token));
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_tokens_and_comments() {
        let entries = tokenize("www  3600 IN A 192.0.2.1 ; web server\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].tokens, vec!["www", "3600", "IN", "A", "192.0.2.1"]);
        assert_eq!(entries[0].comment.as_deref(), Some("web server"));
        assert!(!entries[0].inherits_owner);
    }

    #[test]
    fn quoted_strings_are_single_tokens() {
        let entries = tokenize("@ TXT \"v=spf1 -all ; not a comment\" \"second\"\n").unwrap();
        assert_eq!(
            entries[0].tokens,
            vec!["@", "TXT", "\"v=spf1 -all ; not a comment\"", "\"second\""]
        );
        assert_eq!(entries[0].comment, None);
    }

    #[test]
    fn escaped_quotes_stay_inside_token() {
        let entries = tokenize(r#"@ TXT "say \"hi\"""#).unwrap();
        assert_eq!(entries[0].tokens[2], r#""say \"hi\"""#);
    }

    #[test]
    fn parentheses_join_lines() {
        let text = "@ SOA ns. admin. (\n  2024010101 ; serial\n  1h 15m 1w 1d )\nwww A 192.0.2.1\n";
        let entries = tokenize(text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0].tokens,
            vec!["@", "SOA", "ns.", "admin.", "2024010101", "1h", "15m", "1w", "1d"]
        );
        assert_eq!(entries[0].comment.as_deref(), Some("serial"));
        assert_eq!((entries[0].line, entries[0].end_line), (1, 3));
        assert_eq!((entries[1].line, entries[1].end_line), (4, 4));
    }

    #[test]
    fn leading_whitespace_inherits_owner() {
        let entries = tokenize("www A 192.0.2.1\n    A 192.0.2.2\n\n; only a comment\n").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[1].inherits_owner);
        assert_eq!(entries[1].tokens, vec!["A", "192.0.2.2"]);
    }

    #[test]
    fn unbalanced_input_is_rejected() {
        assert!(matches!(tokenize("@ SOA ( 1 2"), Err(Error::Parse { line: 1, .. })));
        assert!(matches!(tokenize("@ A 1 )"), Err(Error::Parse { .. })));
        assert!(matches!(tokenize("@ TXT \"open"), Err(Error::Parse { .. })));
    }
}
