//! Line-based INI tokenizer.
//!
//! The parser walks the text buffer as a state machine over
//! {between-lines, in-section-header, in-line, in-quoted-value, in-escape}
//! and emits one event per logical line: open-section or set-pair. Merge
//! semantics live in [`ConfigFile`](crate::ConfigFile); the parser only
//! tokenizes.
//!
//! Malformed input (a header missing its `]`, a line with no `=`, an
//! unterminated quote at end of input) resyncs at the next newline with no
//! diagnostic.

use std::str::Lines;

/// How a pair line merges into its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// No prefix: add if absent, otherwise replace the first value.
    Set,
    /// `+`: add unless an identical key+value pair exists.
    AddUnique,
    /// `-`: remove the one exactly-matching key+value pair.
    Remove,
    /// `.`: append, allowing duplicates.
    Append,
    /// `!`: remove every value for the key.
    Clear,
}

/// One tokenized logical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// `[Name]` opened a section.
    OpenSection(String),
    /// `Key=Value` (with an optional command prefix) inside a section.
    SetPair {
        command: Command,
        key: String,
        value: String,
        /// Whether the value was quoted in the source. Quoted values arrive
        /// with escapes already expanded; unquoted values arrive verbatim.
        quoted: bool,
    },
}

/// Iterator of [`Event`]s over a text buffer.
pub struct Parser<'a> {
    lines: Lines<'a>,
}

impl<'a> Parser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines(),
        }
    }

    /// Assemble the next logical line: physical lines ending in `\\` are
    /// concatenated with their successor, the backslashes and surrounding
    /// whitespace collapsing to a single space.
    fn next_logical_line(&mut self) -> Option<String> {
        let first = self.lines.next()?;
        let mut line = first.trim_end().to_string();
        while let Some(stripped) = first_continuation(&line) {
            let joined = match self.lines.next() {
                Some(next) => format!("{} {}", stripped.trim_end(), next.trim()),
                None => stripped.trim_end().to_string(),
            };
            line = joined.trim_end().to_string();
        }
        Some(line)
    }
}

fn first_continuation(line: &str) -> Option<&str> {
    line.strip_suffix("\\\\")
}

impl Iterator for Parser<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        loop {
            let line = self.next_logical_line()?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('[') {
                // A header missing its `]` is malformed: drop the line.
                if let Some(name) = rest.strip_suffix(']') {
                    return Some(Event::OpenSection(name.to_string()));
                }
                continue;
            }

            if line.starts_with(';') {
                continue;
            }

            let Some((raw_key, raw_value)) = line.split_once('=') else {
                continue;
            };

            let mut key = raw_key.trim();
            let command = match key.chars().next() {
                Some('+') => Command::AddUnique,
                Some('-') => Command::Remove,
                Some('.') => Command::Append,
                Some('!') => Command::Clear,
                _ => Command::Set,
            };
            if command != Command::Set {
                key = key[1..].trim();
            }

            let trimmed = raw_value.trim();
            let (value, quoted) = if let Some(inner) = trimmed.strip_prefix('"') {
                (unescape_quoted(inner), true)
            } else {
                (trimmed.to_string(), false)
            };

            return Some(Event::SetPair {
                command,
                key: key.to_string(),
                value,
                quoted,
            });
        }
    }
}

/// Expand the escape sequences of a quoted value, consuming up to the next
/// unescaped `"`. Recognized escapes are `\\`, `\"`, and `\n`; any other
/// `\xy` is a two-digit hexadecimal byte. Anything after the closing quote
/// is dropped; a missing closing quote takes the rest of the line.
fn unescape_quoted(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => break,
            '\\' => match chars.next() {
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some('n') => out.push('\n'),
                Some(first) => {
                    let second = chars.next().unwrap_or('0');
                    let byte = hex_digit(first) * 16 + hex_digit(second);
                    out.push(char::from(byte));
                }
                None => break,
            },
            other => out.push(other),
        }
    }
    out
}

fn hex_digit(ch: char) -> u8 {
    ch.to_digit(16).unwrap_or(0) as u8
}
