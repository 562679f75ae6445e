//! Localization text transforms.
//!
//! Localization files (extension equal to the running or fallback language)
//! get three load-time transforms:
//!
//! - `%` becomes the sentinel `` ` `` across the whole buffer, so values can
//!   pass through `printf`-style formatters untouched.
//! - Unquoted values have C-style escape sequences expanded.
//! - When the running language is the faux code `XXX` and the file carries
//!   the fallback extension, values are pseudo-localized: every plain
//!   character becomes `X` while structure (parentheses, commas, `=`,
//!   quoting, escapes) is preserved.

/// Expand C-style escape sequences in an unquoted localization value.
/// Unrecognized sequences pass through untouched.
pub fn expand_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// The inverse of [`expand_escapes`], used when serializing localization
/// content: control characters, quotes, and backslashes are re-escaped so
/// the text survives a round trip through the line parser.
pub fn escape_control_chars(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\'' => out.push_str("\\'"),
            other => out.push(other),
        }
    }
    out
}

/// Replace `%` with the sentinel character across a raw localization buffer.
pub fn protect_percent(text: &str) -> String {
    text.replace('%', &crate::PERCENT_SENTINEL.to_string())
}

/// Pseudo-localize a quoted value: every character becomes `X` except
/// backslash escape pairs, which are preserved. The input must be in its
/// escaped form ([`escape_control_chars`]); a literal newline would
/// otherwise be rewritten like any other character.
pub fn faux_localize_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut escaped = false;
    for ch in value.chars() {
        if escaped || ch == '\\' {
            escaped = !escaped;
            out.push(ch);
        } else {
            out.push('X');
        }
    }
    out
}

/// Pseudo-localize an unquoted value.
///
/// A parenthesized tuple `(...)` keeps its structure: parentheses, commas,
/// `=`, and quote characters survive, and only the value positions (after a
/// `=`, or quoted strings opened right after `(` or `,`) are rewritten to
/// `X`. Any other value is rewritten wholesale.
pub fn faux_localize_unquoted(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars[0] != '(' || chars[chars.len() - 1] != ')' {
        return "X".repeat(chars.len());
    }

    let mut out = chars.clone();
    let mut prev = chars[0];
    let mut escaped = false;
    let mut in_value = false;
    let mut in_string = false;
    for i in 1..chars.len() {
        let ch = chars[i];
        if escaped || ch == '\\' {
            escaped = !escaped;
        } else if ch == '"' {
            in_string = !in_string;
            if !in_string {
                in_value = false;
            } else if prev == '(' || prev == ',' {
                in_value = true;
            }
        } else if !in_string {
            if ch == '(' || ch == ')' || ch == ',' {
                in_value = false;
            } else if ch == '=' {
                in_value = true;
            } else if in_value {
                out[i] = 'X';
            }
        } else if in_value {
            out[i] = 'X';
        }
        prev = ch;
    }
    out.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_escapes() {
        assert_eq!(expand_escapes("a\\nb"), "a\nb");
        assert_eq!(expand_escapes("tab\\there"), "tab\there");
        assert_eq!(expand_escapes("\\\\"), "\\");
        assert_eq!(expand_escapes("\\q"), "\\q");
    }

    #[test]
    fn test_escape_round_trip() {
        let original = "line one\nline \"two\"\t\\end";
        assert_eq!(expand_escapes(&escape_control_chars(original)), original);
    }

    #[test]
    fn test_protect_percent() {
        assert_eq!(protect_percent("%d of %s"), "`d of `s");
    }

    #[test]
    fn test_faux_quoted_preserves_escapes() {
        assert_eq!(faux_localize_quoted("abc"), "XXX");
        assert_eq!(faux_localize_quoted("a\\nb"), "X\\nX");
        assert_eq!(faux_localize_quoted(""), "");
    }

    #[test]
    fn test_faux_unquoted_plain() {
        assert_eq!(faux_localize_unquoted("Hello"), "XXXXX");
    }

    #[test]
    fn test_faux_unquoted_tuple_preserves_structure() {
        let out = faux_localize_unquoted("(Text=\"Hi\",Count=12)");
        assert_eq!(out, "(Text=\"XX\",Count=XX)");
    }

    #[test]
    fn test_faux_unquoted_tuple_leading_string() {
        let out = faux_localize_unquoted("(\"Hi\",\"There\")");
        assert_eq!(out, "(\"XX\",\"XXXXX\")");
    }
}
