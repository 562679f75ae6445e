//! Config values and on-demand typed parsing.
//!
//! Values are stored as strings and parsed when a typed accessor asks for
//! them. Parsing follows the C runtime's `atoi`/`atof` tolerance: the
//! longest numeric prefix wins, and `None` is returned only when there is no
//! numeric prefix at all.

use std::fmt;

/// A single config value: a string parsed on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value(String);

impl Value {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn byte_capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Whether this value is wrapped in a pair of double quotes.
    pub fn has_quotes(&self) -> bool {
        self.0.len() >= 2 && self.0.starts_with('"') && self.0.ends_with('"')
    }

    /// Quote-tolerant equality: `"X"` and `X` compare equal.
    pub fn matches(&self, other: &Value) -> bool {
        if self.0 == other.0 {
            return true;
        }
        if self.has_quotes() && self.0[1..self.0.len() - 1] == other.0 {
            return true;
        }
        if other.has_quotes() && other.0[1..other.0.len() - 1] == self.0 {
            return true;
        }
        false
    }

    pub fn as_i32(&self) -> Option<i32> {
        parse_integer_prefix(&self.0).map(|v| v as i32)
    }

    pub fn as_i64(&self) -> Option<i64> {
        parse_integer_prefix(&self.0)
    }

    pub fn as_f32(&self) -> Option<f32> {
        parse_float_prefix(&self.0).map(|v| v as f32)
    }

    pub fn as_f64(&self) -> Option<f64> {
        parse_float_prefix(&self.0)
    }

    /// `On`/`True`/`Yes`/`1` parse true; `Off`/`False`/`No`/`0` parse false.
    /// Comparison is case-insensitive.
    pub fn as_bool(&self) -> Option<bool> {
        let text = self.0.trim();
        if text.eq_ignore_ascii_case("on")
            || text.eq_ignore_ascii_case("true")
            || text.eq_ignore_ascii_case("yes")
            || text == "1"
        {
            Some(true)
        } else if text.eq_ignore_ascii_case("off")
            || text.eq_ignore_ascii_case("false")
            || text.eq_ignore_ascii_case("no")
            || text == "0"
        {
            Some(false)
        } else {
            None
        }
    }

    pub fn as_vector(&self) -> Option<Vector> {
        Vector::from_text(&self.0)
    }

    pub fn as_rotator(&self) -> Option<Rotator> {
        Rotator::from_text(&self.0)
    }

    pub fn as_color(&self) -> Option<Color> {
        Color::from_text(&self.0)
    }

    /// Split a single-line value into whitespace-delimited tokens, honoring
    /// double quotes around tokens that contain spaces.
    pub fn tokens(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut chars = self.0.chars().peekable();
        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            match chars.peek() {
                None => break,
                Some('"') => {
                    chars.next();
                    let mut token = String::new();
                    for ch in chars.by_ref() {
                        if ch == '"' {
                            break;
                        }
                        token.push(ch);
                    }
                    out.push(token);
                }
                Some(_) => {
                    let mut token = String::new();
                    while let Some(&ch) = chars.peek() {
                        if ch.is_whitespace() {
                            break;
                        }
                        token.push(ch);
                        chars.next();
                    }
                    out.push(token);
                }
            }
        }
        out
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_integer_prefix(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let mut end = 0;
    for (idx, ch) in text.char_indices() {
        if idx == 0 && (ch == '+' || ch == '-') {
            end = idx + ch.len_utf8();
            continue;
        }
        if ch.is_ascii_digit() {
            end = idx + 1;
        } else {
            break;
        }
    }
    text[..end].parse().ok()
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let mut end = 0;
    let mut seen_dot = false;
    for (idx, ch) in text.char_indices() {
        if idx == 0 && (ch == '+' || ch == '-') {
            end = idx + ch.len_utf8();
            continue;
        }
        if ch.is_ascii_digit() {
            end = idx + 1;
        } else if ch == '.' && !seen_dot {
            seen_dot = true;
            end = idx + 1;
        } else {
            break;
        }
    }
    let prefix = text[..end].trim_end_matches('.');
    if prefix.is_empty() || prefix == "+" || prefix == "-" {
        return None;
    }
    prefix.parse().ok()
}

/// Extract the value of a named component from `(X=1,Y=2,Z=3)` style text.
fn component<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!("{name}=");
    let bytes = text.as_bytes();
    let mut search_from = 0;
    while let Some(rel) = text[search_from..].find(&pattern) {
        let at = search_from + rel;
        // Reject partial matches like the R in "PR=".
        let standalone = at == 0 || !bytes[at - 1].is_ascii_alphanumeric();
        if standalone {
            let rest = &text[at + pattern.len()..];
            let end = rest
                .find(|c: char| c == ',' || c == ')' || c.is_whitespace())
                .unwrap_or(rest.len());
            return Some(&rest[..end]);
        }
        search_from = at + pattern.len();
    }
    None
}

/// A three-component float vector in the `(X=…,Y=…,Z=…)` text form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vector {
    pub fn from_text(text: &str) -> Option<Self> {
        let x = component(text, "X")?.parse().ok()?;
        let y = component(text, "Y")?.parse().ok()?;
        let z = component(text, "Z")?.parse().ok()?;
        Some(Self { x, y, z })
    }

    pub fn to_text(self) -> String {
        format!("(X={:.6},Y={:.6},Z={:.6})", self.x, self.y, self.z)
    }
}

/// An integer rotation in the `(Pitch=…,Yaw=…,Roll=…)` text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rotator {
    pub pitch: i32,
    pub yaw: i32,
    pub roll: i32,
}

impl Rotator {
    pub fn from_text(text: &str) -> Option<Self> {
        let pitch = component(text, "Pitch")?.parse().ok()?;
        let yaw = component(text, "Yaw")?.parse().ok()?;
        let roll = component(text, "Roll")?.parse().ok()?;
        Some(Self { pitch, yaw, roll })
    }

    pub fn to_text(self) -> String {
        format!("(Pitch={},Yaw={},Roll={})", self.pitch, self.yaw, self.roll)
    }
}

/// An RGBA color in the `(R=…,G=…,B=…,A=…)` text form. A missing `A`
/// component parses as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub fn from_text(text: &str) -> Option<Self> {
        let r = component(text, "R")?.parse().ok()?;
        let g = component(text, "G")?.parse().ok()?;
        let b = component(text, "B")?.parse().ok()?;
        let a = component(text, "A")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        Some(Self { r, g, b, a })
    }

    pub fn to_text(self) -> String {
        format!("(R={},G={},B={},A={})", self.r, self.g, self.b, self.a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_prefix() {
        assert_eq!(Value::from("42").as_i32(), Some(42));
        assert_eq!(Value::from("-7 units").as_i32(), Some(-7));
        assert_eq!(Value::from("  19").as_i32(), Some(19));
        assert_eq!(Value::from("units").as_i32(), None);
        assert_eq!(Value::from("").as_i32(), None);
    }

    #[test]
    fn test_float_prefix() {
        assert_eq!(Value::from("3.5").as_f32(), Some(3.5));
        assert_eq!(Value::from("-0.25x").as_f64(), Some(-0.25));
        assert_eq!(Value::from("12").as_f32(), Some(12.0));
        assert_eq!(Value::from(".").as_f32(), None);
        assert_eq!(Value::from("x").as_f32(), None);
    }

    #[test]
    fn test_bool_forms() {
        for s in ["On", "true", "YES", "1"] {
            assert_eq!(Value::from(s).as_bool(), Some(true), "{s}");
        }
        for s in ["off", "False", "no", "0"] {
            assert_eq!(Value::from(s).as_bool(), Some(false), "{s}");
        }
        assert_eq!(Value::from("maybe").as_bool(), None);
    }

    #[test]
    fn test_vector() {
        let v = Value::from("(X=1.0,Y=-2.5,Z=3)").as_vector().unwrap();
        assert_eq!(v, Vector { x: 1.0, y: -2.5, z: 3.0 });
        assert!(Value::from("(X=1.0,Y=2.0)").as_vector().is_none());
    }

    #[test]
    fn test_rotator() {
        let r = Value::from("(Pitch=0,Yaw=16384,Roll=-100)")
            .as_rotator()
            .unwrap();
        assert_eq!(r, Rotator { pitch: 0, yaw: 16384, roll: -100 });
    }

    #[test]
    fn test_color_alpha_optional() {
        let c = Value::from("(R=255,G=128,B=0)").as_color().unwrap();
        assert_eq!(c, Color { r: 255, g: 128, b: 0, a: 0 });
        let c = Value::from("(R=1,G=2,B=3,A=4)").as_color().unwrap();
        assert_eq!(c.a, 4);
    }

    #[test]
    fn test_component_rejects_partial_names() {
        // The R in "Pitch=" must not satisfy a search for "R=".
        assert!(Value::from("(Pitch=3,Yaw=4,Roll=5)").as_color().is_none());
    }

    #[test]
    fn test_quote_tolerant_matches() {
        assert!(Value::from("\"X\"").matches(&Value::from("X")));
        assert!(Value::from("X").matches(&Value::from("\"X\"")));
        assert!(Value::from("X").matches(&Value::from("X")));
        assert!(!Value::from("X").matches(&Value::from("Y")));
    }

    #[test]
    fn test_tokens() {
        let v = Value::from("one two \"three four\" five");
        assert_eq!(v.tokens(), vec!["one", "two", "three four", "five"]);
        assert!(Value::from("   ").tokens().is_empty());
    }
}
