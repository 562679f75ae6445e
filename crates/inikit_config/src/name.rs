//! Case-insensitive key names.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::Equivalent;

/// A key name inside a config section.
///
/// Comparison and hashing fold ASCII case, while the original spelling is
/// preserved for serialization. Two names that differ only in case are the
/// same key.
#[derive(Debug, Clone, Eq)]
pub struct Name(String);

impl Name {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub(crate) fn byte_capacity(&self) -> usize {
        self.0.capacity()
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq<&str> for Name {
    fn eq(&self, other: &&str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

/// Borrowed lookup key for maps keyed by [`Name`].
///
/// A plain `&str` hashes its raw bytes and so can never land in the bucket
/// a case-folded `Name` hashed into; this wrapper hashes and compares
/// exactly like `Name` itself.
#[derive(Debug, Clone, Copy)]
pub struct NameKey<'a>(pub &'a str);

impl Hash for NameKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.0.bytes() {
            state.write_u8(byte.to_ascii_lowercase());
        }
    }
}

impl Equivalent<Name> for NameKey<'_> {
    fn equivalent(&self, key: &Name) -> bool {
        key.0.eq_ignore_ascii_case(self.0)
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Name {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
