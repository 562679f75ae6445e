//! Ordered multimap of key/value pairs for one `[Section]`.

use crate::name::Name;
use crate::value::Value;

/// One `[Section]` of a config file.
///
/// Pairs are stored in insertion order; a key may appear more than once
/// (array-style properties). Keys compare case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ConfigSection {
    pairs: Vec<(Name, Value)>,
}

impl ConfigSection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// First value for `key`, if any.
    pub fn find(&self, key: &str) -> Option<&Value> {
        self.pairs
            .iter()
            .find(|(name, _)| name == &key)
            .map(|(_, value)| value)
    }

    pub fn find_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.pairs
            .iter_mut()
            .find(|(name, _)| name == &key)
            .map(|(_, value)| value)
    }

    /// All values for `key`, in insertion order. The iterator borrows only
    /// the section, not `key`.
    pub fn find_all(&self, key: &str) -> impl Iterator<Item = &Value> + '_ {
        let key = key.to_owned();
        self.pairs
            .iter()
            .filter(move |(name, _)| *name == *key)
            .map(|(_, value)| value)
    }

    /// Append a pair, allowing duplicates.
    pub fn add(&mut self, key: impl Into<Name>, value: impl Into<Value>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// Append a pair unless an identical key+value pair already exists.
    /// Returns whether the pair was added.
    pub fn add_unique(&mut self, key: impl Into<Name>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let value = value.into();
        let exists = self
            .pairs
            .iter()
            .any(|(name, existing)| *name == key && *existing == value);
        if exists {
            return false;
        }
        self.pairs.push((key, value));
        true
    }

    /// Remove the one pair matching `key` and `value` exactly.
    /// Returns whether a pair was removed.
    pub fn remove_pair(&mut self, key: &str, value: &str) -> bool {
        match self
            .pairs
            .iter()
            .position(|(name, existing)| name == &key && existing.as_str() == value)
        {
            Some(index) => {
                self.pairs.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every value for `key`. Returns the number of pairs removed.
    pub fn remove_key(&mut self, key: &str) -> usize {
        let before = self.pairs.len();
        self.pairs.retain(|(name, _)| name != &key);
        before - self.pairs.len()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.pairs.iter().any(|(name, _)| name == &key)
    }

    /// Ordered iterator over all pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, &Value)> {
        self.pairs.iter().map(|(name, value)| (name, value))
    }

    /// The distinct key names in first-appearance order.
    pub fn key_names(&self) -> Vec<&Name> {
        let mut names: Vec<&Name> = Vec::new();
        for (name, _) in &self.pairs {
            if !names.iter().any(|n| *n == name) {
                names.push(name);
            }
        }
        names
    }

    /// Structural equality: order-sensitive, case-insensitive on keys, and
    /// quote-tolerant on values (`"X"` equals `X`).
    pub fn matches(&self, other: &ConfigSection) -> bool {
        if self.pairs.len() != other.pairs.len() {
            return false;
        }
        self.pairs
            .iter()
            .zip(other.pairs.iter())
            .all(|((key, value), (other_key, other_value))| {
                key == other_key && value.matches(other_value)
            })
    }

    /// Bytes held by this section's strings: (current, peak) where current
    /// sums lengths and peak sums capacities.
    pub(crate) fn memory_bytes(&self) -> (usize, usize) {
        let mut current = 0;
        let mut peak = 0;
        for (name, value) in &self.pairs {
            current += name.as_str().len() + value.as_str().len();
            peak += name.byte_capacity() + value.byte_capacity();
        }
        current += self.pairs.len() * std::mem::size_of::<(Name, Value)>();
        peak += self.pairs.capacity() * std::mem::size_of::<(Name, Value)>();
        (current, peak)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(pairs: &[(&str, &str)]) -> ConfigSection {
        let mut s = ConfigSection::new();
        for (k, v) in pairs {
            s.add(*k, *v);
        }
        s
    }

    #[test]
    fn test_find_first_and_all() {
        let s = section(&[("K", "1"), ("K", "2"), ("J", "3")]);
        assert_eq!(s.find("K").unwrap().as_str(), "1");
        let all: Vec<_> = s.find_all("K").map(Value::as_str).collect();
        assert_eq!(all, vec!["1", "2"]);
        assert!(s.find("missing").is_none());
    }

    #[test]
    fn test_add_unique() {
        let mut s = ConfigSection::new();
        assert!(s.add_unique("K", "v"));
        assert!(!s.add_unique("K", "v"));
        assert!(s.add_unique("K", "w"));
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_remove_pair_exact() {
        let mut s = section(&[("K", "1"), ("K", "2")]);
        assert!(s.remove_pair("K", "1"));
        assert!(!s.remove_pair("K", "1"));
        assert_eq!(s.find("K").unwrap().as_str(), "2");
    }

    #[test]
    fn test_remove_key_all_values() {
        let mut s = section(&[("K", "1"), ("J", "x"), ("K", "2")]);
        assert_eq!(s.remove_key("k"), 2);
        assert!(!s.contains_key("K"));
        assert!(s.contains_key("J"));
    }

    #[test]
    fn test_matches_quote_tolerant() {
        let a = section(&[("K", "\"X\""), ("J", "1")]);
        let b = section(&[("k", "X"), ("j", "1")]);
        assert!(a.matches(&b));
    }

    #[test]
    fn test_matches_order_sensitive() {
        let a = section(&[("K", "1"), ("J", "2")]);
        let b = section(&[("J", "2"), ("K", "1")]);
        assert!(!a.matches(&b));
    }

    #[test]
    fn test_key_names_distinct_ordered() {
        let s = section(&[("B", "1"), ("A", "2"), ("b", "3")]);
        let names: Vec<_> = s.key_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }
}
