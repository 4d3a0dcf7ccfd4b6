//! Numbering table: last issued number per sequence key.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Storage key of the counter map.
pub const COUNTERS_FILE: &str = "secuencias.json";

/// The last number issued for one sequence key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterEntry {
    /// Last issued number (0 when nothing was issued yet).
    pub last: u64,
}

/// Mapping from sequence key (`"<series>-<year>"`) to its last issued number.
///
/// Serialized as `{"A-2025": {"last": 3}, ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CounterMap {
    entries: BTreeMap<String, CounterEntry>,
}

impl CounterMap {
    /// Creates an empty counter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default numbering table: series `A` and `B` for `year`, both at 0.
    #[must_use]
    pub fn initial(year: i32) -> Self {
        let mut map = Self::new();
        map.set(format!("A-{year}"), 0);
        map.set(format!("B-{year}"), 0);
        map
    }

    /// Parses a counter map leniently.
    ///
    /// Returns `None` if `value` is not a JSON object. Entries whose `last`
    /// is missing or not a non-negative integer are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let mut map = Self::new();
        for (key, entry) in object {
            match entry.get("last").and_then(Value::as_u64) {
                Some(last) => map.set(key.clone(), last),
                None => debug!(key = %key, "skipping counter entry without a valid `last`"),
            }
        }
        Some(map)
    }

    /// Returns the last issued number for `key`.
    #[must_use]
    pub fn last(&self, key: &str) -> Option<u64> {
        self.entries.get(key).map(|entry| entry.last)
    }

    /// Sets the last issued number for `key`.
    pub fn set(&mut self, key: impl Into<String>, last: u64) {
        self.entries.insert(key.into(), CounterEntry { last });
    }

    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no key is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, last)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry.last))
    }
}

impl FromIterator<(String, u64)> for CounterMap {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, last) in iter {
            map.set(key, last);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initial_has_two_series() {
        let map = CounterMap::initial(2025);
        assert_eq!(map.len(), 2);
        assert_eq!(map.last("A-2025"), Some(0));
        assert_eq!(map.last("B-2025"), Some(0));
    }

    #[test]
    fn serializes_in_deployment_shape() {
        let mut map = CounterMap::new();
        map.set("A-2025", 3);
        assert_eq!(serde_json::to_value(&map).unwrap(), json!({"A-2025": {"last": 3}}));
    }

    #[test]
    fn lenient_parse_skips_bad_entries() {
        let value = json!({
            "A-2025": {"last": 4},
            "B-2025": {"last": null},
            "C-2025": "garbage",
            "D-2025": {"last": -1}
        });
        let map = CounterMap::from_value(&value).unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map.last("A-2025"), Some(4));
    }

    #[test]
    fn lenient_parse_rejects_non_objects() {
        assert!(CounterMap::from_value(&json!([1, 2])).is_none());
        assert!(CounterMap::from_value(&json!("x")).is_none());
    }
}
