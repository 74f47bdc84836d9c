// # Records
//
// The provider-defined record set of one domain and the TXT merge operations
// used by the challenge solver.
//
// ## Shape
//
// ```json
// {
//   "TXT": [ { "txtdata": "token123" } ],
//   "A":   [ { "address": "93.184.216.34" } ],
//   "MX":  [ { "exchange": "mx.example.com", "preference": 10 } ]
// }
// ```
//
// Only TXT entries are interpreted. Every other record type, and every field
// other than `txtdata`, is passed through untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Record-type key for TXT records
pub const TXT_KEY: &str = "TXT";

/// Field carrying the text of a TXT entry
pub const TXT_DATA_KEY: &str = "txtdata";

/// One record entry: an open-ended field map whose schema belongs to the provider
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(Map<String, Value>);

impl Entry {
    /// Create an entry with no fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a TXT entry carrying only `txtdata`
    pub fn txt(value: impl Into<String>) -> Self {
        let mut fields = Map::with_capacity(1);
        fields.insert(TXT_DATA_KEY.to_string(), Value::String(value.into()));
        Self(fields)
    }

    /// The `txtdata` field, if present and a string
    pub fn txt_data(&self) -> Option<&str> {
        self.0.get(TXT_DATA_KEY).and_then(Value::as_str)
    }

    /// Get a raw field value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Set a raw field value, returning the previous one
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// All fields of the entry
    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Per-domain record set, keyed by record-type name (`"TXT"`, `"A"`, ...)
///
/// A missing key means "no records of that type", which is not the same
/// thing as a key mapped to an empty list; both survive serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Records(BTreeMap<String, Vec<Entry>>);

impl Records {
    /// Create an empty record set
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the set, upsert `value` as a TXT entry and hand the set back
    ///
    /// ```
    /// use acme_dns_core::records::Records;
    ///
    /// let records = Records::new().with_txt("token123");
    /// assert_eq!(records.first_txt_value(), Some("token123"));
    /// ```
    pub fn with_txt(mut self, value: impl Into<String>) -> Self {
        self.upsert_txt(value);
        self
    }

    /// Number of record types present
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no record type is present at all
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the record type key is present (possibly with an empty list)
    pub fn contains_type(&self, record_type: &str) -> bool {
        self.0.contains_key(record_type)
    }

    /// Entries of one record type
    pub fn get(&self, record_type: &str) -> Option<&[Entry]> {
        self.0.get(record_type).map(Vec::as_slice)
    }

    /// Replace all entries of one record type, returning the previous list
    pub fn insert(&mut self, record_type: impl Into<String>, entries: Vec<Entry>) -> Option<Vec<Entry>> {
        self.0.insert(record_type.into(), entries)
    }

    /// Drop a record type entirely
    pub fn remove_type(&mut self, record_type: &str) -> Option<Vec<Entry>> {
        self.0.remove(record_type)
    }

    /// Iterate over record types and their entries
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Entry])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// TXT entries, if the TXT key is present
    pub fn txt(&self) -> Option<&[Entry]> {
        self.get(TXT_KEY)
    }

    /// String values of all TXT entries, in order; non-string values are skipped
    pub fn txt_values(&self) -> impl Iterator<Item = &str> {
        self.txt().unwrap_or_default().iter().filter_map(Entry::txt_data)
    }

    /// `txtdata` of the first TXT entry, if that entry carries a string
    ///
    /// Later entries are not consulted even when the first one is unusable.
    pub fn first_txt_value(&self) -> Option<&str> {
        self.txt()?.first()?.txt_data()
    }

    /// Add a TXT entry for `value` unless one with the same text already exists
    ///
    /// The comparison is exact and only considers string `txtdata` fields.
    /// New entries are appended at the end. The TXT key is created when absent.
    ///
    /// Returns `true` when an entry was added.
    pub fn upsert_txt(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        let entries = self.0.entry(TXT_KEY.to_string()).or_default();

        if entries.iter().any(|e| e.txt_data() == Some(value.as_str())) {
            return false;
        }

        entries.push(Entry::txt(value));
        true
    }

    /// Remove every TXT entry whose `txtdata` equals `value`
    ///
    /// Entries without a string `txtdata` are kept. Survivors keep their
    /// relative order. Returns the number of entries removed; an absent TXT
    /// key yields `0` and leaves the set untouched.
    pub fn remove_txt_by_value(&mut self, value: &str) -> usize {
        let Some(entries) = self.0.get_mut(TXT_KEY) else {
            return 0;
        };

        let before = entries.len();
        entries.retain(|e| e.txt_data() != Some(value));
        before - entries.len()
    }
}

impl FromIterator<(String, Vec<Entry>)> for Records {
    fn from_iter<I: IntoIterator<Item = (String, Vec<Entry>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn txt_set(values: &[&str]) -> Records {
        let mut records = Records::new();
        records.insert(TXT_KEY, values.iter().map(|v| Entry::txt(*v)).collect());
        records
    }

    #[test]
    fn test_upsert_creates_txt_key() {
        let mut records = Records::new();

        assert!(records.upsert_txt("test"));

        assert_eq!(records.txt().map(<[Entry]>::len), Some(1));
        assert_eq!(records.first_txt_value(), Some("test"));
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut records = Records::new();

        assert!(records.upsert_txt("v"));
        assert!(!records.upsert_txt("v"));
        let after_two = records.clone();
        assert!(!records.upsert_txt("v"));

        assert_eq!(records.txt_values().filter(|v| *v == "v").count(), 1);
        assert_eq!(records, after_two);
    }

    #[test]
    fn test_upsert_appends_after_existing_entries() {
        let mut records = txt_set(&["a", "b"]);

        records.upsert_txt("c");

        assert_eq!(records.txt_values().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_upsert_keeps_other_record_types() {
        let mut records = Records::new();
        records.insert("SomeKey", vec![Entry::new()]);

        records.upsert_txt("test");

        assert_eq!(records.first_txt_value(), Some("test"));
        assert_eq!(records.get("SomeKey").map(<[Entry]>::len), Some(1));
    }

    #[test]
    fn test_upsert_ignores_non_string_txtdata() {
        let mut odd = Entry::new();
        odd.set(TXT_DATA_KEY, json!(42));
        let mut records = Records::new();
        records.insert(TXT_KEY, vec![odd.clone()]);

        assert!(records.upsert_txt("42"));

        assert_eq!(records.txt().map(<[Entry]>::len), Some(2));
        assert_eq!(records.txt().unwrap()[0], odd);
    }

    #[test]
    fn test_with_txt_returns_updated_set() {
        let records = Records::new().with_txt("a").with_txt("a").with_txt("b");

        assert_eq!(records.txt_values().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_remove_every_match() {
        let mut records = txt_set(&["a", "b", "a"]);

        let removed = records.remove_txt_by_value("a");

        assert_eq!(removed, 2);
        assert_eq!(records.txt(), Some(&[Entry::txt("b")][..]));
    }

    #[test]
    fn test_remove_adjacent_matches() {
        let mut records = txt_set(&["a", "a", "a", "c", "a"]);

        assert_eq!(records.remove_txt_by_value("a"), 4);
        assert_eq!(records.txt_values().collect::<Vec<_>>(), vec!["c"]);
    }

    #[test]
    fn test_remove_preserves_survivor_order() {
        let mut records = txt_set(&["x", "a", "y", "a", "z"]);

        records.remove_txt_by_value("a");

        assert_eq!(records.txt_values().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    }

    #[test]
    fn test_remove_on_absent_key_is_noop() {
        let mut records = Records::new();
        records.insert("A", vec![Entry::from(json!({"address": "1.2.3.4"}).as_object().unwrap().clone())]);
        let before = records.clone();

        assert_eq!(records.remove_txt_by_value("a"), 0);
        assert_eq!(records, before);
        assert!(!records.contains_type(TXT_KEY));
    }

    #[test]
    fn test_remove_skips_entries_without_string_txtdata() {
        let mut no_field = Entry::new();
        no_field.set("ttl", json!(300));
        let mut numeric = Entry::new();
        numeric.set(TXT_DATA_KEY, json!(1));
        let mut records = Records::new();
        records.insert(TXT_KEY, vec![no_field.clone(), Entry::txt("1"), numeric.clone()]);

        assert_eq!(records.remove_txt_by_value("1"), 1);
        assert_eq!(records.txt(), Some(&[no_field, numeric][..]));
    }

    #[test]
    fn test_first_txt_value_only_looks_at_index_zero() {
        let mut numeric = Entry::new();
        numeric.set(TXT_DATA_KEY, json!(true));
        let mut records = Records::new();
        records.insert(TXT_KEY, vec![numeric, Entry::txt("later")]);

        assert_eq!(records.first_txt_value(), None);
        assert_eq!(txt_set(&[]).first_txt_value(), None);
        assert_eq!(Records::new().first_txt_value(), None);
    }

    #[test]
    fn test_absent_and_empty_type_survive_json() {
        let mut records = txt_set(&[]);
        records.insert(
            "MX",
            vec![Entry::from(
                json!({"exchange": "mx.example.com", "preference": 10})
                    .as_object()
                    .unwrap()
                    .clone(),
            )],
        );

        let encoded = serde_json::to_value(&records).unwrap();
        assert_eq!(
            encoded,
            json!({"MX": [{"exchange": "mx.example.com", "preference": 10}], "TXT": []})
        );

        let decoded: Records = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded, records);
        assert!(decoded.contains_type(TXT_KEY));
        assert!(!decoded.contains_type("A"));
    }
}
