//! Typed lookups over the string maps a gateway hands us.
//!
//! Two shapes exist on the wire:
//! - [`Values`]: one value per key (path parameters, single-valued headers)
//! - [`MultiValues`]: a sequence per key (repeated query keys and headers)
//!
//! Keys are matched exactly as the transport supplied them. Nothing here
//! lowercases or otherwise normalizes a key.
//!
//! # Example
//!
//! ```
//! use faas_http_core::{MultiValues, ValueError};
//!
//! let mut query = MultiValues::new();
//! query.append("page", "1");
//! query.append("page", "2");
//!
//! // Scalar access on a repeated key returns the last value.
//! assert_eq!(query.int("page"), Ok(2));
//! assert_eq!(query.ints("page"), Ok(vec![1, 2]));
//! assert!(matches!(query.int("size"), Err(ValueError::KeyNotFound(_))));
//! assert_eq!(query.int_or("size", 20), 20);
//! ```

use std::collections::HashMap;
use std::collections::hash_map;

/// Error returned by the typed accessors.
///
/// A missing key is always [`ValueError::KeyNotFound`]; a present value that
/// does not convert is one of the parse variants, never `KeyNotFound`.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValueError {
    /// The key is absent, or maps to an empty sequence.
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// The value under `key` could not be converted.
    #[error("failed to parse {key}: {reason}")]
    Parse { key: String, reason: String },

    /// Element `index` of the sequence under `key` could not be converted.
    #[error("failed to parse {key}[{index}]: {reason}")]
    ParseAt {
        key: String,
        index: usize,
        reason: String,
    },
}

impl ValueError {
    /// Whether this error reports a missing key.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ValueError::KeyNotFound(_))
    }
}

/// Conversion from a raw transport string.
///
/// Implemented for the integer, float, bool and string types the accessors
/// expose; implement it for your own types to use [`Values::get`] and
/// [`MultiValues::get`] with them.
pub trait FromValue: Sized {
    /// Convert `raw`, describing the failure on error.
    fn from_value(raw: &str) -> Result<Self, String>;
}

macro_rules! from_value_via_from_str {
    ($($t:ty),*) => {
        $(
            impl FromValue for $t {
                fn from_value(raw: &str) -> Result<Self, String> {
                    raw.parse::<$t>().map_err(|e| e.to_string())
                }
            }
        )*
    };
}

from_value_via_from_str!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl FromValue for String {
    fn from_value(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl FromValue for bool {
    fn from_value(raw: &str) -> Result<Self, String> {
        match raw {
            "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
            "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
            _ => Err(format!("invalid syntax: {raw:?}")),
        }
    }
}

// ============================================================================
// Values - one value per key
// ============================================================================

/// Single-valued keyed map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Values(HashMap<String, String>);

impl Values {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Remove the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    /// Raw lookup.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Raw lookup with a default.
    pub fn string_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.string(key).unwrap_or(default)
    }

    /// Look up `key` and convert it.
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T, ValueError> {
        let raw = self
            .string(key)
            .ok_or_else(|| ValueError::KeyNotFound(key.to_string()))?;
        T::from_value(raw).map_err(|reason| ValueError::Parse {
            key: key.to_string(),
            reason,
        })
    }

    /// Look up `key` and convert it, falling back to `default` on any error.
    pub fn get_or<T: FromValue>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    pub fn int(&self, key: &str) -> Result<i32, ValueError> {
        self.get(key)
    }

    pub fn int_or(&self, key: &str, default: i32) -> i32 {
        self.get_or(key, default)
    }

    pub fn int64(&self, key: &str) -> Result<i64, ValueError> {
        self.get(key)
    }

    pub fn int64_or(&self, key: &str, default: i64) -> i64 {
        self.get_or(key, default)
    }

    pub fn float64(&self, key: &str) -> Result<f64, ValueError> {
        self.get(key)
    }

    pub fn float64_or(&self, key: &str, default: f64) -> f64 {
        self.get_or(key, default)
    }

    pub fn bool(&self, key: &str) -> Result<bool, ValueError> {
        self.get(key)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get_or(key, default)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, String> {
        self.0.iter()
    }

    /// Consume into the underlying map.
    pub fn into_inner(self) -> HashMap<String, String> {
        self.0
    }
}

impl From<HashMap<String, String>> for Values {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Values {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for Values {
    type Item = (String, String);
    type IntoIter = hash_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Captured route segments. Built once per invocation.
pub type PathParams = Values;

// ============================================================================
// MultiValues - a sequence per key
// ============================================================================

/// Array-valued keyed map.
///
/// Scalar accessors read the **last** element of the sequence, which is the
/// "last header wins" convention of the gateways. Plural accessors return the
/// whole sequence and fail if any element fails.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MultiValues(HashMap<String, Vec<String>>);

impl MultiValues {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the sequence under `key`.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// Replace the whole sequence under `key` with a single value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Replace the whole sequence under `key`.
    pub fn set_all(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.0.insert(key.into(), values);
    }

    /// Remove the sequence under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Vec<String>> {
        self.0.remove(key)
    }

    /// Last value under `key`, if the key exists and its sequence is non-empty.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.last())
            .map(String::as_str)
    }

    pub fn string_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.string(key).unwrap_or(default)
    }

    /// Whole sequence under `key`.
    pub fn strings(&self, key: &str) -> Result<&[String], ValueError> {
        self.0
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| ValueError::KeyNotFound(key.to_string()))
    }

    /// Convert the last value under `key`.
    pub fn get<T: FromValue>(&self, key: &str) -> Result<T, ValueError> {
        let raw = self
            .string(key)
            .ok_or_else(|| ValueError::KeyNotFound(key.to_string()))?;
        T::from_value(raw).map_err(|reason| ValueError::Parse {
            key: key.to_string(),
            reason,
        })
    }

    pub fn get_or<T: FromValue>(&self, key: &str, default: T) -> T {
        self.get(key).unwrap_or(default)
    }

    /// Convert every value under `key`, failing on the first bad element.
    pub fn get_all<T: FromValue>(&self, key: &str) -> Result<Vec<T>, ValueError> {
        self.strings(key)?
            .iter()
            .enumerate()
            .map(|(index, raw)| {
                T::from_value(raw).map_err(|reason| ValueError::ParseAt {
                    key: key.to_string(),
                    index,
                    reason,
                })
            })
            .collect()
    }

    pub fn int(&self, key: &str) -> Result<i32, ValueError> {
        self.get(key)
    }

    pub fn int_or(&self, key: &str, default: i32) -> i32 {
        self.get_or(key, default)
    }

    pub fn ints(&self, key: &str) -> Result<Vec<i32>, ValueError> {
        self.get_all(key)
    }

    pub fn int64(&self, key: &str) -> Result<i64, ValueError> {
        self.get(key)
    }

    pub fn int64_or(&self, key: &str, default: i64) -> i64 {
        self.get_or(key, default)
    }

    pub fn int64s(&self, key: &str) -> Result<Vec<i64>, ValueError> {
        self.get_all(key)
    }

    pub fn float64(&self, key: &str) -> Result<f64, ValueError> {
        self.get(key)
    }

    pub fn float64_or(&self, key: &str, default: f64) -> f64 {
        self.get_or(key, default)
    }

    pub fn float64s(&self, key: &str) -> Result<Vec<f64>, ValueError> {
        self.get_all(key)
    }

    pub fn bool(&self, key: &str) -> Result<bool, ValueError> {
        self.get(key)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.get_or(key, default)
    }

    pub fn bools(&self, key: &str) -> Result<Vec<bool>, ValueError> {
        self.get_all(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Vec<String>> {
        self.0.iter()
    }

    pub fn into_inner(self) -> HashMap<String, Vec<String>> {
        self.0
    }
}

impl From<HashMap<String, Vec<String>>> for MultiValues {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        Self(map)
    }
}

impl From<HashMap<String, String>> for MultiValues {
    fn from(map: HashMap<String, String>) -> Self {
        Self(map.into_iter().map(|(k, v)| (k, vec![v])).collect())
    }
}

impl From<Values> for MultiValues {
    fn from(values: Values) -> Self {
        values.into_inner().into()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MultiValues {
    /// Collect pairs, appending repeated keys in order.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = MultiValues::new();
        for (k, v) in iter {
            values.append(k, v);
        }
        values
    }
}

impl IntoIterator for MultiValues {
    type Item = (String, Vec<String>);
    type IntoIter = hash_map::IntoIter<String, Vec<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn multi(pairs: &[(&str, &[&str])]) -> MultiValues {
        let mut m = MultiValues::new();
        for (k, vs) in pairs {
            m.set_all(*k, vs.iter().map(|v| v.to_string()).collect());
        }
        m
    }

    // ---- Values ----

    #[test]
    fn test_values_string() {
        let v: Values = [("key", "value")].into_iter().collect();
        assert_eq!(v.string("key"), Some("value"));
        assert_eq!(v.string("missing"), None);
        assert_eq!(v.string_or("missing", "dflt"), "dflt");
    }

    #[test]
    fn test_values_int() {
        let v: Values = [("key", "42"), ("bad", "forty-two")].into_iter().collect();
        assert_eq!(v.int("key"), Ok(42));

        let err = v.int("missing").unwrap_err();
        assert_eq!(err, ValueError::KeyNotFound("missing".into()));
        assert!(err.is_not_found());

        let err = v.int("bad").unwrap_err();
        assert!(matches!(err, ValueError::Parse { ref key, .. } if key == "bad"));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_values_int64_float_bool() {
        let v: Values = [
            ("big", "9007199254740993"),
            ("ratio", "1.5"),
            ("flag", "true"),
            ("short", "T"),
            ("zero", "0"),
            ("junk", "yes"),
        ]
        .into_iter()
        .collect();

        assert_eq!(v.int64("big"), Ok(9_007_199_254_740_993));
        assert_eq!(v.float64("ratio"), Ok(1.5));
        assert_eq!(v.bool("flag"), Ok(true));
        assert_eq!(v.bool("short"), Ok(true));
        assert_eq!(v.bool("zero"), Ok(false));
        assert!(matches!(v.bool("junk"), Err(ValueError::Parse { .. })));
        assert!(v.float64("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_values_defaults_never_fail() {
        let v: Values = [("bad", "x")].into_iter().collect();
        assert_eq!(v.int_or("bad", 7), 7);
        assert_eq!(v.int_or("missing", 7), 7);
        assert_eq!(v.int64_or("missing", -1), -1);
        assert_eq!(v.float64_or("bad", 0.25), 0.25);
        assert!(v.bool_or("missing", true));
    }

    #[test]
    fn test_values_keys_are_case_sensitive() {
        let v: Values = [("Id", "1")].into_iter().collect();
        assert!(v.int("id").unwrap_err().is_not_found());
        assert_eq!(v.int("Id"), Ok(1));
    }

    // ---- MultiValues ----

    #[test]
    fn test_multi_scalar_returns_last() {
        let m = multi(&[("k", &["a", "b", "c"])]);
        assert_eq!(m.string("k"), Some("c"));
    }

    #[test]
    fn test_multi_scalar_empty_sequence_is_not_found() {
        let m = multi(&[("k", &[])]);
        assert_eq!(m.string("k"), None);
        assert_eq!(m.int("k"), Err(ValueError::KeyNotFound("k".into())));
        // The key exists, so the plural form still succeeds.
        assert_eq!(m.ints("k"), Ok(vec![]));
    }

    #[test]
    fn test_multi_int_last_element() {
        let m = multi(&[("n", &["x", "42"])]);
        // Only the last element is consulted by the scalar accessor.
        assert_eq!(m.int("n"), Ok(42));
        assert!(m.int("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_multi_plural_fails_with_index() {
        let m = multi(&[("n", &["1", "2", "three", "4"])]);
        let err = m.ints("n").unwrap_err();
        assert!(matches!(err, ValueError::ParseAt { index: 2, .. }));
        assert!(err.to_string().starts_with("failed to parse n[2]"));
    }

    #[test]
    fn test_multi_plural_success() {
        let m = multi(&[
            ("i", &["1", "-2"]),
            ("f", &["0.5", "2e3"]),
            ("b", &["true", "0", "F"]),
        ]);
        assert_eq!(m.ints("i"), Ok(vec![1, -2]));
        assert_eq!(m.int64s("i"), Ok(vec![1, -2]));
        assert_eq!(m.float64s("f"), Ok(vec![0.5, 2000.0]));
        assert_eq!(m.bools("b"), Ok(vec![true, false, false]));
        assert_eq!(
            m.strings("i").unwrap(),
            &["1".to_string(), "-2".to_string()]
        );
        assert!(m.strings("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_multi_defaults() {
        let m = multi(&[("bad", &["nope"])]);
        assert_eq!(m.int_or("bad", 3), 3);
        assert_eq!(m.int64_or("missing", 3), 3);
        assert!(!m.bool_or("bad", false));
        assert_eq!(m.string_or("missing", "x"), "x");
    }

    #[test]
    fn test_multi_append_and_set() {
        let mut m = MultiValues::new();
        m.append("k", "1");
        m.append("k", "2");
        assert_eq!(m.strings("k").unwrap().len(), 2);
        m.set("k", "3");
        assert_eq!(m.strings("k").unwrap(), &["3".to_string()]);
    }

    #[test]
    fn test_multi_from_single_map() {
        let single: HashMap<String, String> =
            [("a".to_string(), "1".to_string())].into_iter().collect();
        let m = MultiValues::from(single);
        assert_eq!(m.int("a"), Ok(1));
    }

    #[test]
    fn test_custom_from_value() {
        #[derive(Debug, PartialEq)]
        struct Upper(String);

        impl FromValue for Upper {
            fn from_value(raw: &str) -> Result<Self, String> {
                Ok(Upper(raw.to_uppercase()))
            }
        }

        let v: Values = [("k", "abc")].into_iter().collect();
        assert_eq!(v.get::<Upper>("k"), Ok(Upper("ABC".into())));
    }
}
