//! Query parameters for catalog requests

use serde_json::Value;
use std::fmt::Display;

/// Ordered list of query parameters.
///
/// Every value is stringified on insertion, so callers can pass numbers,
/// booleans or anything else implementing [`Display`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: &str, value: impl Display) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key`, replacing an earlier value for the same key
    pub fn insert(&mut self, key: &str, value: impl Display) {
        let value = value.to_string();
        match self.pairs.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Percent-encoded `k=v&k=v` string, empty when there are no parameters
    pub fn encode(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Build from a JSON object. Strings are taken as-is, other scalars are
    /// stringified and arrays are joined with commas. Nulls are skipped.
    pub fn from_json(params: &Value) -> Self {
        let mut query = Self::new();
        let Value::Object(map) = params else {
            return query;
        };

        for (key, value) in map {
            match value {
                Value::Null => {}
                Value::String(s) => query.insert(key, s),
                Value::Array(arr) => {
                    let joined = arr
                        .iter()
                        .map(|v| match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(",");
                    query.insert(key, joined);
                }
                other => query.insert(key, other),
            }
        }

        query
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (k, v) in iter {
            let key: String = k.into();
            query.insert(&key, v);
        }
        query
    }
}
