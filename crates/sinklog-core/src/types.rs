//! Core types for sinklog

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Record severity, ordered from least to most severe
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub const ALL: [Level; 6] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Name written to the `level` field
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Three-letter tag used on the console
    pub fn short(&self) -> &'static str {
        match self {
            Level::Trace => "TRC",
            Level::Debug => "DBG",
            Level::Info => "INF",
            Level::Warn => "WRN",
            Level::Error => "ERR",
            Level::Fatal => "FTL",
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(Error::InvalidLevel(s.to_string())),
        }
    }
}

/// What the rotation monitor does when closing or truncating the log file fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RotationErrorPolicy {
    /// Log the failure, keep the current sinks, retry on the next tick
    #[default]
    Continue,
    /// Treat the failure as fatal
    Fatal,
}

impl RotationErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationErrorPolicy::Continue => "continue",
            RotationErrorPolicy::Fatal => "fatal",
        }
    }
}

impl FromStr for RotationErrorPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(RotationErrorPolicy::Continue),
            "fatal" => Ok(RotationErrorPolicy::Fatal),
            _ => Err(Error::config(format!("Invalid rotation error policy: {}", s))),
        }
    }
}

/// Key/value pairs attached to a record
///
/// Keys are kept sorted so records render deterministically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(BTreeMap<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a field, replacing any previous value under the same key
    pub fn insert<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Merge `other` into `self`; values from `other` win on collision.
    pub fn merge(&mut self, other: &Fields) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Union of `self` and `other`, `other` winning on collision
    pub fn merged(&self, other: &Fields) -> Fields {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl From<()> for Fields {
    fn from(_: ()) -> Self {
        Fields::new()
    }
}

impl From<BTreeMap<String, Value>> for Fields {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Fields(map)
    }
}

impl From<serde_json::Map<String, Value>> for Fields {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Fields {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Fields {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for Fields {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Build [`Fields`] from heterogeneous `key => value` pairs.
///
/// ```
/// let fields = sinklog_core::fields! { "user" => "alice", "id" => 42 };
/// assert_eq!(fields.len(), 2);
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Fields::new()$(.with($key, $value))+
    };
}

/// A log record held for deferred emission
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub fields: Fields,
}

impl LogEntry {
    pub fn new<S: Into<String>>(level: Level, message: S) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Fields::new(),
        }
    }

    pub fn with_fields<F: Into<Fields>>(mut self, fields: F) -> Self {
        self.fields.merge(&fields.into());
        self
    }

    pub fn with_field<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.fields.insert(key, value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_level_ordering_is_monotonic() {
        for pair in Level::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("INFO".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" fatal ".parse::<Level>().unwrap(), Level::Fatal);
        assert!(matches!("loud".parse::<Level>(), Err(Error::InvalidLevel(_))));
    }

    #[test]
    fn test_level_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Level::Warn).unwrap(), "\"warn\"");
        let level: Level = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(level, Level::Error);
    }

    #[test]
    fn test_rotation_policy_parse() {
        assert_eq!(
            "FATAL".parse::<RotationErrorPolicy>().unwrap(),
            RotationErrorPolicy::Fatal
        );
        assert!("retry".parse::<RotationErrorPolicy>().is_err());
    }

    #[test]
    fn test_fields_merge_later_wins() {
        let mut base = fields! { "user" => "alice", "id" => 1 };
        base.merge(&fields! { "id" => 2, "role" => "admin" });

        assert_eq!(base.len(), 3);
        assert_eq!(base.get("user"), Some(&json!("alice")));
        assert_eq!(base.get("id"), Some(&json!(2)));
        assert_eq!(base.get("role"), Some(&json!("admin")));
    }

    #[test]
    fn test_fields_merged_leaves_original() {
        let base = fields! { "a" => 1 };
        let out = base.merged(&fields! { "a" => 2 });
        assert_eq!(base.get("a"), Some(&json!(1)));
        assert_eq!(out.get("a"), Some(&json!(2)));
    }

    #[test]
    fn test_fields_from_conversions() {
        assert!(Fields::from(()).is_empty());

        let from_array = Fields::from([("k", "v")]);
        assert_eq!(from_array.get("k"), Some(&json!("v")));

        let from_vec = Fields::from(vec![("n", 3)]);
        assert_eq!(from_vec.get("n"), Some(&json!(3)));
    }

    #[test]
    fn test_fields_serialize_as_object() {
        let fields = fields! { "b" => true, "a" => "x" };
        assert_eq!(serde_json::to_string(&fields).unwrap(), r#"{"a":"x","b":true}"#);
    }

    #[test]
    fn test_log_entry_builder() {
        let entry = LogEntry::new(Level::Info, "hello")
            .with_field("k", 1)
            .with_fields([("k", 2)]);
        assert_eq!(entry.message, "hello");
        assert_eq!(entry.fields.get("k"), Some(&json!(2)));
    }
}
