//! Flat key/value snapshots for save and restore.
//!
//! A snapshot maps field names to primitive values. Readers are forgiving
//! about absent keys (callers keep their current value) but strict about
//! values of the wrong type, which abort the restore.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Field names used by [`crate::MarkerStore`] and [`crate::Calibration`].
pub mod keys {
    pub const MARKER_COUNT: &str = "marker_count";
    pub const SELECTED_INDEX: &str = "selected_index";
    pub const ORIGIN_X: &str = "origin_x";
    pub const ORIGIN_Y: &str = "origin_y";
    pub const SCALE_X: &str = "scale_x";
    pub const SCALE_Y: &str = "scale_y";

    pub fn marker_run_id(index: usize) -> String {
        format!("marker_{index}_run_id")
    }

    pub fn marker_x(index: usize) -> String {
        format!("marker_{index}_x")
    }

    pub fn marker_y(index: usize) -> String {
        format!("marker_{index}_y")
    }
}

/// A primitive snapshot value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<i64> for SnapshotValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for SnapshotValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<String> for SnapshotValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for SnapshotValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Flat mapping of field names to primitive values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    fields: BTreeMap<String, SnapshotValue>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<SnapshotValue>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&SnapshotValue> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<SnapshotValue> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SnapshotValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every field of `other` into this snapshot, overwriting on conflict.
    pub fn merge(&mut self, other: Snapshot) {
        self.fields.extend(other.fields);
    }

    /// Read a numeric field. Integers are widened to `f64`.
    pub fn float(&self, key: &str) -> ModelResult<Option<f64>> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Float(value)) => Ok(Some(*value)),
            Some(SnapshotValue::Int(value)) => Ok(Some(*value as f64)),
            Some(SnapshotValue::Text(_)) => Err(wrong_type(key, "a number")),
        }
    }

    /// Read an integer field. Floats are rejected rather than truncated.
    pub fn int(&self, key: &str) -> ModelResult<Option<i64>> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Int(value)) => Ok(Some(*value)),
            Some(_) => Err(wrong_type(key, "an integer")),
        }
    }

    pub fn text(&self, key: &str) -> ModelResult<Option<&str>> {
        match self.fields.get(key) {
            None => Ok(None),
            Some(SnapshotValue::Text(value)) => Ok(Some(value.as_str())),
            Some(_) => Err(wrong_type(key, "text")),
        }
    }
}

fn wrong_type(key: &str, expected: &str) -> ModelError {
    ModelError::import(format!("field '{key}' must be {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keeps_ints_and_floats_apart() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(keys::MARKER_COUNT, 2i64);
        snapshot.insert(keys::SCALE_X, 2.0);
        snapshot.insert("saved_at", "2026-01-01T00:00:00Z");

        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: Snapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.get(keys::MARKER_COUNT), Some(&SnapshotValue::Int(2)));
        assert_eq!(parsed.get(keys::SCALE_X), Some(&SnapshotValue::Float(2.0)));
        assert_eq!(parsed.text("saved_at").unwrap(), Some("2026-01-01T00:00:00Z"));
    }

    #[test]
    fn test_json_is_a_flat_object() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(keys::ORIGIN_X, 1.5);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(json, r#"{"origin_x":1.5}"#);
    }

    #[test]
    fn test_float_accepts_int() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(keys::ORIGIN_X, 3i64);
        assert_eq!(snapshot.float(keys::ORIGIN_X).unwrap(), Some(3.0));
    }

    #[test]
    fn test_wrong_types_are_import_errors() {
        let mut snapshot = Snapshot::new();
        snapshot.insert(keys::MARKER_COUNT, 1.5);
        snapshot.insert(keys::ORIGIN_X, "left");

        assert!(matches!(
            snapshot.int(keys::MARKER_COUNT),
            Err(ModelError::Import { .. })
        ));
        assert!(matches!(
            snapshot.float(keys::ORIGIN_X),
            Err(ModelError::Import { .. })
        ));
    }

    #[test]
    fn test_missing_keys_read_as_none() {
        let snapshot = Snapshot::new();
        assert_eq!(snapshot.float(keys::SCALE_Y).unwrap(), None);
        assert_eq!(snapshot.int(keys::SELECTED_INDEX).unwrap(), None);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut a = Snapshot::new();
        a.insert(keys::SCALE_X, 1.0);
        let mut b = Snapshot::new();
        b.insert(keys::SCALE_X, 4.0);
        b.insert(keys::SCALE_Y, 5.0);

        a.merge(b);
        assert_eq!(a.len(), 2);
        assert_eq!(a.float(keys::SCALE_X).unwrap(), Some(4.0));
    }
}
