// Copyright 2023-2026 Mikael Lund
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! # Structured record documents
//!
//! Records are trees of [`Value`]s with ordered maps, read and written as indented JSON.
//! Fields are looked up by key paths, and an absent field is `None` rather than an error.
//!
//! ~~~
//! use iprpy::document::{Tolerance, Value};
//! let a: Value = serde_json::from_str(r#"{"phase": {"T": {"value": 300.0}}}"#).unwrap();
//! let b: Value = serde_json::from_str(r#"{"phase": {"T": {"value": 300}}}"#).unwrap();
//! let path = ["phase", "T", "value"];
//! assert!(Tolerance::default().matches(a.get_path(&path), b.get_path(&path)));
//! assert!(a.get_path(&["phase", "P"]).is_none());
//! ~~~

use crate::error::{ConfigError, FsContext, PrepareError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Ordered mapping of field names to values.
pub type Map = IndexMap<String, Value>;

/// Node in a record document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    // Integer must be placed before Float so that whole numbers stay integers
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Empty map.
    pub fn map() -> Self {
        Self::Map(Map::new())
    }

    /// Follow a path of map keys, returning `None` if any step is missing.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |node, key| match node {
            Value::Map(map) => map.get(*key),
            _ => None,
        })
    }

    /// Insert a value at a path of map keys, creating intermediate maps.
    ///
    /// Intermediate nodes that are not maps are replaced.
    pub fn set_path(&mut self, path: &[&str], value: impl Into<Value>) {
        match path.split_first() {
            None => *self = value.into(),
            Some((key, rest)) => {
                if !matches!(self, Value::Map(_)) {
                    *self = Value::map();
                }
                if let Value::Map(map) = self {
                    map.entry(key.to_string())
                        .or_insert(Value::Null)
                        .set_path(rest, value);
                }
            }
        }
    }

    /// String content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Numeric content as `f64`, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Map content, if this is a map.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// View a value as a list; a single non-list value is a list of one.
    ///
    /// Documents converted from XML often collapse one-element lists to the element itself.
    pub fn as_slice(&self) -> &[Value] {
        match self {
            Value::List(list) => list,
            other => std::slice::from_ref(other),
        }
    }

    /// Read a JSON document from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).fs_context("open", path)?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
            PrepareError::Record {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Write as indented JSON to a file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self).map_err(|source| PrepareError::Record {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json + "\n").fs_context("write", path)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(list: Vec<T>) -> Self {
        Value::List(list.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Relative and absolute tolerances for comparing numbers in records.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Tolerance {
    /// Relative tolerance, scaled by the larger magnitude.
    #[serde(default = "default_tolerance")]
    #[validate(range(min = 0.0))]
    pub relative: f64,
    /// Absolute tolerance, used when larger than the scaled relative tolerance.
    #[serde(default = "default_tolerance")]
    #[validate(range(min = 0.0))]
    pub absolute: f64,
}

const fn default_tolerance() -> f64 {
    1e-9
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            relative: default_tolerance(),
            absolute: default_tolerance(),
        }
    }
}

impl Tolerance {
    /// New tolerance, rejecting negative or non-finite values.
    pub fn new(relative: f64, absolute: f64) -> std::result::Result<Self, ConfigError> {
        let tolerance = Self { relative, absolute };
        tolerance.check()?;
        Ok(tolerance)
    }

    /// Validate the tolerance values.
    pub fn check(&self) -> std::result::Result<(), ConfigError> {
        self.validate()
            .map_err(|err| ConfigError::InvalidTolerance(err.to_string()))?;
        if !self.relative.is_finite() || !self.absolute.is_finite() {
            return Err(ConfigError::InvalidTolerance(
                "tolerances must be finite".to_string(),
            ));
        }
        Ok(())
    }

    /// Two numbers match if equal, or if `|a-b| <= max(rel * max(|a|,|b|), abs)`.
    pub fn is_close(&self, a: f64, b: f64) -> bool {
        if a == b {
            return true;
        }
        if !a.is_finite() || !b.is_finite() {
            return false;
        }
        let scale = a.abs().max(b.abs());
        let bound = (self.relative * scale).max(self.absolute);
        // Allow for rounding in the subtraction itself
        (a - b).abs() <= bound + 2.0 * f64::EPSILON * scale
    }

    /// Compare two optional record fields.
    ///
    /// Absent fields only match absent fields. Numbers (integer or float) compare with
    /// [`Tolerance::is_close`], lists element-wise, maps key-wise regardless of key order,
    /// and everything else by equality.
    pub fn matches(&self, a: Option<&Value>, b: Option<&Value>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.values_match(a, b),
            _ => false,
        }
    }

    fn values_match(&self, a: &Value, b: &Value) -> bool {
        match (a, b) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(a, b)| self.values_match(a, b))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(key, a)| b.get(key).is_some_and(|b| self.values_match(a, b)))
            }
            _ => match (a.as_f64(), b.as_f64()) {
                (Some(a), Some(b)) => self.is_close(a, b),
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Value {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn is_close_defaults() {
        let tol = Tolerance::default();
        assert!(tol.is_close(1.000000001, 1.0));
        assert!(tol.is_close(1.0, 1.000000001));
        assert!(!tol.is_close(1.0, 1.1));
        assert!(tol.is_close(0.0, 1e-10));
        assert!(!tol.is_close(0.0, 1e-8));
        assert!(!tol.is_close(f64::NAN, f64::NAN));
        assert!(tol.is_close(f64::INFINITY, f64::INFINITY));
        assert!(!tol.is_close(f64::INFINITY, 1.0));
    }

    #[test]
    fn is_close_relative_scales() {
        let tol = Tolerance::new(1e-3, 0.0).unwrap();
        assert!(tol.is_close(1000.0, 1000.9));
        assert!(!tol.is_close(1.0, 1.01));
    }

    #[test]
    fn negative_tolerance_rejected() {
        assert!(Tolerance::new(-1.0, 1e-9).is_err());
        assert!(Tolerance::new(1e-9, f64::NAN).is_err());
    }

    #[test]
    fn integers_stay_integers() {
        let v = parse(r#"{"steps": 1000, "T": 300.5}"#);
        assert_eq!(v.get_path(&["steps"]), Some(&Value::Integer(1000)));
        assert_eq!(v.get_path(&["T"]), Some(&Value::Float(300.5)));
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, r#"{"steps":1000,"T":300.5}"#);
    }

    #[test]
    fn map_order_preserved() {
        let v = parse(r#"{"z": 1, "a": 2, "m": 3}"#);
        let keys: Vec<_> = v.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn get_and_set_path() {
        let mut v = Value::map();
        v.set_path(&["a", "b", "c"], 3_i64);
        v.set_path(&["a", "d"], "x");
        assert_eq!(v.get_path(&["a", "b", "c"]), Some(&Value::Integer(3)));
        assert_eq!(v.get_path(&["a", "d"]).and_then(Value::as_str), Some("x"));
        assert!(v.get_path(&["a", "d", "e"]).is_none());
        assert!(v.get_path(&["missing"]).is_none());
    }

    #[test]
    fn nested_values_match() {
        let tol = Tolerance::default();
        let a = parse(r#"{"file": "x.json", "mults": [[0, 3], [0, 3]], "T": 1.0}"#);
        let b = parse(r#"{"T": 1.0000000001, "mults": [[0, 3], [0, 3]], "file": "x.json"}"#);
        assert!(tol.matches(Some(&a), Some(&b)));

        let c = parse(r#"{"file": "y.json", "mults": [[0, 3], [0, 3]], "T": 1.0}"#);
        assert!(!tol.matches(Some(&a), Some(&c)));

        let d = parse(r#"{"file": "x.json", "mults": [[0, 3]], "T": 1.0}"#);
        assert!(!tol.matches(Some(&a), Some(&d)));
    }

    #[test]
    fn absent_fields() {
        let tol = Tolerance::default();
        let v = Value::Integer(1);
        assert!(tol.matches(None, None));
        assert!(!tol.matches(Some(&v), None));
        assert!(!tol.matches(None, Some(&v)));
        assert!(!tol.matches(Some(&Value::from("1")), Some(&v)));
    }

    #[test]
    fn single_value_as_slice() {
        let v = parse(r#"{"atom": {"element": "Al"}}"#);
        assert_eq!(v.get_path(&["atom"]).unwrap().as_slice().len(), 1);
        let v = parse(r#"{"atom": [{"element": "Al"}, {"element": "Ni"}]}"#);
        assert_eq!(v.get_path(&["atom"]).unwrap().as_slice().len(), 2);
    }
}
