//! Weakly-structured per-area payload
//!
//! Analyzer modules put whatever they collected into a [`Details`] map. The
//! shape is not statically guaranteed, so every accessor returns a
//! [`DetailError`] instead of panicking when a key is missing or holds a value
//! of another type. Callers (rules in particular) treat that error as
//! "nothing to say".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Lookup failure on a [`Details`] payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DetailError {
    /// Key (or one of the path segments) is absent
    #[error("missing key: {0}")]
    Missing(String),

    /// Key exists but holds a value of another type
    #[error("key {key} is not {expected}")]
    Mismatch {
        /// Full dotted path that was looked up
        key: String,
        /// Expected JSON type
        expected: &'static str,
    },
}

/// String-keyed JSON payload with typed accessors
///
/// Paths are dotted (`"profiles.public.enabled"`); each segment descends into
/// a nested object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Details(Map<String, Value>);

impl Details {
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Insert a top-level value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`Details::insert`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Raw value at a dotted path
    ///
    /// # Errors
    /// Returns [`DetailError::Missing`] if any segment is absent and
    /// [`DetailError::Mismatch`] if an intermediate segment is not an object.
    pub fn get(&self, path: &str) -> Result<&Value, DetailError> {
        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let mut current = self
            .0
            .get(first)
            .ok_or_else(|| DetailError::Missing(path.to_string()))?;

        for segment in segments {
            let object = current.as_object().ok_or_else(|| DetailError::Mismatch {
                key: path.to_string(),
                expected: "an object",
            })?;
            current = object
                .get(segment)
                .ok_or_else(|| DetailError::Missing(path.to_string()))?;
        }

        Ok(current)
    }

    /// # Errors
    /// Missing key or non-string value.
    pub fn get_str(&self, path: &str) -> Result<&str, DetailError> {
        self.get(path)?
            .as_str()
            .ok_or_else(|| mismatch(path, "a string"))
    }

    /// # Errors
    /// Missing key or value that is not a non-negative integer.
    pub fn get_u64(&self, path: &str) -> Result<u64, DetailError> {
        self.get(path)?
            .as_u64()
            .ok_or_else(|| mismatch(path, "an unsigned integer"))
    }

    /// # Errors
    /// Missing key or non-integer value.
    pub fn get_i64(&self, path: &str) -> Result<i64, DetailError> {
        self.get(path)?
            .as_i64()
            .ok_or_else(|| mismatch(path, "an integer"))
    }

    /// # Errors
    /// Missing key or non-boolean value.
    pub fn get_bool(&self, path: &str) -> Result<bool, DetailError> {
        self.get(path)?
            .as_bool()
            .ok_or_else(|| mismatch(path, "a boolean"))
    }

    /// # Errors
    /// Missing key or non-array value.
    pub fn get_array(&self, path: &str) -> Result<&Vec<Value>, DetailError> {
        self.get(path)?
            .as_array()
            .ok_or_else(|| mismatch(path, "an array"))
    }

    /// # Errors
    /// Missing key or non-object value.
    pub fn get_object(&self, path: &str) -> Result<&Map<String, Value>, DetailError> {
        self.get(path)?
            .as_object()
            .ok_or_else(|| mismatch(path, "an object"))
    }
}

impl From<Map<String, Value>> for Details {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn mismatch(path: &str, expected: &'static str) -> DetailError {
    DetailError::Mismatch {
        key: path.to_string(),
        expected,
    }
}
