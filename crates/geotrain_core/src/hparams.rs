//! Hyperparameter capture and persistence.
//!
//! A task's constructor arguments are recorded once, at construction time, as a
//! flat map of JSON values. Tasks read them back through typed accessors which
//! report a [`CoreError::MissingHyperparameter`] or
//! [`CoreError::InvalidHyperparameter`] instead of panicking.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// File name used when hyperparameters are saved next to a run's artifacts.
pub const HPARAMS_FILE_NAME: &str = "hparams.json";

/// Hyperparameters captured from a task's configuration.
///
/// Keys are kept sorted so that saved files are stable across runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hyperparameters {
    values: BTreeMap<String, Value>,
}

impl Hyperparameters {
    /// Create an empty set of hyperparameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture every field of a serializable configuration.
    ///
    /// The configuration must serialize to a JSON object; `None` fields are
    /// kept as `null` so that their presence is still recorded.
    pub fn capture<T: Serialize>(config: &T) -> Result<Self> {
        match serde_json::to_value(config)? {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            other => Err(CoreError::SerializationError(format!(
                "hyperparameters must serialize to an object, got {}",
                type_name(&other)
            ))),
        }
    }

    /// Deserialize the captured values back into a typed configuration.
    pub fn to_config<T: DeserializeOwned>(&self) -> Result<T> {
        let map: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(serde_json::from_value(Value::Object(map))?)
    }

    /// Set a value, replacing any previous one.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    /// Remove a value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Merge another set into this one. Values in `other` win.
    pub fn merge(&mut self, other: Hyperparameters) {
        self.values.extend(other.values);
    }

    /// Raw value lookup.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether a key was captured.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of captured values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, key: &str) -> Result<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| CoreError::MissingHyperparameter {
                key: key.to_string(),
            })
    }

    /// Read a numeric value.
    pub fn get_f64(&self, key: &str) -> Result<f64> {
        let value = self.require(key)?;
        value
            .as_f64()
            .ok_or_else(|| CoreError::invalid(key, "number", value))
    }

    /// Read a non-negative integer.
    pub fn get_usize(&self, key: &str) -> Result<usize> {
        let value = self.require(key)?;
        value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| CoreError::invalid(key, "non-negative integer", value))
    }

    /// Read a boolean.
    pub fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.require(key)?;
        value
            .as_bool()
            .ok_or_else(|| CoreError::invalid(key, "boolean", value))
    }

    /// Read a string.
    pub fn get_str(&self, key: &str) -> Result<&str> {
        let value = self.require(key)?;
        value
            .as_str()
            .ok_or_else(|| CoreError::invalid(key, "string", value))
    }

    /// Read a numeric value, falling back to `default` when absent or `null`.
    pub fn get_f64_or(&self, key: &str, default: f64) -> Result<f64> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.get_f64(key),
        }
    }

    /// Read a non-negative integer, falling back to `default` when absent or `null`.
    pub fn get_usize_or(&self, key: &str, default: usize) -> Result<usize> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.get_usize(key),
        }
    }

    /// Read a string, falling back to `default` when absent or `null`.
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> Result<&'a str> {
        match self.values.get(key) {
            None | Some(Value::Null) => Ok(default),
            Some(_) => self.get_str(key),
        }
    }

    /// Serialize to a pretty-printed JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse from a JSON object string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write to `dir/hparams.json`, creating `dir` if needed.
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        fs::write(dir.join(HPARAMS_FILE_NAME), self.to_json()?)?;
        Ok(())
    }

    /// Read from `dir/hparams.json`.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let json = fs::read_to_string(dir.as_ref().join(HPARAMS_FILE_NAME))?;
        Self::from_json(&json)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct DummyConfig {
        lr: f64,
        patience: usize,
        loss: String,
        weights: Option<String>,
    }

    fn dummy() -> DummyConfig {
        DummyConfig {
            lr: 1e-3,
            patience: 5,
            loss: "ce".to_string(),
            weights: None,
        }
    }

    #[test]
    fn test_capture_records_every_field() {
        let hparams = Hyperparameters::capture(&dummy()).unwrap();

        assert_eq!(hparams.len(), 4);
        assert!((hparams.get_f64("lr").unwrap() - 1e-3).abs() < 1e-12);
        assert_eq!(hparams.get_usize("patience").unwrap(), 5);
        assert_eq!(hparams.get_str("loss").unwrap(), "ce");
        assert_eq!(hparams.get("weights"), Some(&Value::Null));
    }

    #[test]
    fn test_capture_rejects_non_object() {
        let err = Hyperparameters::capture(&42u32).unwrap_err();
        assert!(matches!(err, CoreError::SerializationError(_)));
    }

    #[test]
    fn test_missing_key() {
        let hparams = Hyperparameters::new().with("lr", 0.1);
        let err = hparams.get_usize("patience").unwrap_err();
        assert!(matches!(err, CoreError::MissingHyperparameter { ref key } if key == "patience"));
    }

    #[test]
    fn test_wrong_types() {
        let hparams = Hyperparameters::new()
            .with("lr", "fast")
            .with("patience", -1)
            .with("fraction", 2.5);

        assert!(matches!(
            hparams.get_f64("lr"),
            Err(CoreError::InvalidHyperparameter { .. })
        ));
        assert!(matches!(
            hparams.get_usize("patience"),
            Err(CoreError::InvalidHyperparameter { .. })
        ));
        assert!(matches!(
            hparams.get_usize("fraction"),
            Err(CoreError::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_integer_reads_as_f64() {
        let hparams = Hyperparameters::new().with("lr", 1);
        assert_eq!(hparams.get_f64("lr").unwrap(), 1.0);
    }

    #[test]
    fn test_defaults() {
        let hparams = Hyperparameters::new().with("weights", Value::Null);
        assert_eq!(hparams.get_usize_or("patience", 10).unwrap(), 10);
        assert_eq!(hparams.get_str_or("weights", "none").unwrap(), "none");
        assert_eq!(hparams.get_f64_or("lr", 1e-3).unwrap(), 1e-3);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Hyperparameters::new().with("lr", 0.1).with("patience", 3);
        base.merge(Hyperparameters::new().with("lr", 0.01));

        assert_eq!(base.get_f64("lr").unwrap(), 0.01);
        assert_eq!(base.get_usize("patience").unwrap(), 3);
    }

    #[test]
    fn test_to_config() {
        let hparams = Hyperparameters::capture(&dummy()).unwrap();
        let restored: DummyConfig = hparams.to_config().unwrap();
        assert_eq!(restored, dummy());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let hparams = Hyperparameters::capture(&dummy()).unwrap();

        hparams.save(dir.path().join("run")).unwrap();
        assert!(dir.path().join("run").join(HPARAMS_FILE_NAME).exists());

        let loaded = Hyperparameters::load(dir.path().join("run")).unwrap();
        assert_eq!(loaded, hparams);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Hyperparameters::load(dir.path()).unwrap_err();
        assert!(matches!(err, CoreError::IoError(_)));
    }
}
