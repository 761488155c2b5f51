//! Loads the YAML configuration document and applies command-line overrides.

use std::fs;
use std::path::PathBuf;

use serde_yaml::Value;
use tracing::debug;

use super::{ConfigError, PipelineConfig};

/// Loads a [`PipelineConfig`] from disk, applying overrides to the raw YAML
/// document before the typed deserialization.
///
/// Overrides use dotted key paths (`data.ks_alpha=0.1`). Values that look
/// like booleans or numbers are stored as such; everything else stays a
/// string. Override paths must lead through sections that already exist in
/// the document.
pub struct ConfigLoader {
    path: PathBuf,
    overrides: Vec<(String, String)>,
    steps: Option<String>,
}

impl ConfigLoader {
    /// Creates a loader for the given configuration file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            overrides: Vec::new(),
            steps: None,
        }
    }

    /// Adds a single `key=value` override.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Adds raw `KEY=VALUE` override strings as given on the command line.
    pub fn with_raw_overrides(mut self, raw: &[String]) -> Result<Self, ConfigError> {
        for entry in raw {
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedOverride(entry.clone()))?;
            if key.trim().is_empty() {
                return Err(ConfigError::MalformedOverride(entry.clone()));
            }
            self.overrides
                .push((key.trim().to_string(), value.to_string()));
        }
        Ok(self)
    }

    /// Overrides `main.execute_steps` with a comma-separated step list.
    ///
    /// Applied after all other overrides, so it wins over a `--set` on the
    /// same key.
    pub fn with_steps(mut self, csv: impl Into<String>) -> Self {
        self.steps = Some(csv.into());
        self
    }

    /// Reads, overrides, and deserializes the configuration document.
    pub fn load(self) -> Result<PipelineConfig, ConfigError> {
        let raw = fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.clone(),
            source,
        })?;

        let mut document: Value =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;

        for (key, value) in &self.overrides {
            debug!(key = %key, value = %value, "applying configuration override");
            apply_override(&mut document, key, parse_scalar(value))?;
        }

        if let Some(csv) = &self.steps {
            debug!(steps = %csv, "overriding execute_steps");
            apply_override(
                &mut document,
                "main.execute_steps",
                Value::String(csv.clone()),
            )?;
        }

        serde_yaml::from_value(document).map_err(ConfigError::Invalid)
    }
}

/// Sets the value at a dotted key path inside a YAML mapping.
///
/// Every intermediate segment must already exist and be a mapping; the final
/// segment is inserted or replaced.
fn apply_override(document: &mut Value, path: &str, value: Value) -> Result<(), ConfigError> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut node = document;

    for (index, segment) in segments.iter().enumerate() {
        let mapping = node
            .as_mapping_mut()
            .ok_or_else(|| ConfigError::UnknownOverridePath(path.to_string()))?;
        let key = Value::String((*segment).to_string());

        if index == segments.len() - 1 {
            mapping.insert(key, value);
            return Ok(());
        }

        node = mapping
            .get_mut(&key)
            .ok_or_else(|| ConfigError::UnknownOverridePath(path.to_string()))?;
    }

    Err(ConfigError::UnknownOverridePath(path.to_string()))
}

/// Parses an override value the way YAML would: bool, then integer, then
/// float, falling back to a plain string.
fn parse_scalar(raw: &str) -> Value {
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    if let Ok(integer) = raw.parse::<i64>() {
        return Value::Number(integer.into());
    }
    if let Ok(float) = raw.parse::<f64>() {
        return Value::Number(serde_yaml::Number::from(float));
    }
    Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("config.yaml");
        fs::write(&path, contents).unwrap();
        path
    }

    const SAMPLE: &str = r#"
main:
  project_name: genre_classification
  experiment_name: dev
  execute_steps: [download, preprocess]
  random_seed: 42
data:
  file_url: https://example.com/dataset.parquet
  reference_dataset: "preprocessed_data.csv:latest"
  ks_alpha: 0.05
  test_size: 0.3
  val_size: 0.3
  stratify: genre
random_forest_pipeline:
  random_forest:
    n_estimators: 100
    max_depth: 13
  export_artifact: model_export
"#;

    #[test]
    fn test_load_sample() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), SAMPLE);

        let config = ConfigLoader::new(&path).load().unwrap();
        assert_eq!(config.main.project_name, "genre_classification");
        assert_eq!(config.main.random_seed, 42);
        assert_eq!(config.data.stratify, "genre");
        assert_eq!(
            config.main.execute_steps.names(),
            vec!["download", "preprocess"]
        );
        assert_eq!(config.random_forest_pipeline.export_artifact, "model_export");
    }

    #[test]
    fn test_missing_field_is_invalid() {
        let dir = TempDir::new().unwrap();
        let truncated = SAMPLE.replace("stratify: genre", "");
        let path = write_config(dir.path(), &truncated);

        let err = ConfigLoader::new(&path).load().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::new("/nonexistent/config.yaml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_set_override_changes_scalar() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), SAMPLE);

        let config = ConfigLoader::new(&path)
            .with_raw_overrides(&["data.ks_alpha=0.1".to_string()])
            .unwrap()
            .load()
            .unwrap();
        assert!((config.data.ks_alpha - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_steps_override_replaces_list() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), SAMPLE);

        let config = ConfigLoader::new(&path)
            .with_steps("evaluate,download")
            .load()
            .unwrap();
        assert_eq!(
            config.main.execute_steps.names(),
            vec!["evaluate", "download"]
        );
    }

    #[test]
    fn test_steps_override_wins_over_set() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), SAMPLE);

        let config = ConfigLoader::new(&path)
            .with_override("main.execute_steps", "download")
            .with_steps("evaluate")
            .load()
            .unwrap();
        assert_eq!(config.main.execute_steps.names(), vec!["evaluate"]);
    }

    #[test]
    fn test_malformed_override() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), SAMPLE);

        let err = ConfigLoader::new(&path)
            .with_raw_overrides(&["no-equals-sign".to_string()])
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, ConfigError::MalformedOverride(_)));
    }

    #[test]
    fn test_override_path_through_missing_section() {
        let dir = TempDir::new().unwrap();
        let path = write_config(dir.path(), SAMPLE);

        let err = ConfigLoader::new(&path)
            .with_override("nonexistent.key", "1")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownOverridePath(_)));
    }

    #[test]
    fn test_parse_scalar_types() {
        assert_eq!(parse_scalar("true"), Value::Bool(true));
        assert_eq!(parse_scalar("42"), Value::Number(42.into()));
        assert_eq!(
            parse_scalar("0.5"),
            Value::Number(serde_yaml::Number::from(0.5))
        );
        assert_eq!(
            parse_scalar("genre"),
            Value::String("genre".to_string())
        );
    }
}
