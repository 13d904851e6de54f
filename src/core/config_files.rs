
use std::fs;
use std::path::Path;

use log::debug;
use saphyr::{LoadableYamlNode, YamlOwned};
use serde_json::{Number, Value};
use thiserror::Error;

use crate::core::adapter::ConfigMap;

#[derive(Error, Debug)]
pub enum ConfigFileError {
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("JSON parsing failed: {0}")]
  JsonParseFailed(#[from] serde_json::Error),
  #[error("YAML parsing failed: {0}")]
  YamlParseFailed(#[from] saphyr::ScanError),
  #[error("YAML file is empty!")]
  YamlEmpty,
  #[error("Configuration file must hold a mapping, found {0}")]
  NotAMapping(String),
  #[error("Unsupported YAML value: {0}")]
  UnsupportedYaml(String),
}

/// Reads a flat adapter configuration from a `.json` file, or from YAML for
/// any other extension.
pub fn load_config_map(path: &Path) -> Result<ConfigMap, ConfigFileError> {
  debug!("Loading adapter configuration from {:?}", path);
  let text = fs::read_to_string(path)?;
  let value = match path.extension().and_then(|e| e.to_str()) {
    Some("json") => serde_json::from_str(&text)?,
    _ => {
      let yaml = YamlOwned::load_from_str(&text)
        .map_err(ConfigFileError::YamlParseFailed)?
        .into_iter()
        .next()
        .ok_or(ConfigFileError::YamlEmpty)?;
      yaml_to_json(&yaml)?
    }
  };
  match value {
    Value::Object(map) => Ok(map),
    other => Err(ConfigFileError::NotAMapping(other.to_string())),
  }
}

/// Writes the configuration as pretty JSON, which YAML readers accept too.
pub fn save_config_map(path: &Path, config: &ConfigMap) -> Result<(), ConfigFileError> {
  debug!("Writing adapter configuration to {:?}", path);
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      fs::create_dir_all(parent)?;
    }
  }
  let mut text = serde_json::to_string_pretty(config)?;
  text.push('\n');
  fs::write(path, text)?;
  Ok(())
}

pub fn yaml_to_json(node: &YamlOwned) -> Result<Value, ConfigFileError> {
  match node {
    YamlOwned::Sequence(seq) => Ok(Value::Array(
      seq.iter().map(yaml_to_json).collect::<Result<_, _>>()?,
    )),
    YamlOwned::Mapping(map) => {
      let mut object = ConfigMap::new();
      for (key, value) in map.iter() {
        let key = match yaml_to_json(key)? {
          Value::String(s) => s,
          Value::Array(_) | Value::Object(_) => {
            return Err(ConfigFileError::UnsupportedYaml(format!("{:?}", key)));
          }
          scalar => scalar.to_string(),
        };
        object.insert(key, yaml_to_json(value)?);
      }
      Ok(Value::Object(object))
    }
    _ if node.is_null() => Ok(Value::Null),
    _ => {
      if let Some(b) = node.as_bool() {
        Ok(Value::Bool(b))
      } else if let Some(i) = node.as_integer() {
        Ok(Value::Number(i.into()))
      } else if let Some(f) = node.as_floating_point() {
        Number::from_f64(f)
          .map(Value::Number)
          .ok_or_else(|| ConfigFileError::UnsupportedYaml(f.to_string()))
      } else if let Some(s) = node.as_str() {
        Ok(Value::String(s.to_string()))
      } else {
        Err(ConfigFileError::UnsupportedYaml(format!("{:?}", node)))
      }
    }
  }
}
