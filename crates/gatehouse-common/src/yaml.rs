//! YAML loading for configuration files and resource snapshots
//!
//! Documents are parsed with yaml-rust2 and converted into `serde_json::Value`
//! so every consumer deserializes through serde the same way.

use serde::de::DeserializeOwned;
use serde_json::{Map, Number, Value};
use thiserror::Error;
use yaml_rust2::{Yaml, YamlLoader};

/// Failure to load a YAML document
#[derive(Debug, Clone, Error)]
pub enum YamlError {
    /// The text is not well-formed YAML
    #[error("invalid YAML: {0}")]
    Syntax(String),

    /// The YAML uses a construct with no JSON equivalent
    #[error("unsupported YAML: {0}")]
    Unsupported(String),

    /// The document does not match the requested type
    #[error("YAML does not match {target}: {message}")]
    Shape {
        /// Name of the target type
        target: &'static str,
        /// Deserializer message
        message: String,
    },
}

/// Parse the first document of a YAML string. Empty input yields `Value::Null`.
pub fn parse_yaml(input: &str) -> Result<Value, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError::Syntax(e.to_string()))?;
    match docs.into_iter().next() {
        Some(doc) => yaml_to_json(doc),
        None => Ok(Value::Null),
    }
}

/// Parse every `---` separated document, skipping empty ones
pub fn parse_yaml_multi(input: &str) -> Result<Vec<Value>, YamlError> {
    let docs = YamlLoader::load_from_str(input).map_err(|e| YamlError::Syntax(e.to_string()))?;
    docs.into_iter()
        .filter(|d| !d.is_null())
        .map(yaml_to_json)
        .collect()
}

/// Parse the first document and deserialize it into `T`.
///
/// An empty document deserializes from an empty mapping, so types whose
/// fields all default accept empty files.
pub fn parse_yaml_as<T: DeserializeOwned>(input: &str) -> Result<T, YamlError> {
    let value = match parse_yaml(input)? {
        Value::Null => Value::Object(Map::new()),
        v => v,
    };
    serde_json::from_value(value).map_err(|e| YamlError::Shape {
        target: std::any::type_name::<T>(),
        message: e.to_string(),
    })
}

fn yaml_to_json(yaml: Yaml) -> Result<Value, YamlError> {
    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Boolean(b) => Ok(Value::Bool(b)),
        Yaml::Integer(i) => Ok(Value::Number(i.into())),
        Yaml::Real(s) => {
            let f: f64 = s
                .parse()
                .map_err(|e: std::num::ParseFloatError| YamlError::Syntax(e.to_string()))?;
            Ok(Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null))
        }
        Yaml::String(s) => Ok(Value::String(s)),
        Yaml::Array(arr) => arr
            .into_iter()
            .map(yaml_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Hash(map) => map
            .into_iter()
            .map(|(k, v)| {
                let key = match k {
                    Yaml::String(s) => s,
                    Yaml::Integer(i) => i.to_string(),
                    Yaml::Boolean(b) => b.to_string(),
                    other => {
                        return Err(YamlError::Unsupported(format!(
                            "mapping key {:?}",
                            other
                        )))
                    }
                };
                yaml_to_json(v).map(|v| (key, v))
            })
            .collect::<Result<Map<String, Value>, _>>()
            .map(Value::Object),
        Yaml::Alias(_) => Err(YamlError::Unsupported("aliases".to_string())),
        Yaml::BadValue => Err(YamlError::Syntax("bad value".to_string())),
    }
}
