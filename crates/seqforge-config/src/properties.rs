//! Flat dotted-key property set.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A flat key-value property set with dotted keys such as `GreatDeluge.CoolRate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads properties from a file, picking the format from the extension.
    ///
    /// `.toml`, `.yaml` / `.yml` are parsed structurally; anything else is
    /// read as `key=value` lines.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&contents),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&contents),
            _ => Self::from_properties_str(&contents),
        }
    }

    /// Parses TOML, flattening nested tables into dotted keys.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(s)?;
        let mut props = Self::new();
        for (key, value) in table {
            flatten_toml(&mut props, key, value);
        }
        Ok(props)
    }

    /// Parses YAML, flattening nested mappings into dotted keys.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(s)?;
        let mut props = Self::new();
        match value {
            serde_yaml::Value::Null => {}
            serde_yaml::Value::Mapping(_) => flatten_yaml(&mut props, None, value)?,
            _ => {
                return Err(ConfigError::Invalid(
                    "YAML properties must be a mapping".to_string(),
                ))
            }
        }
        Ok(props)
    }

    /// Parses `key=value` (or `key: value`) lines. `#` and `!` start comments.
    pub fn from_properties_str(s: &str) -> Result<Self, ConfigError> {
        let mut props = Self::new();
        for (number, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some(split) = line.find(['=', ':']) else {
                return Err(ConfigError::Invalid(format!(
                    "line {}: expected key=value, got {:?}",
                    number + 1,
                    line
                )));
            };
            let (key, value) = line.split_at(split);
            props.set(key.trim(), value[1..].trim());
        }
        Ok(props)
    }

    /// Sets a property, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Display) -> &mut Self {
        self.entries.insert(key.into(), value.to_string());
        self
    }

    /// Builder-style [`Properties::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Display) -> Self {
        self.set(key, value);
        self
    }

    /// Copies every entry of `other` over this set.
    pub fn merge(&mut self, other: &Properties) {
        for (key, value) in &other.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the value or fails with [`ConfigError::Missing`].
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    pub fn get_string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(true),
                "false" | "no" | "off" | "0" => Ok(false),
                _ => Err(malformed(key, raw, "a boolean")),
            },
        }
    }

    pub fn get_f64(&self, key: &str, default: f64) -> Result<f64, ConfigError> {
        self.parse_or(key, default, "a number")
    }

    pub fn get_i64(&self, key: &str, default: i64) -> Result<i64, ConfigError> {
        self.parse_or(key, default, "an integer")
    }

    pub fn get_u64(&self, key: &str, default: u64) -> Result<u64, ConfigError> {
        self.parse_or(key, default, "a non-negative integer")
    }

    /// Like [`Properties::get_f64`] but without a default.
    pub fn get_opt_f64(&self, key: &str) -> Result<Option<f64>, ConfigError> {
        self.get(key)
            .map(|raw| parse(key, raw, "a number"))
            .transpose()
    }

    pub fn get_opt_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        self.get(key)
            .map(|raw| parse(key, raw, "a non-negative integer"))
            .transpose()
    }

    fn parse_or<T: FromStr>(
        &self,
        key: &str,
        default: T,
        expected: &'static str,
    ) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => parse(key, raw, expected),
        }
    }
}

impl<K: Into<String>, V: Display> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Self::new();
        for (key, value) in iter {
            props.set(key, value);
        }
        props
    }
}

fn parse<T: FromStr>(key: &str, raw: &str, expected: &'static str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| malformed(key, raw, expected))
}

fn malformed(key: &str, raw: &str, expected: &'static str) -> ConfigError {
    ConfigError::Malformed {
        key: key.to_string(),
        value: raw.to_string(),
        expected,
    }
}

fn join(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    }
}

fn flatten_toml(props: &mut Properties, key: String, value: toml::Value) {
    match value {
        toml::Value::Table(table) => {
            for (child, value) in table {
                flatten_toml(props, join(Some(&key), &child), value);
            }
        }
        toml::Value::Array(items) => {
            let joined: Vec<String> = items.into_iter().map(toml_scalar).collect();
            props.set(key, joined.join(";"));
        }
        other => {
            props.set(key, toml_scalar(other));
        }
    }
}

fn toml_scalar(value: toml::Value) -> String {
    match value {
        toml::Value::String(s) => s,
        other => other.to_string(),
    }
}

fn flatten_yaml(
    props: &mut Properties,
    prefix: Option<&str>,
    value: serde_yaml::Value,
) -> Result<(), ConfigError> {
    match value {
        serde_yaml::Value::Mapping(mapping) => {
            for (child, value) in mapping {
                let child = yaml_scalar(child).ok_or_else(|| {
                    ConfigError::Invalid("YAML keys must be scalars".to_string())
                })?;
                flatten_yaml(props, Some(&join(prefix, &child)), value)?;
            }
        }
        serde_yaml::Value::Sequence(items) => {
            let key = prefix.unwrap_or_default();
            let joined = items
                .into_iter()
                .map(|item| {
                    yaml_scalar(item).ok_or_else(|| {
                        ConfigError::Invalid(format!("{}: nested sequences are not supported", key))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            props.set(key, joined.join(";"));
        }
        serde_yaml::Value::Tagged(tagged) => flatten_yaml(props, prefix, tagged.value)?,
        scalar => {
            if let (Some(key), Some(value)) = (prefix, yaml_scalar(scalar)) {
                props.set(key, value);
            }
        }
    }
    Ok(())
}

fn yaml_scalar(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar(tagged.value),
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => None,
    }
}
