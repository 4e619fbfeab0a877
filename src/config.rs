//! `component.toml` loading and decoding.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Well-known config file name, looked up in the working directory.
pub const CONFIG_FILE: &str = "component.toml";

/// One decoded config entry: a flat string or a named group of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    Value(String),
    Group(BTreeMap<String, String>),
}

/// Decoded contents of `component.toml`.
///
/// Only flat string keys and one level of string groups (conventionally
/// `[Attributes]`) are recognized; other value shapes are skipped during
/// decode rather than rejected.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    entries: BTreeMap<String, ConfigValue>,
}

impl ConfigDocument {
    /// Load the config file from `dir`.
    ///
    /// A missing or undecodable file degrades to an empty document; the
    /// run then resolves from derived facts and the environment alone.
    pub fn load(dir: &Path) -> ConfigDocument {
        let path = dir.join(CONFIG_FILE);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "component config not read");
                return ConfigDocument::default();
            }
        };
        match ConfigDocument::parse(&text) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "component config not decoded");
                ConfigDocument::default()
            }
        }
    }

    /// Decode a TOML document into flat values and string groups.
    pub fn parse(text: &str) -> Result<ConfigDocument> {
        let table: toml::Table = text.parse().context("parse component config TOML")?;
        let mut entries = BTreeMap::new();
        for (key, value) in table {
            match value {
                toml::Value::String(text) => {
                    entries.insert(key, ConfigValue::Value(text));
                }
                toml::Value::Table(group) => {
                    let mut attributes = BTreeMap::new();
                    for (name, value) in group {
                        if let toml::Value::String(text) = value {
                            attributes.insert(name, text);
                        }
                    }
                    entries.insert(key, ConfigValue::Group(attributes));
                }
                _ => {}
            }
        }
        Ok(ConfigDocument { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flat string entries in key order.
    pub fn flat_entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(key, value)| match value {
            ConfigValue::Value(text) => Some((key.as_str(), text.as_str())),
            ConfigValue::Group(_) => None,
        })
    }

    /// Entries of every nested group, in (group, key) order.
    pub fn group_entries(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.entries
            .iter()
            .filter_map(|(group, value)| match value {
                ConfigValue::Group(attributes) => Some(
                    attributes
                        .iter()
                        .map(move |(name, text)| (group.as_str(), name.as_str(), text.as_str())),
                ),
                ConfigValue::Value(_) => None,
            })
            .flatten()
    }

    /// Exact-name lookup over flat entries.
    pub fn flat_value(&self, name: &str) -> Option<&str> {
        match self.entries.get(name) {
            Some(ConfigValue::Value(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Exact-name lookup across nested groups.
    pub fn group_value(&self, name: &str) -> Option<&str> {
        self.entries.values().find_map(|value| match value {
            ConfigValue::Group(attributes) => attributes.get(name).map(String::as_str),
            ConfigValue::Value(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_flat_and_grouped_strings() {
        let document = ConfigDocument::parse(
            r#"
NAME = "svc"

[Attributes]
DOCKERREPO = "quay.io/acme/svc"
"#,
        )
        .expect("parse");
        assert_eq!(document.flat_value("NAME"), Some("svc"));
        assert_eq!(document.group_value("DOCKERREPO"), Some("quay.io/acme/svc"));
        assert_eq!(document.flat_value("DOCKERREPO"), None);
    }

    #[test]
    fn skips_non_string_values() {
        let document = ConfigDocument::parse(
            r#"
NAME = "svc"
COUNT = 3

[Attributes]
ENABLED = true
VERSION = "1.0"
"#,
        )
        .expect("parse");
        assert_eq!(document.flat_value("COUNT"), None);
        assert_eq!(document.group_value("ENABLED"), None);
        assert_eq!(document.group_value("VERSION"), Some("1.0"));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(ConfigDocument::parse("NAME = ").is_err());
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let document = ConfigDocument::load(dir.path());
        assert!(document.is_empty());
    }

    #[test]
    fn undecodable_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), "NAME = ").expect("write");
        let document = ConfigDocument::load(dir.path());
        assert!(document.is_empty());
    }

    #[test]
    fn file_loads_flat_and_group() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "BUILDID = \"77\"\n[Attributes]\nNAME = \"svc\"\n",
        )
        .expect("write");
        let document = ConfigDocument::load(dir.path());
        assert_eq!(document.flat_value("BUILDID"), Some("77"));
        assert_eq!(document.group_value("NAME"), Some("svc"));
    }
}
