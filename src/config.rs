//! Formatter configuration
//!
//! Loaded from `schemafmt.toml`:
//!
//! ```toml
//! transforms = ["remove_comments_on_extensions", "inline_primary_keys"]
//!
//! [postgres_config_defaults]
//! statement_timeout = 0
//! default_with_oids = false
//! xmloption = "content"
//! ```
//!
//! Missing keys fall back to the built-in defaults. A
//! `postgres_config_defaults` table replaces the default map as a whole.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::SetValue;
use crate::error::{FormatError, FormatResult};
use crate::transforms::TransformKind;

/// File looked up in the working directory.
pub const FILE_NAME: &str = "schemafmt.toml";

/// Main formatter configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Transforms to run, in order.
    pub transforms: Vec<TransformKind>,

    /// Server settings whose `SET` is dropped when it restates the default.
    pub postgres_config_defaults: BTreeMap<String, SettingValue>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transforms: TransformKind::DEFAULT.to_vec(),
            postgres_config_defaults: default_settings(),
        }
    }
}

fn default_settings() -> BTreeMap<String, SettingValue> {
    [
        ("default_table_access_method", SettingValue::from("heap")),
        ("default_with_oids", SettingValue::Bool(false)),
        ("idle_in_transaction_session_timeout", SettingValue::Int(0)),
        ("lock_timeout", SettingValue::Int(0)),
        ("statement_timeout", SettingValue::Int(0)),
        ("transaction_timeout", SettingValue::Int(0)),
        ("standard_conforming_strings", SettingValue::Bool(true)),
        ("xmloption", SettingValue::from("content")),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value))
    .collect()
}

impl Config {
    /// Create a new configuration builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> FormatResult<Self> {
        toml::from_str(text).map_err(|e| FormatError::config(e.to_string()))
    }

    /// Load the configuration from `path`, or from the first discovered
    /// config file, or fall back to the defaults.
    pub fn load(path: Option<&Path>) -> FormatResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match discover() {
                Some(path) => path,
                None => {
                    debug!("no config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        debug!(path = %path.display(), "loading config");
        let text = fs::read_to_string(&path)
            .map_err(|e| FormatError::config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
            .map_err(|e| FormatError::config(format!("{}: {}", path.display(), e)))
    }
}

/// `./schemafmt.toml`, else `<config dir>/schemafmt/config.toml`.
pub fn discover() -> Option<PathBuf> {
    let local = PathBuf::from(FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("schemafmt").join("config.toml"))
        .filter(|path| path.is_file())
}

/// Builder for Config
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Replace the transform list
    pub fn transforms(mut self, transforms: impl IntoIterator<Item = TransformKind>) -> Self {
        self.config.transforms = transforms.into_iter().collect();
        self
    }

    /// Set or override one server default
    pub fn setting(mut self, name: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        self.config
            .postgres_config_defaults
            .insert(name.into(), value.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        self.config
    }
}

/// Default value of a server setting.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Str(value.to_string())
    }
}

fn as_bool(value: &SetValue) -> Option<bool> {
    let word = match value {
        SetValue::Word(word) | SetValue::Str(word) => word.to_ascii_lowercase(),
        SetValue::Integer(1) => return Some(true),
        SetValue::Integer(0) => return Some(false),
        _ => return None,
    };
    match word.as_str() {
        "true" | "yes" | "on" => Some(true),
        "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl SettingValue {
    /// Whether a `SET` argument restates this value.
    pub fn matches(&self, value: &SetValue) -> bool {
        match (self, value) {
            (SettingValue::Bool(expected), _) => as_bool(value) == Some(*expected),
            (SettingValue::Int(expected), SetValue::Integer(n)) => n == expected,
            (SettingValue::Str(expected), SetValue::Word(s) | SetValue::Str(s)) => {
                s.eq_ignore_ascii_case(expected)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.transforms, TransformKind::DEFAULT.to_vec());
        assert_eq!(
            config.postgres_config_defaults.get("default_with_oids"),
            Some(&SettingValue::Bool(false))
        );
        assert_eq!(config.postgres_config_defaults.len(), 8);
    }

    #[test]
    fn test_from_toml() {
        let config = Config::from_toml(
            r#"
            transforms = ["inline_primary_keys", "sort_table_columns"]

            [postgres_config_defaults]
            statement_timeout = 0
            xmloption = "content"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.transforms,
            vec![
                TransformKind::InlinePrimaryKeys,
                TransformKind::SortTableColumns
            ]
        );
        assert_eq!(config.postgres_config_defaults.len(), 2);
        assert_eq!(
            config.postgres_config_defaults.get("xmloption"),
            Some(&SettingValue::Str("content".into()))
        );
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = Config::from_toml("transforms = []").unwrap();
        assert!(config.transforms.is_empty());
        assert_eq!(config.postgres_config_defaults, default_settings());
    }

    #[test]
    fn test_unknown_transform_is_config_error() {
        let err = Config::from_toml(r#"transforms = ["inline_everything"]"#).unwrap_err();
        assert!(matches!(err, FormatError::Config(_)));
    }

    #[test]
    fn test_load_explicit_path() {
        let path = std::env::temp_dir().join(format!("schemafmt-test-{}.toml", std::process::id()));
        fs::write(&path, "transforms = [\"sort_schema_migrations\"]\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        fs::remove_file(&path).unwrap();
        assert_eq!(config.transforms, vec![TransformKind::SortSchemaMigrations]);
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Some(Path::new("/nonexistent/schemafmt.toml"))).unwrap_err();
        assert!(matches!(err, FormatError::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = Config::builder()
            .transforms([TransformKind::RemoveDefaultsSetCommands])
            .setting("work_mem", "4MB")
            .build();
        assert_eq!(config.transforms.len(), 1);
        assert_eq!(
            config.postgres_config_defaults.get("work_mem"),
            Some(&SettingValue::Str("4MB".into()))
        );
    }

    #[test]
    fn test_bool_matching() {
        let default = SettingValue::Bool(false);
        assert!(default.matches(&SetValue::Word("false".into())));
        assert!(default.matches(&SetValue::Word("off".into())));
        assert!(default.matches(&SetValue::Str("No".into())));
        assert!(default.matches(&SetValue::Integer(0)));
        assert!(!default.matches(&SetValue::Word("true".into())));
        assert!(!default.matches(&SetValue::Integer(2)));
    }

    #[test]
    fn test_int_and_string_matching() {
        assert!(SettingValue::Int(0).matches(&SetValue::Integer(0)));
        assert!(!SettingValue::Int(0).matches(&SetValue::Str("0".into())));
        assert!(!SettingValue::Int(10).matches(&SetValue::Numeric("10.0".into())));
        assert!(SettingValue::from("heap").matches(&SetValue::Str("HEAP".into())));
        assert!(SettingValue::from("content").matches(&SetValue::Word("content".into())));
        assert!(!SettingValue::from("heap").matches(&SetValue::Default));
    }
}
