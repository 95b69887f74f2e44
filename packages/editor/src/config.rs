//! Editor preferences read from `widgetree.config.json`

use crate::{EditorError, Manager};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const DEFAULT_CONFIG_NAME: &str = "widgetree.config.json";

/// Separator placed between a class short name and its counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingSeparator {
    #[default]
    None,
    Underscore,
}

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Manager given to new widgets whose container has no children yet
    #[serde(default)]
    pub default_layout_manager: Manager,

    #[serde(default)]
    pub widget_naming_separator: NamingSeparator,

    /// Uppercase the first letter of generated identifiers
    #[serde(default)]
    pub widget_naming_ufletter: bool,

    /// Written into copied and saved fragments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_layout_manager: Manager::Pack,
            widget_naming_separator: NamingSeparator::None,
            widget_naming_ufletter: false,
            author: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json(source: &str) -> Result<Self, EditorError> {
        serde_json::from_str(source).map_err(|e| EditorError::Config(e.to_string()))
    }

    /// Load config from a directory, falling back to defaults when the
    /// directory has no config file
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config = Self::from_json(&content)?;
            debug!(path = %config_path.display(), "Loaded editor config");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "defaultLayoutManager": "grid",
            "widgetNamingSeparator": "underscore",
            "widgetNamingUfletter": true,
            "author": "Jane"
        }"#;

        let config = EditorConfig::from_json(json).unwrap();
        assert_eq!(config.default_layout_manager, Manager::Grid);
        assert_eq!(config.widget_naming_separator, NamingSeparator::Underscore);
        assert!(config.widget_naming_ufletter);
        assert_eq!(config.author.as_deref(), Some("Jane"));
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::from_json("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.default_layout_manager, Manager::Pack);
        assert_eq!(config.widget_naming_separator, NamingSeparator::None);
    }

    #[test]
    fn test_invalid_manager_rejected() {
        let err = EditorConfig::from_json(r#"{"defaultLayoutManager": "flex"}"#).unwrap_err();
        assert!(matches!(err, EditorError::Config(_)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("widgetree-config-missing");
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
