use serde::{Deserialize, Serialize};
use sitecanvas_editor::EditorConfig;
use sitecanvas_workspace::HostConfig;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "sitecanvas.config.json";

/// Sitecanvas configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding `<template-id>.html` files
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    #[serde(default)]
    pub editor: EditorConfig,

    #[serde(default)]
    pub host: HostConfig,
}

fn default_templates_dir() -> String {
    "templates".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &Path) -> anyhow::Result<Self> {
        let config_path = cwd.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn templates_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.templates_dir)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            templates_dir: default_templates_dir(),
            editor: EditorConfig::default(),
            host: HostConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "templatesDir": "site",
            "editor": { "debounceMs": 100 },
            "host": { "generationTimeoutMs": null }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.templates_dir, "site");
        assert_eq!(config.editor.debounce_ms, 100);
        assert_eq!(config.editor.exit_transition_ms, 200);
        assert_eq!(config.host.generation_timeout_ms, None);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }
}
