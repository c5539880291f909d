//! Configuration management for the data schema tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (dataschema.toml)
//! - Environment variables (DATASCHEMA__*)
//!
//! ## Example config file (dataschema.toml):
//! ```toml
//! [registry]
//! builtins = true
//! definition_dirs = ["./definitions", "../plugins/table/definitions"]
//!
//! [resolution]
//! include_references = true
//!
//! [log]
//! filter = "content_dataschema=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSchemaConfig {
    /// Registry contents
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Resolution defaults
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Logging
    #[serde(default)]
    pub log: LogConfig,
}

/// Registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Load the built-in HTML vocabulary
    #[serde(default = "default_true")]
    pub builtins: bool,

    /// Directories of definition manifests, loaded in order
    #[serde(default)]
    pub definition_dirs: Vec<PathBuf>,
}

/// Resolution configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Follow modelSchema references unless told otherwise
    #[serde(default)]
    pub include_references: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// tracing-subscriber EnvFilter directive, used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_true() -> bool {
    true
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            builtins: true,
            definition_dirs: Vec::new(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl DataSchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file on top of the defaults
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "dataschema.toml",
            ".dataschema.toml",
            "config/dataschema.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("dev", "familiar", "dataschema") {
            let xdg_config = config_dir.config_dir().join("dataschema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // DATASCHEMA__RESOLUTION__INCLUDE_REFERENCES=true
        builder = builder.add_source(
            Environment::with_prefix("DATASCHEMA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Definition directories with relative paths resolved against the working directory
    pub fn definition_dirs(&self) -> Vec<PathBuf> {
        self.registry
            .definition_dirs
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    std::env::current_dir().unwrap_or_default().join(p)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DataSchemaConfig::default();
        assert!(config.registry.builtins);
        assert!(!config.resolution.include_references);
        assert_eq!(config.log.filter, "info");
    }

    #[test]
    fn test_serialize_config() {
        let config = DataSchemaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("[resolution]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "[registry]\nbuiltins = false\ndefinition_dirs = [\"/srv/defs\"]\n\n[resolution]\ninclude_references = true\n",
        )
        .unwrap();

        let config = DataSchemaConfig::load_from(path.to_str()).unwrap();
        assert!(!config.registry.builtins);
        assert!(config.resolution.include_references);
        assert_eq!(config.definition_dirs(), vec![PathBuf::from("/srv/defs")]);
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = DataSchemaConfig::default();
        config.log.filter = "debug".to_string();
        config.save(path.to_str().unwrap()).unwrap();

        let loaded = DataSchemaConfig::load_from(path.to_str()).unwrap();
        assert_eq!(loaded.log.filter, "debug");
    }
}
