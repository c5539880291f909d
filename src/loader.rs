//! Definition Manifest Loading
//!
//! Loads definition manifests (JSON or TOML) from the filesystem or from an
//! embedded directory and registers them into a [`DataSchema`].
//!
//! ```json
//! {
//!   "block":    [{ "model": "htmlSection", "view": "section", "modelSchema": { "inheritAllFrom": "$container" } }],
//!   "features": [{ "model": "paragraph", "view": "p" }],
//!   "inline":   [{ "model": "htmlSpan", "view": "span", "attributeProperties": { "copyOnEnter": true } }]
//! }
//! ```

use include_dir::{include_dir, Dir};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

use crate::definition::DataSchemaDefinition;
use crate::error::{DataSchemaError, Result};
use crate::registry::DataSchema;

/// Built-in HTML vocabulary, compiled into the binary
pub static BUILTIN_DEFINITIONS: Dir<'static> = include_dir!("$CARGO_MANIFEST_DIR/definitions");

/// A file of definitions to register
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefinitionManifest {
    #[serde(default)]
    pub block: Vec<DataSchemaDefinition>,
    #[serde(default)]
    pub features: Vec<DataSchemaDefinition>,
    #[serde(default)]
    pub inline: Vec<DataSchemaDefinition>,
}

impl DefinitionManifest {
    /// Parse a manifest, choosing the format from the file extension
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let invalid = |reason: String| DataSchemaError::InvalidManifest {
            path: path.to_path_buf(),
            reason,
        };

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(content).map_err(|e| invalid(e.to_string())),
            Some("toml") => toml::from_str(content).map_err(|e| invalid(e.to_string())),
            _ => Err(invalid("expected a .json or .toml file".to_string())),
        }
    }

    /// Total number of definitions in the manifest
    pub fn len(&self) -> usize {
        self.block.len() + self.features.len() + self.inline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register every definition: block, then features, then inline
    pub fn register_into(self, schema: &mut DataSchema) -> Result<usize> {
        let count = self.len();
        for definition in self.block {
            schema.register_block_element(definition)?;
        }
        for definition in self.features {
            schema.register_block_element_feature(definition)?;
        }
        for definition in self.inline {
            schema.register_inline_element(definition)?;
        }
        Ok(count)
    }
}

/// Configuration for manifest loading
#[derive(Debug, Clone)]
pub struct LoadConfig {
    /// Skip manifests matching these path prefixes
    pub skip_prefixes: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            skip_prefixes: vec![
                "target/".to_string(),
                ".git/".to_string(),
                "node_modules/".to_string(),
            ],
        }
    }
}

impl LoadConfig {
    fn skips(&self, relative: &Path) -> bool {
        let relative_str = relative.to_string_lossy();
        self.skip_prefixes.iter().any(|p| relative_str.starts_with(p))
    }
}

fn is_manifest(path: &Path) -> bool {
    matches!(path.extension().and_then(|e| e.to_str()), Some("json" | "toml"))
}

/// Load every manifest under a directory, in sorted path order
pub fn load_from_directory(dir: &Path, config: &LoadConfig, schema: &mut DataSchema) -> Result<usize> {
    let mut loaded = 0;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| DataSchemaError::Io(e.into()))?;
        let path = entry.path();
        if !path.is_file() || !is_manifest(path) {
            continue;
        }

        let relative = path.strip_prefix(dir).unwrap_or(path);
        if config.skips(relative) {
            continue;
        }

        let content = fs::read_to_string(path)?;
        let count = DefinitionManifest::parse(path, &content)?.register_into(schema)?;
        debug!(path = %path.display(), count, "Loaded definition manifest");
        loaded += count;
    }

    Ok(loaded)
}

/// Load every manifest in an embedded directory (compiled via include_dir!)
pub fn load_from_embedded(
    embedded_dir: &'static Dir<'static>,
    config: &LoadConfig,
    schema: &mut DataSchema,
) -> Result<usize> {
    let mut files: Vec<(&Path, &str)> = Vec::new();
    collect_embedded_files(embedded_dir, &mut files);
    files.sort_by(|a, b| a.0.cmp(b.0));

    let mut loaded = 0;
    for (path, content) in files {
        if !is_manifest(path) || config.skips(path) {
            continue;
        }
        let count = DefinitionManifest::parse(path, content)?.register_into(schema)?;
        debug!(path = %path.display(), count, "Loaded embedded definition manifest");
        loaded += count;
    }

    Ok(loaded)
}

fn collect_embedded_files<'a>(dir: &'a Dir<'static>, files: &mut Vec<(&'a Path, &'a str)>) {
    for file in dir.files() {
        if let Some(content) = file.contents_utf8() {
            files.push((file.path(), content));
        }
    }
    for subdir in dir.dirs() {
        collect_embedded_files(subdir, files);
    }
}

/// Register the built-in HTML vocabulary
pub fn load_builtins(schema: &mut DataSchema) -> Result<usize> {
    load_from_embedded(&BUILTIN_DEFINITIONS, &LoadConfig::default(), schema)
}
