//! Content Data Schema
//!
//! A registry of view/model rules for a rich-text editor's content
//! compatibility layer. Each rule (a definition) maps an external view element
//! name to an internal model name and describes how that model relates to
//! others: what it inherits from, where it may appear, what it may contain.
//!
//! ## Features
//!
//! - **Inline, block and feature registration**: one definition shape, flags set by the entry point
//! - **View resolution**: by exact name or regular expression, optionally following references
//! - **Cycle-safe traversal**: every model is expanded at most once per resolution
//! - **Reference graph analysis**: cycles, dangling references, GraphViz export
//! - **Definition manifests**: JSON/TOML files plus an embedded HTML vocabulary
//!
//! ## Example
//!
//! ```
//! use content_dataschema::{DataSchema, DataSchemaDefinition, ReferenceKind, ViewPattern};
//!
//! let mut schema = DataSchema::new();
//! schema.register_block_element(
//!     DataSchemaDefinition::new("htmlSection", "section")
//!         .with_reference(ReferenceKind::InheritAllFrom, "$container"),
//! )?;
//! schema.register_block_element(
//!     DataSchemaDefinition::new("htmlArticle", "article")
//!         .with_reference(ReferenceKind::AllowWhere, "htmlSection"),
//! )?;
//!
//! let resolved = schema.definitions_for_view(Some(&ViewPattern::from("article")), true);
//! assert_eq!(resolved.models(), vec!["htmlSection", "htmlArticle"]);
//! # Ok::<(), content_dataschema::DataSchemaError>(())
//! ```

pub mod config;
pub mod definition;
pub mod definition_set;
pub mod error;
pub mod graph;
pub mod loader;
pub mod pattern;
pub mod registry;

pub use config::DataSchemaConfig;
pub use definition::{AttributeProperties, DataSchemaDefinition, ModelReference, ModelSchema, ReferenceKind};
pub use definition_set::DefinitionSet;
pub use error::{DataSchemaError, Result};
pub use graph::{LintWarning, ReferenceGraph, Severity};
pub use loader::{DefinitionManifest, LoadConfig};
pub use pattern::ViewPattern;
pub use registry::{DataSchema, RegistrationStats, SearchResult};
