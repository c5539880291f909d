//! Definition types and structures

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute behaviour metadata (e.g. `copyOnEnter`), stored verbatim
pub type AttributeProperties = Map<String, Value>;

/// Identity of a stored definition: `(model, view)`
pub type DefinitionKey = (String, Option<String>);

/// One model name or an ordered list of model names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelReference {
    Single(String),
    Many(Vec<String>),
}

impl ModelReference {
    /// Referenced model names in declared order
    pub fn names(&self) -> &[String] {
        match self {
            ModelReference::Single(name) => std::slice::from_ref(name),
            ModelReference::Many(names) => names,
        }
    }
}

impl From<&str> for ModelReference {
    fn from(name: &str) -> Self {
        ModelReference::Single(name.to_string())
    }
}

impl From<String> for ModelReference {
    fn from(name: String) -> Self {
        ModelReference::Single(name)
    }
}

impl From<Vec<String>> for ModelReference {
    fn from(names: Vec<String>) -> Self {
        ModelReference::Many(names)
    }
}

/// Kinds of `modelSchema` reference edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceKind {
    /// Full structural inheritance (children, attributes, content)
    InheritAllFrom,
    /// Type/category facts only
    InheritTypesFrom,
    /// May appear wherever the referenced model may appear
    AllowWhere,
    /// May contain whatever the referenced model may contain
    AllowContentOf,
    /// Accepts whatever attributes the referenced model accepts
    AllowAttributesOf,
}

impl ReferenceKind {
    /// All kinds, in the order resolution follows them
    pub const ALL: [ReferenceKind; 5] = [
        ReferenceKind::InheritAllFrom,
        ReferenceKind::InheritTypesFrom,
        ReferenceKind::AllowWhere,
        ReferenceKind::AllowContentOf,
        ReferenceKind::AllowAttributesOf,
    ];

    /// Field name as written in definition manifests
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::InheritAllFrom => "inheritAllFrom",
            ReferenceKind::InheritTypesFrom => "inheritTypesFrom",
            ReferenceKind::AllowWhere => "allowWhere",
            ReferenceKind::AllowContentOf => "allowContentOf",
            ReferenceKind::AllowAttributesOf => "allowAttributesOf",
        }
    }
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a model construct relates to other model constructs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSchema {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_all_from: Option<ModelReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inherit_types_from: Option<ModelReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_where: Option<ModelReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_content_of: Option<ModelReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_attributes_of: Option<ModelReference>,
}

impl ModelSchema {
    /// Get the reference field for a kind
    pub fn reference(&self, kind: ReferenceKind) -> Option<&ModelReference> {
        match kind {
            ReferenceKind::InheritAllFrom => self.inherit_all_from.as_ref(),
            ReferenceKind::InheritTypesFrom => self.inherit_types_from.as_ref(),
            ReferenceKind::AllowWhere => self.allow_where.as_ref(),
            ReferenceKind::AllowContentOf => self.allow_content_of.as_ref(),
            ReferenceKind::AllowAttributesOf => self.allow_attributes_of.as_ref(),
        }
    }

    /// Set the reference field for a kind
    pub fn set_reference(&mut self, kind: ReferenceKind, reference: impl Into<ModelReference>) {
        let slot = match kind {
            ReferenceKind::InheritAllFrom => &mut self.inherit_all_from,
            ReferenceKind::InheritTypesFrom => &mut self.inherit_types_from,
            ReferenceKind::AllowWhere => &mut self.allow_where,
            ReferenceKind::AllowContentOf => &mut self.allow_content_of,
            ReferenceKind::AllowAttributesOf => &mut self.allow_attributes_of,
        };
        *slot = Some(reference.into());
    }

    /// All `(kind, model name)` edges, in resolution order
    pub fn references(&self) -> impl Iterator<Item = (ReferenceKind, &str)> + '_ {
        ReferenceKind::ALL.into_iter().flat_map(move |kind| {
            self.reference(kind)
                .map(ModelReference::names)
                .unwrap_or_default()
                .iter()
                .map(move |name| (kind, name.as_str()))
        })
    }
}

/// A single view/model rule.
///
/// The `is_inline`, `is_block` and `is_feature` flags are applied by the
/// registration method used; values supplied by the caller are overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSchemaDefinition {
    /// Model construct name (e.g. "htmlSection", "paragraph")
    #[serde(default)]
    pub model: String,
    /// View element name (e.g. "section"); model-only definitions have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_inline: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_block: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_feature: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_properties: Option<AttributeProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_schema: Option<ModelSchema>,
    /// Model names permitted as children
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_children: Vec<String>,
}

impl DataSchemaDefinition {
    /// Create a definition mapping `view` to `model`
    pub fn new(model: impl Into<String>, view: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            view: Some(view.into()),
            ..Self::default()
        }
    }

    /// Create a definition with no view counterpart
    pub fn model_only(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    /// Add a `modelSchema` reference
    pub fn with_reference(mut self, kind: ReferenceKind, reference: impl Into<ModelReference>) -> Self {
        self.model_schema
            .get_or_insert_with(ModelSchema::default)
            .set_reference(kind, reference);
        self
    }

    /// Set the permitted children
    pub fn with_allow_children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_children = children.into_iter().map(Into::into).collect();
        self
    }

    /// Set one attribute property
    pub fn with_attribute_property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attribute_properties
            .get_or_insert_with(AttributeProperties::new)
            .insert(name.into(), value.into());
        self
    }

    /// Get the identity key for this definition
    pub fn key(&self) -> DefinitionKey {
        (self.model.clone(), self.view.clone())
    }

    /// All `modelSchema` reference edges, in resolution order
    pub fn references(&self) -> impl Iterator<Item = (ReferenceKind, &str)> + '_ {
        self.model_schema.iter().flat_map(|schema| schema.references())
    }
}

/// Whether a model name denotes a generic schema item such as `$block` or `$text`
pub fn is_generic_item(model: &str) -> bool {
    model.starts_with('$')
}
