//! Resolution results

use std::hash::{Hash, Hasher};

use indexmap::{Equivalent, IndexMap};
use serde::{Serialize, Serializer};

use crate::definition::DataSchemaDefinition;

/// Insertion-ordered, deduplicated set of resolved definitions.
///
/// Definitions are borrowed from the registry they were resolved from and
/// deduplicated by their `(model, view)` identity.
#[derive(Debug, Clone, Default)]
pub struct DefinitionSet<'a> {
    entries: IndexMap<(&'a str, Option<&'a str>), &'a DataSchemaDefinition>,
}

impl<'a> DefinitionSet<'a> {
    /// Add a definition; returns false if it was already present
    pub fn insert(&mut self, definition: &'a DataSchemaDefinition) -> bool {
        let key = (definition.model.as_str(), definition.view.as_deref());
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, definition);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate definitions in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &'a DataSchemaDefinition> + '_ {
        self.entries.values().copied()
    }

    /// Whether the set holds the definition for `model` and `view`
    pub fn contains(&self, model: &str, view: Option<&str>) -> bool {
        self.entries.contains_key(&KeyRef(model, view))
    }

    /// Whether any definition for `model` is in the set
    pub fn contains_model(&self, model: &str) -> bool {
        self.entries.keys().any(|(m, _)| *m == model)
    }

    /// Model names in discovery order (repeated when several views share a model)
    pub fn models(&self) -> Vec<&'a str> {
        self.entries.keys().map(|(model, _)| *model).collect()
    }

    /// Clone the definitions out of the registry
    pub fn to_vec(&self) -> Vec<DataSchemaDefinition> {
        self.iter().cloned().collect()
    }
}

/// Borrowed `(model, view)` lookup key, hashed like the stored tuple
struct KeyRef<'k>(&'k str, Option<&'k str>);

impl Hash for KeyRef<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
        self.1.hash(state);
    }
}

impl<'a> Equivalent<(&'a str, Option<&'a str>)> for KeyRef<'_> {
    fn equivalent(&self, key: &(&'a str, Option<&'a str>)) -> bool {
        self.0 == key.0 && self.1 == key.1
    }
}

impl<'a> IntoIterator for DefinitionSet<'a> {
    type Item = &'a DataSchemaDefinition;
    type IntoIter = indexmap::map::IntoValues<(&'a str, Option<&'a str>), &'a DataSchemaDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

impl Serialize for DefinitionSet<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries.values())
    }
}
