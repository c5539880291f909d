//! Data Schema Registry
//!
//! Stores inline and block element definitions, indexes them by view and model
//! name, and resolves a view name to the definitions needed to describe it,
//! optionally following `modelSchema` references transitively.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::definition::{DataSchemaDefinition, DefinitionKey};
use crate::definition_set::DefinitionSet;
use crate::error::{DataSchemaError, Result};
use crate::pattern::ViewPattern;

/// Counters for registration calls that stored a definition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationStats {
    pub inline: usize,
    pub block: usize,
    pub features: usize,
    /// Registrations that replaced an existing `(model, view)` definition
    pub replaced: usize,
}

/// Fuzzy search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    pub score: i64,
}

/// The data schema registry
#[derive(Debug, Clone, Default)]
pub struct DataSchema {
    /// All definitions in registration order, keyed by `(model, view)`
    definitions: IndexMap<DefinitionKey, DataSchemaDefinition>,
    /// Index: model name -> positions in `definitions`
    by_model: HashMap<String, Vec<usize>>,
    /// Index: exact view name -> positions in `definitions`
    by_view: HashMap<String, Vec<usize>>,
    stats: RegistrationStats,
}

enum Step<'a> {
    Visit(&'a str),
    Emit(&'a str),
}

impl DataSchema {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with the built-in HTML vocabulary
    pub fn with_builtins() -> Result<Self> {
        let mut schema = Self::new();
        crate::loader::load_builtins(&mut schema)?;
        Ok(schema)
    }

    /// Register an inline element definition
    pub fn register_inline_element(&mut self, mut definition: DataSchemaDefinition) -> Result<()> {
        definition.is_inline = true;
        definition.is_block = false;
        definition.is_feature = false;
        self.insert(definition)?;
        self.stats.inline += 1;
        Ok(())
    }

    /// Register a block element definition
    pub fn register_block_element(&mut self, definition: DataSchemaDefinition) -> Result<()> {
        self.insert_block(definition, false)
    }

    /// Register a block element definition backing an editor feature
    pub fn register_block_element_feature(&mut self, definition: DataSchemaDefinition) -> Result<()> {
        self.insert_block(definition, true)?;
        self.stats.features += 1;
        Ok(())
    }

    fn insert_block(&mut self, mut definition: DataSchemaDefinition, is_feature: bool) -> Result<()> {
        definition.is_block = true;
        definition.is_inline = false;
        definition.is_feature = is_feature;
        self.insert(definition)?;
        self.stats.block += 1;
        Ok(())
    }

    fn insert(&mut self, definition: DataSchemaDefinition) -> Result<()> {
        if definition.model.is_empty() {
            warn!(view = ?definition.view, "Rejected definition without a model name");
            return Err(DataSchemaError::MissingModel { view: definition.view });
        }

        let key = definition.key();
        if let Some(existing) = self.definitions.get_mut(&key) {
            warn!(model = %definition.model, view = ?definition.view, "Replacing existing definition");
            *existing = definition;
            self.stats.replaced += 1;
            return Ok(());
        }

        debug!(
            model = %definition.model,
            view = ?definition.view,
            inline = definition.is_inline,
            feature = definition.is_feature,
            "Registered definition"
        );

        let (model, view) = key.clone();
        let (index, _) = self.definitions.insert_full(key, definition);
        self.by_model.entry(model).or_default().push(index);
        if let Some(view) = view {
            self.by_view.entry(view).or_default().push(index);
        }
        Ok(())
    }

    /// Resolve the definitions describing a view name.
    ///
    /// `None` stands for an absent or unusable lookup key and yields an empty
    /// set. Matched definitions are emitted in registration order; with
    /// `include_references`, each one is preceded by the definitions it
    /// references (depth first, referenced models before their dependents).
    pub fn definitions_for_view(
        &self,
        view: Option<&ViewPattern>,
        include_references: bool,
    ) -> DefinitionSet<'_> {
        let mut result = DefinitionSet::default();
        let Some(pattern) = view else {
            return result;
        };

        let mut visited = HashSet::new();
        let matched = self
            .matching_views(pattern)
            .into_iter()
            .filter_map(|index| self.definitions.get_index(index).map(|(_, d)| d));

        for definition in matched {
            if include_references {
                self.collect_references(definition, &mut visited, &mut result);
            }
            result.insert(definition);
        }

        debug!(
            view = %pattern,
            include_references,
            resolved = result.len(),
            "Resolved view definitions"
        );
        result
    }

    /// Positions of definitions whose view matches, in registration order
    fn matching_views(&self, pattern: &ViewPattern) -> Vec<usize> {
        match pattern.as_exact() {
            Some(name) => self.by_view.get(name).cloned().unwrap_or_default(),
            None => self
                .definitions
                .values()
                .enumerate()
                .filter(|(_, definition)| {
                    definition
                        .view
                        .as_deref()
                        .is_some_and(|view| pattern.matches(view))
                })
                .map(|(index, _)| index)
                .collect(),
        }
    }

    /// Emit the reference closure of a matched definition into `out`, post-order.
    ///
    /// The walk starts from the definition's own references. Models reached
    /// through a reference contribute every definition registered for them,
    /// and each is expanded at most once per resolution; unregistered targets
    /// (including generic items such as `$block`) are skipped.
    fn collect_references<'a>(
        &'a self,
        definition: &'a DataSchemaDefinition,
        visited: &mut HashSet<&'a str>,
        out: &mut DefinitionSet<'a>,
    ) {
        let model = definition.model.as_str();
        // Held while walking so a cycle back to the matched model stops here
        let seeded = visited.insert(model);

        let mut stack: Vec<Step<'a>> = definition
            .references()
            .map(|(_, name)| name)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .map(Step::Visit)
            .collect();

        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(name) => {
                    if !self.by_model.contains_key(name) || !visited.insert(name) {
                        continue;
                    }
                    stack.push(Step::Emit(name));
                    stack.extend(self.references_of(name).into_iter().rev().map(Step::Visit));
                }
                Step::Emit(name) => {
                    for definition in self.definitions_for_model(name) {
                        out.insert(definition);
                    }
                }
            }
        }

        if seeded {
            visited.remove(model);
        }
    }

    /// Referenced model names across all definitions of `model`
    fn references_of<'a>(&'a self, model: &str) -> Vec<&'a str> {
        self.definitions_for_model(model)
            .into_iter()
            .flat_map(|definition| definition.references().map(|(_, name)| name))
            .collect()
    }

    /// All definitions registered for a model name, in registration order
    pub fn definitions_for_model(&self, model: &str) -> Vec<&DataSchemaDefinition> {
        self.by_model
            .get(model)
            .map(|indices| {
                indices
                    .iter()
                    .filter_map(|&index| self.definitions.get_index(index).map(|(_, d)| d))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether any definition is registered for a model name
    pub fn contains_model(&self, model: &str) -> bool {
        self.by_model.contains_key(model)
    }

    /// All definitions in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &DataSchemaDefinition> {
        self.definitions.values()
    }

    /// Number of stored definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registration counters
    pub fn stats(&self) -> RegistrationStats {
        self.stats
    }

    /// Search definitions by view or model name (fuzzy)
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchResult> {
        use fuzzy_matcher::skim::SkimMatcherV2;
        use fuzzy_matcher::FuzzyMatcher;

        let matcher = SkimMatcherV2::default();
        let mut results: Vec<(i64, &DataSchemaDefinition)> = Vec::new();

        for definition in self.definitions.values() {
            let view_score = definition
                .view
                .as_deref()
                .and_then(|view| matcher.fuzzy_match(view, query));
            let model_score = matcher.fuzzy_match(&definition.model, query);

            if let Some(score) = view_score.max(model_score) {
                results.push((score, definition));
            }
        }

        // Sort by score descending, registration order breaks ties
        results.sort_by(|a, b| b.0.cmp(&a.0));

        results
            .into_iter()
            .take(limit)
            .map(|(score, definition)| SearchResult {
                model: definition.model.clone(),
                view: definition.view.clone(),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::ReferenceKind;

    #[test]
    fn test_missing_model_rejected() {
        let mut schema = DataSchema::new();
        let result = schema.register_block_element(DataSchemaDefinition {
            view: Some("div".to_string()),
            ..Default::default()
        });

        assert!(matches!(result, Err(DataSchemaError::MissingModel { .. })));
        assert!(schema.is_empty());
        assert_eq!(schema.stats(), RegistrationStats::default());
    }

    #[test]
    fn test_same_key_replaces_in_place() {
        let mut schema = DataSchema::new();
        schema.register_block_element(DataSchemaDefinition::new("htmlA", "a")).unwrap();
        schema.register_block_element(DataSchemaDefinition::new("htmlB", "b")).unwrap();
        schema
            .register_inline_element(DataSchemaDefinition::new("htmlA", "a"))
            .unwrap();

        assert_eq!(schema.len(), 2);
        assert_eq!(schema.stats().replaced, 1);

        let first = schema.definitions().next().unwrap();
        assert_eq!(first.model, "htmlA");
        assert!(first.is_inline);
        assert!(!first.is_block);

        let result = schema.definitions_for_view(Some(&"a".into()), false);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_shared_model_across_views() {
        let mut schema = DataSchema::new();
        schema.register_block_element(DataSchemaDefinition::new("tableCell", "td")).unwrap();
        schema.register_block_element(DataSchemaDefinition::new("tableCell", "th")).unwrap();

        assert_eq!(schema.definitions_for_model("tableCell").len(), 2);
        assert_eq!(schema.definitions_for_view(Some(&"th".into()), false).len(), 1);
    }

    #[test]
    fn test_reference_to_shared_model_emits_every_view() {
        let mut schema = DataSchema::new();
        schema.register_block_element(DataSchemaDefinition::new("caption", "caption")).unwrap();
        schema.register_block_element(DataSchemaDefinition::new("caption", "figcaption")).unwrap();
        schema
            .register_block_element(
                DataSchemaDefinition::new("htmlLegend", "legend")
                    .with_reference(ReferenceKind::InheritAllFrom, "caption"),
            )
            .unwrap();

        let result = schema.definitions_for_view(Some(&"legend".into()), true);
        let views: Vec<_> = result.iter().map(|d| d.view.as_deref().unwrap()).collect();
        assert_eq!(views, vec!["caption", "figcaption", "legend"]);
    }

    #[test]
    fn test_matched_definition_expands_only_its_own_references() {
        let mut schema = DataSchema::new();
        schema.register_block_element(DataSchemaDefinition::new("htmlX", "x")).unwrap();
        schema
            .register_block_element(
                DataSchemaDefinition::new("tableCell", "td").with_reference(ReferenceKind::AllowWhere, "htmlX"),
            )
            .unwrap();
        schema.register_block_element(DataSchemaDefinition::new("tableCell", "th")).unwrap();

        let th = schema.definitions_for_view(Some(&"th".into()), true);
        assert_eq!(th.models(), vec!["tableCell"]);

        let td = schema.definitions_for_view(Some(&"td".into()), true);
        assert_eq!(td.models(), vec!["htmlX", "tableCell"]);

        let both = schema.definitions_for_view(Some(&ViewPattern::regex("^t[dh]$").unwrap()), true);
        let views: Vec<_> = both.iter().map(|d| d.view.as_deref().unwrap()).collect();
        assert_eq!(views, vec!["x", "td", "th"]);
    }

    #[test]
    fn test_registration_overwrites_caller_flags() {
        let mut schema = DataSchema::new();
        schema
            .register_inline_element(DataSchemaDefinition {
                is_block: true,
                is_feature: true,
                ..DataSchemaDefinition::new("htmlSpan", "span")
            })
            .unwrap();
        schema
            .register_block_element(DataSchemaDefinition {
                is_inline: true,
                is_feature: true,
                ..DataSchemaDefinition::new("htmlDiv", "div")
            })
            .unwrap();

        let span = schema.definitions_for_model("htmlSpan")[0];
        assert!(span.is_inline && !span.is_block && !span.is_feature);

        let div = schema.definitions_for_model("htmlDiv")[0];
        assert!(div.is_block && !div.is_inline && !div.is_feature);
        assert_eq!(schema.stats().features, 0);
    }

    #[test]
    fn test_model_only_definition_never_matches_view() {
        let mut schema = DataSchema::new();
        schema.register_block_element(DataSchemaDefinition::model_only("htmlBase")).unwrap();

        let pattern = ViewPattern::regex(".*").unwrap();
        assert!(schema.definitions_for_view(Some(&pattern), false).is_empty());
        assert!(schema.contains_model("htmlBase"));
    }

    #[test]
    fn test_model_only_definition_reachable_by_reference() {
        let mut schema = DataSchema::new();
        schema.register_block_element(DataSchemaDefinition::model_only("htmlBase")).unwrap();
        schema
            .register_block_element(
                DataSchemaDefinition::new("htmlChild", "child")
                    .with_reference(ReferenceKind::AllowContentOf, "htmlBase"),
            )
            .unwrap();

        let result = schema.definitions_for_view(Some(&"child".into()), true);
        assert_eq!(result.models(), vec!["htmlBase", "htmlChild"]);
    }

    #[test]
    fn test_search_prefers_closer_names() {
        let mut schema = DataSchema::new();
        schema.register_block_element(DataSchemaDefinition::new("htmlSection", "section")).unwrap();
        schema.register_inline_element(DataSchemaDefinition::new("htmlSpan", "span")).unwrap();

        let results = schema.search("section", 5);
        assert_eq!(results[0].model, "htmlSection");
        assert!(schema.search("zzzz", 5).is_empty());
    }
}
