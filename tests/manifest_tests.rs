//! Definition manifests, built-in vocabulary and reference graph tests

use std::fs;

use content_dataschema::loader::{load_from_directory, LoadConfig};
use content_dataschema::{DataSchema, ReferenceGraph, Severity, ViewPattern};

fn models(schema: &DataSchema, view: &str, include_references: bool) -> Vec<String> {
    schema
        .definitions_for_view(Some(&ViewPattern::from(view)), include_references)
        .iter()
        .map(|d| d.model.clone())
        .collect()
}

// =============================================================================
// Built-in vocabulary
// =============================================================================

#[test]
fn test_builtins_register_compatibility_then_feature() {
    let schema = DataSchema::with_builtins().unwrap();

    assert_eq!(models(&schema, "p", false), vec!["htmlP", "paragraph"]);

    let resolved = schema.definitions_for_view(Some(&ViewPattern::from("p")), false);
    let feature = resolved.iter().find(|d| d.model == "paragraph").unwrap();
    assert!(feature.is_block && feature.is_feature);
}

#[test]
fn test_builtins_share_models_across_views() {
    let schema = DataSchema::with_builtins().unwrap();

    assert_eq!(schema.definitions_for_model("tableCell").len(), 2);
    assert_eq!(models(&schema, "th", false), vec!["htmlTh", "tableCell"]);
}

#[test]
fn test_builtins_follow_references() {
    let schema = DataSchema::with_builtins().unwrap();

    assert_eq!(models(&schema, "menu", true), vec!["htmlUl", "htmlMenu"]);
    assert_eq!(models(&schema, "center", true), vec!["htmlDiv", "htmlCenter"]);
}

#[test]
fn test_builtins_inline_copy_on_enter() {
    let schema = DataSchema::with_builtins().unwrap();
    let resolved = schema.definitions_for_view(Some(&ViewPattern::from("span")), false);

    let span = resolved.iter().next().unwrap();
    assert!(span.is_inline);
    assert_eq!(
        span.attribute_properties.as_ref().unwrap()["copyOnEnter"],
        serde_json::Value::Bool(true)
    );
}

#[test]
fn test_builtins_headings_by_regex() {
    let schema = DataSchema::with_builtins().unwrap();
    let pattern = ViewPattern::regex("^h[1-6]$").unwrap();

    let resolved = schema.definitions_for_view(Some(&pattern), false);

    // six compatibility headings plus heading1..heading3 features (h2..h4)
    assert_eq!(resolved.len(), 9);
    assert!(resolved.contains("heading1", Some("h2")));
}

#[test]
fn test_builtins_lint_clean() {
    let schema = DataSchema::with_builtins().unwrap();
    let graph = ReferenceGraph::from_schema(&schema);

    assert!(graph.cycles().is_empty());
    assert!(graph.dangling_references().is_empty());
    assert!(graph.lint().iter().all(|w| w.severity != Severity::Error));
}

#[test]
fn test_builtins_dependents() {
    let schema = DataSchema::with_builtins().unwrap();
    let graph = ReferenceGraph::from_schema(&schema);

    let dependents: Vec<_> = graph.dependents("htmlUl").into_iter().map(|n| n.model).collect();
    assert_eq!(dependents, vec!["htmlDir", "htmlMenu"]);
}

// =============================================================================
// Directory loading
// =============================================================================

#[test]
fn test_load_from_directory_in_path_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("b_table.toml"),
        r#"
[[block]]
model = "htmlCustomRow"
view = "custom-row"
modelSchema = { allowWhere = "htmlCustomTable" }
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("a_base.json"),
        r#"{ "block": [{ "model": "htmlCustomTable", "view": "custom-table", "modelSchema": { "allowWhere": "$block" } }] }"#,
    )
    .unwrap();
    fs::write(dir.path().join("README.md"), "not a manifest").unwrap();

    let mut schema = DataSchema::new();
    let count = load_from_directory(dir.path(), &LoadConfig::default(), &mut schema).unwrap();

    assert_eq!(count, 2);
    let ordered: Vec<_> = schema.definitions().map(|d| d.model.as_str()).collect();
    assert_eq!(ordered, vec!["htmlCustomTable", "htmlCustomRow"]);
    assert_eq!(
        models(&schema, "custom-row", true),
        vec!["htmlCustomTable", "htmlCustomRow"]
    );
}

#[test]
fn test_load_skips_configured_prefixes() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("target")).unwrap();
    fs::write(
        dir.path().join("target/stale.json"),
        r#"{ "inline": [{ "model": "htmlStale", "view": "stale" }] }"#,
    )
    .unwrap();

    let mut schema = DataSchema::new();
    let count = load_from_directory(dir.path(), &LoadConfig::default(), &mut schema).unwrap();

    assert_eq!(count, 0);
    assert!(schema.is_empty());
}

#[test]
fn test_load_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("no-such-definitions");

    let mut schema = DataSchema::new();
    let result = load_from_directory(&missing, &LoadConfig::default(), &mut schema);

    assert!(matches!(result, Err(content_dataschema::DataSchemaError::Io(_))));
    assert!(schema.is_empty());
}

#[test]
fn test_load_rejects_definition_without_model() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("bad.json"), r#"{ "block": [{ "view": "orphan" }] }"#).unwrap();

    let mut schema = DataSchema::new();
    let result = load_from_directory(dir.path(), &LoadConfig::default(), &mut schema);

    assert!(matches!(
        result,
        Err(content_dataschema::DataSchemaError::MissingModel { .. })
    ));
}

#[test]
fn test_overlay_replaces_builtin_definition() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("override.json"),
        r#"{ "block": [{ "model": "htmlSection", "view": "section", "modelSchema": { "inheritAllFrom": "htmlArticle" } }] }"#,
    )
    .unwrap();

    let mut schema = DataSchema::with_builtins().unwrap();
    let before = schema.len();
    load_from_directory(dir.path(), &LoadConfig::default(), &mut schema).unwrap();

    assert_eq!(schema.len(), before);
    assert_eq!(schema.stats().replaced, 1);
    assert_eq!(models(&schema, "section", true), vec!["htmlArticle", "htmlSection"]);
}
