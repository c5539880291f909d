//! Data Schema CLI
//!
//! Resolves view names against the registry, lints the reference graph and
//! exports it for inspection.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use content_dataschema::loader::{load_from_directory, LoadConfig};
use content_dataschema::{DataSchema, DataSchemaConfig, ReferenceGraph, Severity, ViewPattern};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dataschema")]
#[command(about = "Inspect view/model data schema definitions")]
struct Cli {
    /// Config file (defaults to dataschema.toml lookup)
    #[arg(short, long)]
    config: Option<String>,

    /// Directory of definition manifests (repeatable)
    #[arg(short, long)]
    definitions: Vec<PathBuf>,

    /// Do not load the built-in HTML vocabulary
    #[arg(long)]
    no_builtins: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the definitions for a view name
    Resolve {
        /// View name, or a regular expression with --regex
        view: String,
        /// Treat VIEW as a regular expression
        #[arg(long)]
        regex: bool,
        /// Follow modelSchema references
        #[arg(short, long)]
        references: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the definitions registered for a model name
    Model {
        model: String,
    },

    /// Lint the reference graph
    Lint,

    /// Export the reference graph to DOT
    Graph {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Fuzzy search view and model names
    Search {
        query: String,
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match DataSchemaConfig::load_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(cli, config) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn build_schema(cli: &Cli, config: &DataSchemaConfig) -> anyhow::Result<DataSchema> {
    let mut schema = if config.registry.builtins && !cli.no_builtins {
        DataSchema::with_builtins().context("loading built-in definitions")?
    } else {
        DataSchema::new()
    };

    let load_config = LoadConfig::default();
    for dir in config.definition_dirs().iter().chain(&cli.definitions) {
        let count = load_from_directory(dir, &load_config, &mut schema)
            .with_context(|| format!("loading definitions from {}", dir.display()))?;
        tracing::info!(dir = %dir.display(), count, "Loaded definitions");
    }

    Ok(schema)
}

fn run(cli: Cli, config: DataSchemaConfig) -> anyhow::Result<i32> {
    let schema = build_schema(&cli, &config)?;

    match cli.command {
        Commands::Resolve { view, regex, references, json } => {
            let pattern = if regex {
                ViewPattern::regex(&view)?
            } else {
                ViewPattern::exact(&view)
            };
            let include_references = references || config.resolution.include_references;
            let resolved = schema.definitions_for_view(Some(&pattern), include_references);

            if json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else if resolved.is_empty() {
                println!("No definitions for view {}", pattern);
                let suggestions = schema.search(&view, 5);
                if !suggestions.is_empty() {
                    println!("Did you mean:");
                    for s in suggestions {
                        println!("  {} ({})", s.view.as_deref().unwrap_or("-"), s.model);
                    }
                }
                return Ok(1);
            } else {
                println!("{:<20} {:<12} {:<8} {}", "MODEL", "VIEW", "KIND", "REFERENCES");
                for definition in resolved.iter() {
                    let kind = if definition.is_feature {
                        "feature"
                    } else if definition.is_inline {
                        "inline"
                    } else {
                        "block"
                    };
                    let refs: Vec<String> = definition
                        .references()
                        .map(|(kind, name)| format!("{}={}", kind, name))
                        .collect();
                    println!(
                        "{:<20} {:<12} {:<8} {}",
                        definition.model,
                        definition.view.as_deref().unwrap_or("-"),
                        kind,
                        refs.join(", ")
                    );
                }
            }
        }

        Commands::Model { model } => {
            let definitions = schema.definitions_for_model(&model);
            if definitions.is_empty() {
                println!("No definitions for model {}", model);
                return Ok(1);
            }
            println!("{}", serde_json::to_string_pretty(&definitions)?);
        }

        Commands::Lint => {
            let graph = ReferenceGraph::from_schema(&schema);
            let warnings = graph.lint();

            println!(
                "{} definitions, {} models, {} references",
                schema.len(),
                graph.node_count(),
                graph.edge_count()
            );
            for warning in &warnings {
                println!("[{:?}] {}: {}", warning.severity, warning.code, warning.message);
            }

            if warnings.iter().any(|w| w.severity == Severity::Error) {
                return Ok(1);
            }
            println!("No errors");
        }

        Commands::Graph { output } => {
            let dot = ReferenceGraph::from_schema(&schema).to_dot();
            match output {
                Some(path) => {
                    std::fs::write(&path, &dot)
                        .with_context(|| format!("writing {}", path.display()))?;
                    println!("Exported DOT to: {}", path.display());
                }
                None => print!("{}", dot),
            }
        }

        Commands::Search { query, limit } => {
            for result in schema.search(&query, limit) {
                println!(
                    "{:>5}  {:<12} {}",
                    result.score,
                    result.view.as_deref().unwrap_or("-"),
                    result.model
                );
            }
        }
    }

    Ok(0)
}
