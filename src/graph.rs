//! Reference Graph
//!
//! Directed graph of `modelSchema` references between model names, built from
//! a [`DataSchema`]. Resolution itself walks the registry indexes directly;
//! this graph is for analysis: cycles (SCCs), dangling references, dependents,
//! lint output and GraphViz export.

use petgraph::algo::kosaraju_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::definition::{is_generic_item, ReferenceKind};
use crate::registry::DataSchema;

/// How a model name is registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    Inline,
    Block,
    Feature,
    /// `$`-prefixed schema item such as `$block`
    Generic,
    /// Referenced but never registered
    Unregistered,
}

/// A reference whose target model is not registered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingReference {
    pub from: String,
    pub to: String,
    pub kind: ReferenceKind,
}

/// Node in a closure result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosureNode {
    pub model: String,
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Lint finding
#[derive(Debug, Clone, Serialize)]
pub struct LintWarning {
    pub code: &'static str,
    pub message: String,
    pub severity: Severity,
}

/// The model reference graph
pub struct ReferenceGraph {
    graph: DiGraph<String, ReferenceKind>,
    node_indices: HashMap<String, NodeIndex>,
    roles: HashMap<String, NodeRole>,
    /// `(parent model, child model)` pairs from `allowChildren`
    allowed_children: Vec<(String, String)>,
    /// Reference cycles: SCCs with more than one member, or self-references
    cycles: Vec<Vec<String>>,
}

impl ReferenceGraph {
    /// Build the graph from the current registry contents
    pub fn from_schema(schema: &DataSchema) -> Self {
        let mut graph = DiGraph::with_capacity(schema.len(), schema.len() * 2);
        let mut node_indices: HashMap<String, NodeIndex> = HashMap::with_capacity(schema.len());
        let mut roles = HashMap::with_capacity(schema.len());
        let mut allowed_children = Vec::new();

        let mut node = |graph: &mut DiGraph<String, ReferenceKind>, name: &str| -> NodeIndex {
            *node_indices
                .entry(name.to_string())
                .or_insert_with(|| graph.add_node(name.to_string()))
        };

        for definition in schema.definitions() {
            let role = if definition.is_feature {
                NodeRole::Feature
            } else if definition.is_inline {
                NodeRole::Inline
            } else {
                NodeRole::Block
            };
            roles.entry(definition.model.clone()).or_insert(role);

            let from = node(&mut graph, &definition.model);
            for (kind, target) in definition.references() {
                let to = node(&mut graph, target);
                graph.add_edge(from, to, kind);
            }
            for child in &definition.allow_children {
                allowed_children.push((definition.model.clone(), child.clone()));
            }
        }

        for name in node_indices.keys() {
            if !roles.contains_key(name) {
                let role = if is_generic_item(name) {
                    NodeRole::Generic
                } else {
                    NodeRole::Unregistered
                };
                roles.insert(name.clone(), role);
            }
        }

        let cycles = kosaraju_scc(&graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.find_edge(scc[0], scc[0]).is_some())
            .map(|scc| {
                let mut names: Vec<String> = scc
                    .into_iter()
                    .filter_map(|idx| graph.node_weight(idx).cloned())
                    .collect();
                names.sort();
                names
            })
            .collect();

        Self {
            graph,
            node_indices,
            roles,
            allowed_children,
            cycles,
        }
    }

    /// Number of model names (registered or referenced)
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of reference edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Role of a model name, if it appears in the graph
    pub fn role(&self, model: &str) -> Option<NodeRole> {
        self.roles.get(model).copied()
    }

    /// Reference cycles
    pub fn cycles(&self) -> &[Vec<String>] {
        &self.cycles
    }

    /// Immediate outgoing references
    pub fn references_out(&self, model: &str) -> Vec<(&str, ReferenceKind)> {
        let Some(&node_idx) = self.node_indices.get(model) else {
            return Vec::new();
        };

        let mut refs: Vec<_> = self
            .graph
            .edges_directed(node_idx, Direction::Outgoing)
            .filter_map(|e| {
                self.graph
                    .node_weight(e.target())
                    .map(|name| (name.as_str(), *e.weight()))
            })
            .collect();
        // petgraph yields the most recently added edge first
        refs.reverse();
        refs
    }

    /// Models that reference `model`, directly or transitively
    pub fn dependents(&self, model: &str) -> Vec<ClosureNode> {
        let Some(&start_idx) = self.node_indices.get(model) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(start_idx, 0usize)];

        while let Some((node_idx, depth)) = stack.pop() {
            if !visited.insert(node_idx) {
                continue;
            }

            if node_idx != start_idx {
                if let Some(name) = self.graph.node_weight(node_idx) {
                    result.push(ClosureNode {
                        model: name.clone(),
                        depth,
                    });
                }
            }

            for edge in self.graph.edges_directed(node_idx, Direction::Incoming) {
                stack.push((edge.source(), depth + 1));
            }
        }

        result.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.model.cmp(&b.model)));
        result
    }

    /// References to model names that are neither registered nor generic
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut dangling: Vec<_> = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let to = self.graph.node_weight(edge.target())?;
                if self.role(to) != Some(NodeRole::Unregistered) {
                    return None;
                }
                let from = self.graph.node_weight(edge.source())?;
                Some(DanglingReference {
                    from: from.clone(),
                    to: to.clone(),
                    kind: *edge.weight(),
                })
            })
            .collect();
        dangling.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        dangling
    }

    /// Lint the registry: cycles, dangling references, unknown children
    pub fn lint(&self) -> Vec<LintWarning> {
        let mut warnings = Vec::new();

        for cycle in &self.cycles {
            if let [model] = cycle.as_slice() {
                warnings.push(LintWarning {
                    code: "SELF_REFERENCE",
                    message: format!("'{}' references itself; the reference is ignored", model),
                    severity: Severity::Info,
                });
                continue;
            }
            warnings.push(LintWarning {
                code: "REFERENCE_CYCLE",
                message: format!("Models reference each other in a cycle: {}", cycle.join(" -> ")),
                severity: Severity::Warning,
            });
        }

        for dangling in self.dangling_references() {
            warnings.push(LintWarning {
                code: "DANGLING_REFERENCE",
                message: format!(
                    "'{}' {} '{}', which is not registered",
                    dangling.from, dangling.kind, dangling.to
                ),
                severity: Severity::Error,
            });
        }

        for (parent, child) in &self.allowed_children {
            let registered = matches!(self.role(child), Some(role) if role != NodeRole::Unregistered);
            if is_generic_item(child) || registered {
                continue;
            }
            warnings.push(LintWarning {
                code: "UNKNOWN_CHILD",
                message: format!("'{}' allows child '{}', which is not registered", parent, child),
                severity: Severity::Warning,
            });
        }

        warnings
    }

    /// Export the reference graph to GraphViz DOT format
    pub fn to_dot(&self) -> String {
        let mut output = String::new();

        output.push_str("digraph DataSchema {\n");
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box, style=\"filled,rounded\", fontname=\"Helvetica\", fontsize=10];\n");
        output.push_str("  edge [fontname=\"Helvetica\", fontsize=8, fontcolor=\"#808080\"];\n");
        output.push('\n');

        let mut names: Vec<&String> = self.node_indices.keys().collect();
        names.sort();

        for name in names {
            let color = match self.role(name) {
                Some(NodeRole::Inline) => "#4CAF50",
                Some(NodeRole::Block) => "#2196F3",
                Some(NodeRole::Feature) => "#FF9800",
                Some(NodeRole::Unregistered) => "#F44336",
                Some(NodeRole::Generic) | None => "#9E9E9E",
            };
            output.push_str(&format!("  \"{}\" [fillcolor=\"{}\"];\n", dot_escape(name), color));
        }

        output.push('\n');

        for edge in self.graph.edge_references() {
            if let (Some(source), Some(target)) = (
                self.graph.node_weight(edge.source()),
                self.graph.node_weight(edge.target()),
            ) {
                output.push_str(&format!(
                    "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    dot_escape(source),
                    dot_escape(target),
                    edge.weight()
                ));
            }
        }

        output.push_str("}\n");
        output
    }
}

/// Escape a name for use inside a quoted DOT identifier
fn dot_escape(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}
