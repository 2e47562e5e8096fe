//! Export types for serializing network state.
//!
//! These types provide human-readable, name-resolved representations of
//! nodes, caseframes and contexts suitable for JSON export. With the `dot`
//! feature the network can also be rendered as a Graphviz digraph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::network::Network;
use crate::node::{Node, NodeId, NodeKind};

/// Exported semantic type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeExport {
    pub name: String,
    pub parents: Vec<String>,
}

/// Exported caseframe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseframeExport {
    pub name: String,
    /// Semantic type of the caseframe's nodes.
    pub result_type: String,
    pub slots: Vec<String>,
    pub aliases: Vec<String>,
    /// Name of the dual caseframe, if any.
    pub dual: Option<String>,
}

/// One slot of a molecular node with its fillers resolved to names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillerExport {
    pub slot: String,
    pub fillers: Vec<String>,
}

/// Exported node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeExport {
    pub id: u32,
    pub name: String,
    pub sem_type: String,
    /// `base`, `variable`, `molecular` or `minmax`.
    pub kind: String,
    /// Caseframe name for molecular nodes.
    pub caseframe: Option<String>,
    pub fillers: Vec<FillerExport>,
    pub min: Option<usize>,
    pub max: Option<usize>,
    /// Restriction names for variable nodes.
    pub restrictions: Vec<String>,
    /// Dependency names for indefinite variables.
    pub dependencies: Vec<String>,
}

/// Exported context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextExport {
    pub name: String,
    pub parent: Option<String>,
    pub docstring: String,
    pub hyps: Vec<String>,
    pub ders: Vec<String>,
}

/// Snapshot of a whole network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkExport {
    pub types: Vec<TypeExport>,
    pub caseframes: Vec<CaseframeExport>,
    pub nodes: Vec<NodeExport>,
    pub contexts: Vec<ContextExport>,
    pub current_context: String,
}

impl NetworkExport {
    pub fn from_network(network: &Network) -> Self {
        let name_of = |id: NodeId| {
            network
                .node(id)
                .map_or_else(|| id.to_string(), |n: &Node| n.name.clone())
        };
        let names =
            |ids: &BTreeSet<NodeId>| -> Vec<String> { ids.iter().map(|&id| name_of(id)).collect() };

        let types = network
            .types()
            .iter()
            .map(|t| TypeExport {
                name: t.name.clone(),
                parents: t.parents.clone(),
            })
            .collect();

        let caseframes = network
            .caseframes()
            .iter()
            .map(|cf| CaseframeExport {
                name: cf.name.clone(),
                result_type: cf.result_type.clone(),
                slots: cf.slots.clone(),
                aliases: cf.aliases.iter().cloned().collect(),
                dual: cf.dual.map(|d| network.caseframes().get(d).name.clone()),
            })
            .collect();

        let nodes = network
            .nodes()
            .map(|node| {
                let mut export = NodeExport {
                    id: node.id.get(),
                    name: node.name.clone(),
                    sem_type: node.sem_type.clone(),
                    kind: node.kind.label().to_string(),
                    caseframe: None,
                    fillers: Vec::new(),
                    min: None,
                    max: None,
                    restrictions: Vec::new(),
                    dependencies: Vec::new(),
                };
                if let Some(frame) = node.frame() {
                    let cf = network.caseframes().get(frame.caseframe);
                    export.caseframe = Some(cf.name.clone());
                    export.fillers = cf
                        .slots
                        .iter()
                        .zip(&frame.fillers)
                        .map(|(slot, set)| FillerExport {
                            slot: slot.clone(),
                            fillers: names(set),
                        })
                        .collect();
                }
                if let Some((min, max)) = node.bounds() {
                    export.min = Some(min);
                    export.max = Some(max);
                }
                if let NodeKind::Variable(var) = &node.kind {
                    export.restrictions = names(&var.restrictions);
                    export.dependencies = names(&var.dependencies);
                }
                export
            })
            .collect();

        let contexts = network
            .contexts()
            .iter()
            .map(|ctx| ContextExport {
                name: ctx.name.clone(),
                parent: ctx.parent.clone(),
                docstring: ctx.docstring.clone(),
                hyps: names(ctx.hyps()),
                ders: names(ctx.ders()),
            })
            .collect();

        Self {
            types,
            caseframes,
            nodes,
            contexts,
            current_context: network.current_context().name.clone(),
        }
    }
}

/// Render the network as a Graphviz digraph.
///
/// Nodes asserted in the current context carry a trailing `!`. Edges run from
/// a molecular node to each filler and are labelled with the slot name;
/// edges of a one-filler `nor` are labelled `not`.
#[cfg(feature = "dot")]
pub fn to_dot(network: &Network) -> String {
    use std::collections::HashMap;

    use petgraph::dot::{Config, Dot};
    use petgraph::graph::{DiGraph, NodeIndex};

    let current = network.current_context();
    let mut graph: DiGraph<String, String> = DiGraph::new();
    let mut index: HashMap<NodeId, NodeIndex> = HashMap::new();

    for node in network.nodes() {
        let label = if current.is_asserted(node.id) {
            format!("{}!", node.name)
        } else {
            node.name.clone()
        };
        index.insert(node.id, graph.add_node(label));
    }

    for node in network.nodes() {
        let Some(frame) = node.frame() else { continue };
        let cf = network.caseframes().get(frame.caseframe);
        let negation = cf.name == "nor" && frame.fillers.iter().map(|s| s.len()).sum::<usize>() == 1;
        for (slot, set) in cf.slots.iter().zip(&frame.fillers) {
            let label = match (negation, node.bounds()) {
                (true, _) => "not".to_string(),
                (false, Some((min, max))) => format!("{slot} ({min}, {max})"),
                (false, None) => slot.clone(),
            };
            for filler in set {
                graph.add_edge(index[&node.id], index[filler], label.clone());
            }
        }
    }

    let body = format!("{}", Dot::with_config(&graph, &[Config::GraphContentOnly]));
    let mut out = String::from("digraph semnet {\n");
    for line in body.lines() {
        out.push_str("    ");
        out.push_str(line.trim_start());
        out.push('\n');
    }
    out.push_str("}\n");
    out
}
