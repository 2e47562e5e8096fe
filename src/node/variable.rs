//! Structural keys for quantified variables.
//!
//! A variable's restrictions mention the variable itself, so two otherwise
//! identical `every(x, Isa(x, Dog))` terms produce restriction nodes that
//! differ only in which variable they contain. The key replaces every
//! occurrence of the variable with a placeholder, making equal restriction
//! structures compare equal.

use std::collections::BTreeSet;

use crate::schema::CaseframeId;

use super::{NodeId, NodeStore, Quantifier};

/// The structure of a restriction with the owning variable abstracted away.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Shape {
    /// The variable being keyed.
    This,
    /// A node that does not mention the variable.
    Node(NodeId),
    Frame {
        caseframe: CaseframeId,
        bounds: Option<(usize, usize)>,
        slots: Vec<Vec<Shape>>,
    },
}

/// Identity of an `every`/`some` variable for interning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct VariableKey {
    pub quantifier: Quantifier,
    pub restrictions: Vec<Shape>,
    pub dependencies: BTreeSet<NodeId>,
}

impl VariableKey {
    pub fn new(
        store: &NodeStore,
        variable: NodeId,
        quantifier: Quantifier,
        restrictions: &BTreeSet<NodeId>,
        dependencies: &BTreeSet<NodeId>,
    ) -> Self {
        let mut shapes: Vec<Shape> = restrictions
            .iter()
            .map(|&r| shape(store, r, variable).0)
            .collect();
        shapes.sort();
        Self {
            quantifier,
            restrictions: shapes,
            dependencies: dependencies.clone(),
        }
    }
}

/// Shape of `node` relative to `variable`, and whether it mentions it.
fn shape(store: &NodeStore, node: NodeId, variable: NodeId) -> (Shape, bool) {
    if node == variable {
        return (Shape::This, true);
    }
    let Some(found) = store.get(node) else {
        return (Shape::Node(node), false);
    };
    let Some(frame) = found.frame() else {
        return (Shape::Node(node), false);
    };

    let mut mentions = false;
    let mut slots = Vec::with_capacity(frame.fillers.len());
    for set in &frame.fillers {
        let mut shapes = Vec::with_capacity(set.len());
        for &filler in set {
            let (s, m) = shape(store, filler, variable);
            mentions |= m;
            shapes.push(s);
        }
        shapes.sort();
        slots.push(shapes);
    }

    if mentions {
        let shaped = Shape::Frame {
            caseframe: frame.caseframe,
            bounds: found.bounds(),
            slots,
        };
        (shaped, true)
    } else {
        (Shape::Node(node), false)
    }
}
