//! Nodes of the semantic network and the canonicalizing node store.
//!
//! Every term is a [`Node`] identified by a [`NodeId`]:
//!
//! - **Base** nodes are atomic individuals, categories and actions
//! - **Variable** nodes are atomic quantified terms (`every`, `some`, `?q`)
//! - **Molecular** nodes instantiate a caseframe with one filler set per slot
//! - **MinMaxOp** nodes are molecular logical connectives carrying min/max bounds
//!
//! Molecular nodes are hash-consed by the [`NodeStore`]: the same caseframe
//! with the same filler sets always yields the same node.

pub mod adjust;
pub mod store;
pub mod variable;

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;

pub use adjust::Polarity;
pub use store::{Adjusted, Mark, NodeStore};

use crate::schema::CaseframeId;

/// Unique, niche-optimized identifier for a node.
///
/// Ids are dense and allocated in creation order starting from 1, so sorting
/// by id sorts by age.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NodeId(NonZeroU32);

impl NodeId {
    /// Create a `NodeId` from a raw value. Returns `None` for zero.
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(NodeId)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    pub(crate) fn index(self) -> usize {
        self.0.get() as usize - 1
    }

    pub(crate) fn from_index(index: usize) -> Self {
        // Dense ids: index + 1 is never zero and the store caps its length at u32::MAX.
        NodeId(NonZeroU32::MIN.saturating_add(index as u32))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node:{}", self.0)
    }
}

/// How a variable node is quantified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantifier {
    /// `every`: an arbitrary individual satisfying the restrictions.
    Arbitrary,
    /// `some`: an indefinite individual, possibly dependent on other variables.
    Indefinite,
    /// `?q`: a query variable, identified by name.
    Query,
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arbitrary => write!(f, "arbitrary"),
            Self::Indefinite => write!(f, "indefinite"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// A quantified atomic term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub quantifier: Quantifier,
    /// Propositions constraining the variable, each mentioning it.
    pub restrictions: BTreeSet<NodeId>,
    /// Variables an indefinite depends on.
    pub dependencies: BTreeSet<NodeId>,
}

/// A caseframe instance: one filler set per slot, in caseframe slot order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame {
    pub caseframe: CaseframeId,
    pub fillers: Vec<BTreeSet<NodeId>>,
}

impl Frame {
    /// Whether `node` fills any slot of this frame.
    pub fn mentions(&self, node: NodeId) -> bool {
        self.fillers.iter().any(|set| set.contains(&node))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Base,
    Variable(Variable),
    Molecular(Frame),
    MinMaxOp { frame: Frame, min: usize, max: usize },
}

impl NodeKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Variable(_) => "variable",
            Self::Molecular(_) => "molecular",
            Self::MinMaxOp { .. } => "minmax",
        }
    }
}

/// A node of the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Term text for base nodes; generated (`wft3`, `arb1`, `ind2`) otherwise.
    pub name: String,
    /// Semantic type; may be refined to a subtype when the node fills a slot.
    pub sem_type: String,
    pub kind: NodeKind,
}

impl Node {
    /// Base and variable nodes are atomic.
    pub fn is_atomic(&self) -> bool {
        matches!(self.kind, NodeKind::Base | NodeKind::Variable(_))
    }

    pub fn is_molecular(&self) -> bool {
        !self.is_atomic()
    }

    pub fn frame(&self) -> Option<&Frame> {
        match &self.kind {
            NodeKind::Molecular(frame) | NodeKind::MinMaxOp { frame, .. } => Some(frame),
            _ => None,
        }
    }

    pub fn caseframe(&self) -> Option<CaseframeId> {
        self.frame().map(|f| f.caseframe)
    }

    /// The min/max bounds of a connective node.
    pub fn bounds(&self) -> Option<(usize, usize)> {
        match self.kind {
            NodeKind::MinMaxOp { min, max, .. } => Some((min, max)),
            _ => None,
        }
    }

    pub fn variable(&self) -> Option<&Variable> {
        match &self.kind {
            NodeKind::Variable(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_niche_optimized() {
        assert_eq!(
            std::mem::size_of::<Option<NodeId>>(),
            std::mem::size_of::<NodeId>()
        );
        assert!(NodeId::new(0).is_none());
    }

    #[test]
    fn index_round_trip() {
        let id = NodeId::from_index(6);
        assert_eq!(id.get(), 7);
        assert_eq!(id.index(), 6);
        assert_eq!(id.to_string(), "node:7");
    }
}
