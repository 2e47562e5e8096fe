//! The node store: creation, hash-consing and transactional rollback.
//!
//! Molecular nodes are interned by a structural key (caseframe, bounds, and
//! one sorted filler set per slot), so the same structure always maps to the
//! same [`NodeId`] regardless of the order fillers were supplied in.
//! Quantified variables are interned by the shape of their restrictions.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{CardinalityError, NetResult, SchemaError, TypeConstraintError};
use crate::schema::{CaseframeId, Schema, ROOT_TYPE};

use super::adjust::{self, Outcome, Polarity, Request};
use super::variable::VariableKey;
use super::{Frame, Node, NodeId, NodeKind, Quantifier, Variable};

static GENERATED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(wft|arb|ind)[0-9]+$").expect("static regex"));

/// Whether `name` is in the namespace of generated node names.
pub fn is_generated_name(name: &str) -> bool {
    GENERATED_NAME.is_match(name)
}

/// Result of building a term in some polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adjusted {
    pub node: NodeId,
    /// `true` when `node` already denotes the negation of the requested term.
    /// Only possible for [`Polarity::Negated`] requests.
    pub negation_absorbed: bool,
}

impl Adjusted {
    pub fn plain(node: NodeId) -> Self {
        Self {
            node,
            negation_absorbed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counters {
    wft: u32,
    arb: u32,
    ind: u32,
}

/// A point the store can be rolled back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    nodes: usize,
    refinements: usize,
    counters: Counters,
}

#[derive(Debug, Clone)]
struct Refinement {
    node: NodeId,
    previous: String,
}

type FrameKey = (CaseframeId, Option<(usize, usize)>, Vec<BTreeSet<NodeId>>);

/// Owner of every node in a network.
#[derive(Debug, Clone, Default)]
pub struct NodeStore {
    nodes: Vec<Node>,
    by_name: HashMap<String, NodeId>,
    frames: HashMap<FrameKey, NodeId>,
    variables: HashMap<VariableKey, NodeId>,
    /// Type refinements in application order, for rollback.
    refinements: Vec<Refinement>,
    counters: Counters,
}

impl NodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Look up a node, failing with [`SchemaError::UnknownNode`].
    pub fn node(&self, id: NodeId) -> Result<&Node, SchemaError> {
        self.get(id).ok_or_else(|| SchemaError::UnknownNode {
            name: id.to_string(),
        })
    }

    /// Find a node by name (`Fido`, `wft3`, `arb1`, `?x`).
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // -----------------------------------------------------------------------
    // Atomic terms
    // -----------------------------------------------------------------------

    /// Return the base node named `name`, creating it with `sem_type` if absent.
    ///
    /// An existing node of a more general type is refined to `sem_type`; one of
    /// a more specific type is returned unchanged.
    pub fn get_or_create_atomic(
        &mut self,
        schema: &Schema<'_>,
        name: &str,
        sem_type: &str,
    ) -> Result<NodeId, SchemaError> {
        if !schema.types.contains(sem_type) {
            return Err(SchemaError::UnknownType {
                name: sem_type.into(),
            });
        }

        if let Some(id) = self.find(name) {
            let node = &self.nodes[id.index()];
            if node.kind != NodeKind::Base {
                return Err(SchemaError::NodeConflict {
                    name: name.into(),
                    existing: format!("a {} node", node.kind.label()),
                    requested: sem_type.into(),
                });
            }
            if schema.types.is_subtype(&node.sem_type, sem_type) {
                tracing::trace!(name, "atomic node hit");
                return Ok(id);
            }
            if schema.types.is_subtype(sem_type, &node.sem_type) {
                self.refine(id, sem_type);
                return Ok(id);
            }
            return Err(SchemaError::NodeConflict {
                name: name.into(),
                existing: format!("a term of type {}", node.sem_type),
                requested: sem_type.into(),
            });
        }

        if name.is_empty() || name.starts_with('?') || is_generated_name(name) {
            return Err(SchemaError::InvalidName {
                name: name.into(),
                what: "term",
            });
        }
        let id = self.push(name.to_string(), sem_type.to_string(), NodeKind::Base);
        tracing::debug!(name, sem_type, id = id.get(), "created base node");
        Ok(id)
    }

    /// Return the query variable `?name`, creating it if absent.
    pub fn query_variable(&mut self, name: &str) -> Result<NodeId, SchemaError> {
        if let Some(id) = self.find(name) {
            return match self.nodes[id.index()].variable() {
                Some(v) if v.quantifier == Quantifier::Query => Ok(id),
                _ => Err(SchemaError::NodeConflict {
                    name: name.into(),
                    existing: format!("a {} node", self.nodes[id.index()].kind.label()),
                    requested: "query variable".into(),
                }),
            };
        }
        let id = self.push(
            name.to_string(),
            ROOT_TYPE.to_string(),
            NodeKind::Variable(Variable {
                quantifier: Quantifier::Query,
                restrictions: BTreeSet::new(),
                dependencies: BTreeSet::new(),
            }),
        );
        tracing::debug!(name, id = id.get(), "created query variable");
        Ok(id)
    }

    /// Create a provisional `every`/`some` variable with no restrictions yet.
    ///
    /// The returned mark precedes the variable; pass both to
    /// [`finish_variable`](Self::finish_variable) once the restrictions are built.
    pub fn begin_variable(&mut self, quantifier: Quantifier) -> (Mark, NodeId) {
        let mark = self.mark();
        let name = match quantifier {
            Quantifier::Indefinite => {
                self.counters.ind += 1;
                format!("ind{}", self.counters.ind)
            }
            Quantifier::Arbitrary | Quantifier::Query => {
                self.counters.arb += 1;
                format!("arb{}", self.counters.arb)
            }
        };
        let id = self.push(
            name,
            ROOT_TYPE.to_string(),
            NodeKind::Variable(Variable {
                quantifier,
                restrictions: BTreeSet::new(),
                dependencies: BTreeSet::new(),
            }),
        );
        (mark, id)
    }

    /// Attach restrictions and dependencies to a provisional variable.
    ///
    /// If an equivalent variable already exists, everything created since
    /// `mark` is rolled back and the existing variable is returned.
    pub fn finish_variable(
        &mut self,
        mark: Mark,
        variable: NodeId,
        restrictions: BTreeSet<NodeId>,
        dependencies: BTreeSet<NodeId>,
    ) -> NodeId {
        let Some(quantifier) = self.get(variable).and_then(Node::variable).map(|v| v.quantifier)
        else {
            return variable;
        };
        let key = VariableKey::new(self, variable, quantifier, &restrictions, &dependencies);
        if let Some(&existing) = self.variables.get(&key) {
            if existing.index() < mark.nodes {
                self.rollback(mark);
                tracing::trace!(name = %self.nodes[existing.index()].name, "variable hit");
                return existing;
            }
        }

        if let NodeKind::Variable(v) = &mut self.nodes[variable.index()].kind {
            v.restrictions = restrictions;
            v.dependencies = dependencies;
        }
        self.variables.insert(key, variable);
        tracing::debug!(
            name = %self.nodes[variable.index()].name,
            quantifier = %quantifier,
            "created variable"
        );
        variable
    }

    // -----------------------------------------------------------------------
    // Molecular terms
    // -----------------------------------------------------------------------

    /// Build (or find) a molecular node from positional filler sets.
    ///
    /// The caseframe may be named by an alias. Connective caseframes are
    /// normalized by their slot's adjustment rules first; in
    /// [`Polarity::Negated`] the result may already denote the negation.
    pub fn get_or_create_molecular(
        &mut self,
        schema: &Schema<'_>,
        caseframe: &str,
        fillers: Vec<BTreeSet<NodeId>>,
        polarity: Polarity,
    ) -> NetResult<Adjusted> {
        let caseframe = schema.caseframes.resolve(caseframe)?;
        let request = self.request(schema, caseframe, fillers, None)?;
        let outcome = adjust::normalize(schema, self, request, polarity);
        self.materialize(schema, outcome)
    }

    /// Build (or find) a connective node with explicit bounds (`andor`, `thresh`).
    pub fn get_or_create_minmax(
        &mut self,
        schema: &Schema<'_>,
        caseframe: &str,
        fillers: Vec<BTreeSet<NodeId>>,
        min: usize,
        max: usize,
    ) -> NetResult<NodeId> {
        let caseframe = schema.caseframes.resolve(caseframe)?;
        let request = self.request(schema, caseframe, fillers, Some((min, max)))?;
        let count: usize = request.fillers.iter().map(BTreeSet::len).sum();
        if min > max || max > count {
            return Err(SchemaError::InvalidMinMax {
                caseframe: schema.caseframes.get(caseframe).name.clone(),
                min,
                max,
                count,
            }
            .into());
        }
        self.intern(schema, request)
    }

    /// Negate an existing node, absorbing the negation where the adjustment
    /// rules allow it.
    pub fn negated(&mut self, schema: &Schema<'_>, node: NodeId) -> NetResult<Adjusted> {
        self.node(node)?;
        let outcome = adjust::negate_existing(schema, self, node);
        self.materialize(schema, outcome)
    }

    /// Find a molecular node with exactly this structure, without creating it.
    ///
    /// No adjustment is applied: `and{a}` is looked up as written.
    pub fn find_molecular(
        &self,
        schema: &Schema<'_>,
        caseframe: &str,
        fillers: &[BTreeSet<NodeId>],
    ) -> Option<NodeId> {
        let caseframe = schema.caseframes.resolve(caseframe).ok()?;
        let name = &schema.caseframes.get(caseframe).name;
        let bounds = adjust::derived_bounds(name, fillers.first().map_or(0, BTreeSet::len));
        self.frames
            .get(&(caseframe, bounds, fillers.to_vec()))
            .copied()
    }

    /// Find a connective node with explicit bounds.
    pub fn find_minmax(
        &self,
        schema: &Schema<'_>,
        caseframe: &str,
        fillers: &[BTreeSet<NodeId>],
        min: usize,
        max: usize,
    ) -> Option<NodeId> {
        let caseframe = schema.caseframes.resolve(caseframe).ok()?;
        self.frames
            .get(&(caseframe, Some((min, max)), fillers.to_vec()))
            .copied()
    }

    /// Check arity and filler existence, producing an adjustment request.
    fn request(
        &self,
        schema: &Schema<'_>,
        caseframe: CaseframeId,
        fillers: Vec<BTreeSet<NodeId>>,
        bounds: Option<(usize, usize)>,
    ) -> Result<Request, SchemaError> {
        let frame = schema.caseframes.get(caseframe);
        if fillers.len() != frame.slots.len() {
            return Err(SchemaError::ArityMismatch {
                caseframe: frame.name.clone(),
                expected: frame.slots.len(),
                actual: fillers.len(),
            });
        }
        if let Some(missing) = fillers.iter().flatten().find(|f| !self.contains(**f)) {
            return Err(SchemaError::UnknownNode {
                name: missing.to_string(),
            });
        }
        Ok(Request {
            caseframe,
            fillers,
            bounds,
        })
    }

    fn materialize(&mut self, schema: &Schema<'_>, outcome: Outcome) -> NetResult<Adjusted> {
        match outcome {
            Outcome::Existing { node, absorbed } => Ok(Adjusted {
                node,
                negation_absorbed: absorbed,
            }),
            Outcome::Build { request, absorbed } => {
                let node = self.intern(schema, request)?;
                Ok(Adjusted {
                    node,
                    negation_absorbed: absorbed,
                })
            }
        }
    }

    /// Validate a normalized request and return its canonical node.
    fn intern(&mut self, schema: &Schema<'_>, request: Request) -> NetResult<NodeId> {
        let frame = schema.caseframes.get(request.caseframe);
        let slots = schema.slots_of(request.caseframe);

        for (slot, set) in slots.iter().zip(&request.fillers) {
            if !slot.admits(set.len()) {
                return Err(CardinalityError {
                    caseframe: frame.name.clone(),
                    slot: slot.name.clone(),
                    bounds: slot.bounds(),
                    actual: set.len(),
                }
                .into());
            }
        }

        let bounds = request.bounds.or_else(|| {
            adjust::derived_bounds(
                &frame.name,
                request.fillers.first().map_or(0, BTreeSet::len),
            )
        });
        let key: FrameKey = (request.caseframe, bounds, request.fillers);
        if let Some(&id) = self.frames.get(&key) {
            tracing::trace!(caseframe = %frame.name, name = %self.nodes[id.index()].name, "intern hit");
            return Ok(id);
        }

        // Stage refinements so a failure part-way leaves every type untouched.
        let mut staged: HashMap<NodeId, &str> = HashMap::new();
        for (slot, set) in slots.iter().zip(&key.2) {
            for &filler in set {
                let node = &self.nodes[filler.index()];
                let current = staged.get(&filler).copied().unwrap_or(node.sem_type.as_str());
                if schema.types.is_subtype(current, &slot.sem_type) {
                    continue;
                }
                if schema.types.is_subtype(&slot.sem_type, current) {
                    staged.insert(filler, slot.sem_type.as_str());
                    continue;
                }
                return Err(TypeConstraintError {
                    caseframe: frame.name.clone(),
                    slot: slot.name.clone(),
                    filler: node.name.clone(),
                    filler_type: current.to_string(),
                    expected: slot.sem_type.clone(),
                }
                .into());
            }
        }
        let staged: Vec<(NodeId, String)> = staged
            .into_iter()
            .map(|(id, ty)| (id, ty.to_string()))
            .collect();
        for (id, ty) in staged {
            self.refine(id, &ty);
        }

        self.counters.wft += 1;
        let name = format!("wft{}", self.counters.wft);
        let (caseframe, bounds, fillers) = key.clone();
        let frame_value = Frame {
            caseframe,
            fillers,
        };
        let kind = match bounds {
            Some((min, max)) => NodeKind::MinMaxOp {
                frame: frame_value,
                min,
                max,
            },
            None => NodeKind::Molecular(frame_value),
        };
        let id = self.push(name, frame.result_type.clone(), kind);
        self.frames.insert(key, id);
        tracing::debug!(
            caseframe = %frame.name,
            name = %self.nodes[id.index()].name,
            bounds = ?bounds,
            "created molecular node"
        );
        Ok(id)
    }

    // -----------------------------------------------------------------------
    // Transactions
    // -----------------------------------------------------------------------

    pub fn mark(&self) -> Mark {
        Mark {
            nodes: self.nodes.len(),
            refinements: self.refinements.len(),
            counters: self.counters,
        }
    }

    /// Undo every node creation and type refinement since `mark`.
    pub fn rollback(&mut self, mark: Mark) {
        if mark.nodes >= self.nodes.len() && mark.refinements >= self.refinements.len() {
            return;
        }
        let removed = self.nodes.len().saturating_sub(mark.nodes);
        for refinement in self.refinements.drain(mark.refinements..).rev() {
            if let Some(node) = self.nodes.get_mut(refinement.node.index()) {
                node.sem_type = refinement.previous;
            }
        }
        self.nodes.truncate(mark.nodes);
        let limit = mark.nodes;
        self.by_name.retain(|_, id| id.index() < limit);
        self.frames.retain(|_, id| id.index() < limit);
        self.variables.retain(|_, id| id.index() < limit);
        self.counters = mark.counters;
        tracing::trace!(removed, "rolled back node store");
    }

    fn refine(&mut self, id: NodeId, sem_type: &str) {
        let node = &mut self.nodes[id.index()];
        tracing::debug!(name = %node.name, from = %node.sem_type, to = sem_type, "refined node type");
        let previous = std::mem::replace(&mut node.sem_type, sem_type.to_string());
        self.refinements.push(Refinement { node: id, previous });
    }

    fn push(&mut self, name: String, sem_type: String, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.by_name.insert(name.clone(), id);
        self.nodes.push(Node {
            id,
            name,
            sem_type,
            kind,
        });
        id
    }
}
