//! Belief contexts: named sets of hypotheses and derived beliefs.
//!
//! Contexts form a forest rooted at [`DEFAULT_CONTEXT`]. A node asserted in a
//! context is believed there and in every context that descends from it.
//! Within one context a node is either a hypothesis or derived, never both:
//! asserting it as a hypothesis moves it out of the derived set, and deriving
//! a hypothesis changes nothing.

use std::collections::{BTreeSet, HashMap};

use crate::error::ContextError;
use crate::node::NodeId;

/// The root context every network starts in.
pub const DEFAULT_CONTEXT: &str = "default";

/// A named belief context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    pub name: String,
    pub parent: Option<String>,
    pub docstring: String,
    hyps: BTreeSet<NodeId>,
    ders: BTreeSet<NodeId>,
}

impl Context {
    fn new(name: &str, parent: Option<&str>, docstring: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: parent.map(str::to_string),
            docstring: docstring.to_string(),
            hyps: BTreeSet::new(),
            ders: BTreeSet::new(),
        }
    }

    /// Nodes asserted as hypotheses here.
    pub fn hyps(&self) -> &BTreeSet<NodeId> {
        &self.hyps
    }

    /// Nodes derived here.
    pub fn ders(&self) -> &BTreeSet<NodeId> {
        &self.ders
    }

    /// `hyps ∪ ders`.
    pub fn all_asserted(&self) -> BTreeSet<NodeId> {
        self.hyps.union(&self.ders).copied().collect()
    }

    pub fn is_asserted(&self, node: NodeId) -> bool {
        self.hyps.contains(&node) || self.ders.contains(&node)
    }

    pub fn is_hypothesis(&self, node: NodeId) -> bool {
        self.hyps.contains(&node)
    }
}

/// All contexts of a network plus the current-context pointer.
#[derive(Debug, Clone)]
pub struct ContextRegistry {
    contexts: HashMap<String, Context>,
    order: Vec<String>,
    current: String,
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextRegistry {
    /// Create a registry holding only the default context, which is current.
    pub fn new() -> Self {
        let mut contexts = HashMap::new();
        contexts.insert(
            DEFAULT_CONTEXT.to_string(),
            Context::new(DEFAULT_CONTEXT, None, "The default context"),
        );
        Self {
            contexts,
            order: vec![DEFAULT_CONTEXT.to_string()],
            current: DEFAULT_CONTEXT.to_string(),
        }
    }

    /// Define a context. `parent` defaults to [`DEFAULT_CONTEXT`].
    pub fn define(
        &mut self,
        name: &str,
        docstring: &str,
        parent: Option<&str>,
    ) -> Result<&Context, ContextError> {
        if self.contexts.contains_key(name) {
            return Err(ContextError::Duplicate { name: name.into() });
        }
        let parent = parent.unwrap_or(DEFAULT_CONTEXT);
        if !self.contexts.contains_key(parent) {
            return Err(ContextError::UnknownParent {
                name: name.into(),
                parent: parent.into(),
            });
        }
        tracing::debug!(name, parent, "defined context");
        self.order.push(name.to_string());
        Ok(self
            .contexts
            .entry(name.to_string())
            .or_insert_with(|| Context::new(name, Some(parent), docstring)))
    }

    /// Make `name` the current context.
    pub fn set_current(&mut self, name: &str) -> Result<(), ContextError> {
        self.require(name)?;
        tracing::info!(from = %self.current, to = name, "switched context");
        self.current = name.to_string();
        Ok(())
    }

    pub fn current(&self) -> &Context {
        // The current name always refers to a defined context: contexts are
        // never removed and `set_current` validates its argument.
        &self.contexts[&self.current]
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn get(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    /// Look up a context, failing with [`ContextError::Unknown`].
    pub fn require(&self, name: &str) -> Result<&Context, ContextError> {
        self.get(name)
            .ok_or_else(|| ContextError::Unknown { name: name.into() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contexts.contains_key(name)
    }

    /// Add a hypothesis to `context`, removing it from the derived set.
    ///
    /// Returns `false` if it was already a hypothesis there.
    pub fn add_hypothesis(&mut self, context: &str, node: NodeId) -> Result<bool, ContextError> {
        let ctx = self.require_mut(context)?;
        ctx.ders.remove(&node);
        let added = ctx.hyps.insert(node);
        if added {
            tracing::debug!(context, node = node.get(), "added hypothesis");
        }
        Ok(added)
    }

    /// Record a derived belief in `context`. A no-op for hypotheses.
    ///
    /// Returns `false` if nothing changed.
    pub fn add_derived(&mut self, context: &str, node: NodeId) -> Result<bool, ContextError> {
        let ctx = self.require_mut(context)?;
        if ctx.hyps.contains(&node) {
            return Ok(false);
        }
        let added = ctx.ders.insert(node);
        if added {
            tracing::debug!(context, node = node.get(), "added derived belief");
        }
        Ok(added)
    }

    /// The parent chain of `name`, nearest first, excluding `name` itself.
    pub fn ancestors(&self, name: &str) -> Result<Vec<&Context>, ContextError> {
        let mut chain = Vec::new();
        let mut cursor = self.require(name)?.parent.as_deref();
        while let Some(parent) = cursor {
            let Some(ctx) = self.get(parent) else { break };
            chain.push(ctx);
            cursor = ctx.parent.as_deref();
        }
        Ok(chain)
    }

    /// Whether `node` is asserted in `name` or any of its ancestors.
    pub fn is_believed(&self, name: &str, node: NodeId) -> Result<bool, ContextError> {
        let ctx = self.require(name)?;
        if ctx.is_asserted(node) {
            return Ok(true);
        }
        Ok(self.ancestors(name)?.iter().any(|c| c.is_asserted(node)))
    }

    /// All contexts in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Context> {
        self.order.iter().filter_map(|n| self.contexts.get(n))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut Context, ContextError> {
        self.contexts
            .get_mut(name)
            .ok_or_else(|| ContextError::Unknown { name: name.into() })
    }
}
