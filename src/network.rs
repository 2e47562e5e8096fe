//! The network: aggregate root of the knowledge base.
//!
//! A [`Network`] owns the type hierarchy, the slot and caseframe registries,
//! the node store and the belief contexts. Every mutating call either
//! succeeds completely or leaves the network as it was.

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;

use crate::context::{Context, ContextRegistry};
use crate::error::{ConfigError, ContextError, NetResult, SchemaError};
use crate::node::{Node, NodeId, NodeStore};
use crate::schema::{
    is_valid_name, Caseframe, CaseframeId, CaseframeRegistry, Schema, Slot, SlotRegistry, SlotSpec,
    TypeHierarchy,
};
use crate::seeds::{SchemaPack, SeedReport};
use crate::wft::{self, Wft};

/// Configuration for a [`Network`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Reject user-defined names that are not `^[A-Za-z][A-Za-z0-9_]*$`.
    pub enforce_name_syntax: bool,
    /// Apply the bundled `core` ontology on construction.
    pub seed_ontology: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enforce_name_syntax: true,
            seed_ontology: true,
        }
    }
}

impl NetworkConfig {
    /// Parse a configuration from TOML. Missing keys take their defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Invalid {
            message: e.to_string(),
        })
    }
}

/// Summary counts for a network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub types: usize,
    pub slots: usize,
    pub caseframes: usize,
    pub nodes: usize,
    pub contexts: usize,
    pub current_context: String,
    pub hypotheses: usize,
    pub derived: usize,
}

impl fmt::Display for NetworkInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "types:       {}", self.types)?;
        writeln!(f, "slots:       {}", self.slots)?;
        writeln!(f, "caseframes:  {}", self.caseframes)?;
        writeln!(f, "nodes:       {}", self.nodes)?;
        writeln!(f, "contexts:    {}", self.contexts)?;
        write!(
            f,
            "current:     {} ({} hyps, {} ders)",
            self.current_context, self.hypotheses, self.derived
        )
    }
}

/// A typed semantic network with belief contexts.
#[derive(Debug, Clone)]
pub struct Network {
    config: NetworkConfig,
    types: TypeHierarchy,
    slots: SlotRegistry,
    caseframes: CaseframeRegistry,
    nodes: NodeStore,
    contexts: ContextRegistry,
    applied_packs: Vec<String>,
    /// Name syntax applies to user definitions only, not the seed ontology.
    seeded: bool,
}

impl Network {
    /// Create a network, seeding the built-in ontology unless disabled.
    pub fn new(config: NetworkConfig) -> NetResult<Self> {
        let mut network = Self {
            config,
            types: TypeHierarchy::new(),
            slots: SlotRegistry::new(),
            caseframes: CaseframeRegistry::new(),
            nodes: NodeStore::new(),
            contexts: ContextRegistry::new(),
            applied_packs: Vec::new(),
            seeded: false,
        };
        if network.config.seed_ontology {
            let core = SchemaPack::core()?;
            network.apply_schema_pack(&core)?;
        }
        network.seeded = true;
        tracing::info!(
            types = network.types.len(),
            slots = network.slots.len(),
            caseframes = network.caseframes.len(),
            "initialized semantic network"
        );
        Ok(network)
    }

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Read-only view over the schema registries.
    pub fn schema(&self) -> Schema<'_> {
        Schema::new(&self.types, &self.slots, &self.caseframes)
    }

    pub fn info(&self) -> NetworkInfo {
        let current = self.contexts.current();
        NetworkInfo {
            types: self.types.len(),
            slots: self.slots.len(),
            caseframes: self.caseframes.len(),
            nodes: self.nodes.len(),
            contexts: self.contexts.len(),
            current_context: current.name.clone(),
            hypotheses: current.hyps().len(),
            derived: current.ders().len(),
        }
    }

    fn check_name(&self, name: &str, what: &'static str) -> Result<(), SchemaError> {
        if self.seeded && self.config.enforce_name_syntax && !is_valid_name(name) {
            return Err(SchemaError::InvalidName {
                name: name.into(),
                what,
            });
        }
        Ok(())
    }

    // ── Schema ──────────────────────────────────────────────────────────

    pub fn define_type(&mut self, name: &str, parents: &[&str]) -> NetResult<()> {
        self.check_name(name, "type")?;
        self.types.define(name, parents)?;
        Ok(())
    }

    pub fn define_slot(&mut self, spec: SlotSpec) -> NetResult<&Slot> {
        self.check_name(spec.name(), "slot")?;
        Ok(self.slots.define(spec, &self.types)?)
    }

    pub fn define_caseframe(
        &mut self,
        name: &str,
        result_type: &str,
        slot_names: &[&str],
        docstring: &str,
    ) -> NetResult<CaseframeId> {
        self.check_name(name, "caseframe")?;
        Ok(self.caseframes.define(
            name,
            result_type,
            slot_names,
            docstring,
            &self.types,
            &self.slots,
        )?)
    }

    /// Make `alias` resolve to the same caseframe as `caseframe`.
    pub fn add_alias(&mut self, caseframe: &str, alias: &str) -> NetResult<CaseframeId> {
        self.check_name(alias, "caseframe alias")?;
        Ok(self.caseframes.add_alias(caseframe, alias)?)
    }

    /// Declare two connective caseframes as negations of each other.
    pub fn define_dual(&mut self, a: &str, b: &str) -> NetResult<()> {
        let (a_id, b_id) = self.schema().check_dual(a, b)?;
        self.caseframes.set_dual(a_id, b_id);
        tracing::debug!(a, b, "defined dual caseframes");
        Ok(())
    }

    /// Apply a schema pack. Applying the same pack id twice is a no-op.
    ///
    /// The pack is applied atomically: if any definition fails, none of the
    /// pack's definitions remain.
    pub fn apply_schema_pack(&mut self, pack: &SchemaPack) -> NetResult<SeedReport> {
        if self.applied_packs.contains(&pack.id) {
            return Ok(SeedReport {
                id: pack.id.clone(),
                already_applied: true,
                ..SeedReport::default()
            });
        }

        let snapshot = (self.types.clone(), self.slots.clone(), self.caseframes.clone());
        match self.apply_pack_definitions(pack) {
            Ok(report) => {
                self.applied_packs.push(pack.id.clone());
                tracing::info!(
                    pack = %pack.id,
                    types = report.types,
                    slots = report.slots,
                    caseframes = report.caseframes,
                    "applied schema pack"
                );
                Ok(report)
            }
            Err(e) => {
                (self.types, self.slots, self.caseframes) = snapshot;
                tracing::warn!(pack = %pack.id, "schema pack rejected: {e}");
                Err(e)
            }
        }
    }

    fn apply_pack_definitions(&mut self, pack: &SchemaPack) -> NetResult<SeedReport> {
        let mut report = SeedReport {
            id: pack.id.clone(),
            ..SeedReport::default()
        };
        for ty in &pack.types {
            let parents: Vec<&str> = ty.parents.iter().map(String::as_str).collect();
            self.define_type(&ty.name, &parents)?;
            report.types += 1;
        }
        for slot in &pack.slots {
            self.define_slot(slot.to_spec())?;
            report.slots += 1;
        }
        for cf in &pack.caseframes {
            let slot_names: Vec<&str> = cf.slots.iter().map(String::as_str).collect();
            self.define_caseframe(&cf.name, &cf.result_type, &slot_names, &cf.docstring)?;
            report.caseframes += 1;
            for alias in &cf.aliases {
                self.add_alias(&cf.name, alias)?;
                report.aliases += 1;
            }
        }
        for dual in &pack.duals {
            self.define_dual(&dual.a, &dual.b)?;
            report.duals += 1;
        }
        Ok(report)
    }

    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        self.types.is_subtype(sub, sup)
    }

    pub fn types(&self) -> &TypeHierarchy {
        &self.types
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    pub fn slots(&self) -> &SlotRegistry {
        &self.slots
    }

    /// Look up a caseframe by name or alias.
    pub fn caseframe(&self, name: &str) -> Option<&Caseframe> {
        self.caseframes.lookup(name)
    }

    pub fn caseframes(&self) -> &CaseframeRegistry {
        &self.caseframes
    }

    // ── Contexts ────────────────────────────────────────────────────────

    /// Define a context. `parent` defaults to `default`.
    pub fn define_context(
        &mut self,
        name: &str,
        docstring: &str,
        parent: Option<&str>,
    ) -> NetResult<&Context> {
        if self.seeded && self.config.enforce_name_syntax && !is_valid_name(name) {
            return Err(ContextError::InvalidName { name: name.into() }.into());
        }
        Ok(self.contexts.define(name, docstring, parent)?)
    }

    pub fn set_current_context(&mut self, name: &str) -> NetResult<()> {
        Ok(self.contexts.set_current(name)?)
    }

    pub fn current_context(&self) -> &Context {
        self.contexts.current()
    }

    pub fn context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    pub fn contexts(&self) -> &ContextRegistry {
        &self.contexts
    }

    /// Assert `node` as a hypothesis in `context`.
    pub fn add_hypothesis(&mut self, context: &str, node: NodeId) -> NetResult<bool> {
        self.require_node(node)?;
        Ok(self.contexts.add_hypothesis(context, node)?)
    }

    /// Record `node` as derived in `context`. The write path for inference engines.
    pub fn add_derived(&mut self, context: &str, node: NodeId) -> NetResult<bool> {
        self.require_node(node)?;
        Ok(self.contexts.add_derived(context, node)?)
    }

    pub fn is_asserted(&self, context: &str, node: NodeId) -> NetResult<bool> {
        Ok(self.contexts.require(context)?.is_asserted(node))
    }

    /// Whether `node` is asserted in `context` or one of its ancestors.
    pub fn is_believed(&self, context: &str, node: NodeId) -> NetResult<bool> {
        Ok(self.contexts.is_believed(context, node)?)
    }

    fn require_node(&self, node: NodeId) -> Result<(), ContextError> {
        if self.nodes.contains(node) {
            Ok(())
        } else {
            Err(ContextError::UnknownNode { node: node.get() })
        }
    }

    // ── Formulas ────────────────────────────────────────────────────────

    /// Parse a formula without touching the network.
    pub fn parse_wft(&self, text: &str) -> NetResult<Wft> {
        Ok(wft::parse(text)?)
    }

    /// Parse and lower a formula in the current context.
    ///
    /// With `as_hypothesis` the node is added to the current context's
    /// hypotheses; otherwise it is returned uncommitted.
    pub fn assert_wft(&mut self, text: &str, as_hypothesis: bool) -> NetResult<NodeId> {
        let context = self.contexts.current_name().to_string();
        self.assert_wft_in(&context, text, as_hypothesis)
    }

    /// Parse and lower a formula, optionally asserting it in `context`.
    pub fn assert_wft_in(
        &mut self,
        context: &str,
        text: &str,
        as_hypothesis: bool,
    ) -> NetResult<NodeId> {
        let parsed = wft::parse(text)?;
        self.contexts.require(context)?;

        let mark = self.nodes.mark();
        let schema = Schema::new(&self.types, &self.slots, &self.caseframes);
        let node = match wft::lower::lower(&schema, &mut self.nodes, text, &parsed) {
            Ok(node) => node,
            Err(e) => {
                self.nodes.rollback(mark);
                tracing::warn!(wft = text, "assertion rolled back: {e}");
                return Err(e);
            }
        };

        if as_hypothesis {
            self.contexts.add_hypothesis(context, node)?;
        }
        tracing::info!(
            wft = text,
            node = %self.nodes.get(node).map_or("?", |n| n.name.as_str()),
            context,
            hypothesis = as_hypothesis,
            "asserted formula"
        );
        Ok(node)
    }

    // ── Nodes ───────────────────────────────────────────────────────────

    /// Return the base node `name`, creating it with `sem_type` if absent.
    pub fn get_or_create_atomic(&mut self, name: &str, sem_type: &str) -> NetResult<NodeId> {
        let schema = Schema::new(&self.types, &self.slots, &self.caseframes);
        Ok(self.nodes.get_or_create_atomic(&schema, name, sem_type)?)
    }

    /// Build (or find) a molecular node from fillers named by slot.
    ///
    /// Slots left out get no fillers; naming a slot twice merges its fillers.
    pub fn get_or_create_molecular(
        &mut self,
        caseframe: &str,
        fillers_by_slot: &[(&str, &[NodeId])],
    ) -> NetResult<NodeId> {
        let fillers = self.positional(caseframe, fillers_by_slot)?;
        let schema = Schema::new(&self.types, &self.slots, &self.caseframes);
        let built = self.nodes.get_or_create_molecular(
            &schema,
            caseframe,
            fillers,
            crate::node::Polarity::Positive,
        )?;
        Ok(built.node)
    }

    /// Build (or find) an `andor`/`thresh` node with explicit bounds.
    pub fn get_or_create_minmax(
        &mut self,
        caseframe: &str,
        fillers: &[NodeId],
        min: usize,
        max: usize,
    ) -> NetResult<NodeId> {
        let schema = Schema::new(&self.types, &self.slots, &self.caseframes);
        let set: BTreeSet<NodeId> = fillers.iter().copied().collect();
        self.nodes
            .get_or_create_minmax(&schema, caseframe, vec![set], min, max)
    }

    /// Find a base or variable node by name.
    pub fn find_atomic(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .find(name)
            .filter(|id| self.nodes.get(*id).is_some_and(Node::is_atomic))
    }

    /// Find a molecular node by exact structure, without creating it.
    pub fn find_molecular(
        &self,
        caseframe: &str,
        fillers_by_slot: &[(&str, &[NodeId])],
    ) -> Option<NodeId> {
        let fillers = self.positional(caseframe, fillers_by_slot).ok()?;
        self.nodes.find_molecular(&self.schema(), caseframe, &fillers)
    }

    /// Find a node by name (`Fido`, `wft3`, `arb1`, `?x`).
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.find(name)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Order slot-named fillers by the caseframe's slot order.
    fn positional(
        &self,
        caseframe: &str,
        fillers_by_slot: &[(&str, &[NodeId])],
    ) -> Result<Vec<BTreeSet<NodeId>>, SchemaError> {
        let frame = self.caseframes.get(self.caseframes.resolve(caseframe)?);
        let mut fillers = vec![BTreeSet::new(); frame.slots.len()];
        for (slot, ids) in fillers_by_slot {
            let position = frame
                .slot_position(slot)
                .ok_or_else(|| SchemaError::UnknownSlot {
                    name: format!("{slot} (in caseframe {})", frame.name),
                })?;
            fillers[position].extend(ids.iter().copied());
        }
        Ok(fillers)
    }
}
