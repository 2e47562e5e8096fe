//! Caseframes: named relation templates built from an ordered list of slots.
//!
//! Caseframe names and aliases share a single namespace, so an alias resolves
//! transparently wherever a caseframe name is accepted.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::error::SchemaError;

use super::slot::SlotRegistry;
use super::types::TypeHierarchy;

/// Index of a caseframe in its registry. Stable for the lifetime of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CaseframeId(u32);

impl CaseframeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CaseframeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cf:{}", self.0)
    }
}

/// A caseframe definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caseframe {
    pub id: CaseframeId,
    pub name: String,
    /// Semantic type of every node built from this caseframe.
    pub result_type: String,
    /// Slot names; position gives argument order, not meaning.
    pub slots: Vec<String>,
    pub aliases: BTreeSet<String>,
    pub docstring: String,
    /// The connective this one turns into under negation (`and` ↔ `nand`).
    pub dual: Option<CaseframeId>,
}

impl Caseframe {
    /// Whether `name` is this caseframe's name or one of its aliases.
    pub fn answers_to(&self, name: &str) -> bool {
        self.name == name || self.aliases.contains(name)
    }

    /// Position of a slot within this caseframe.
    pub fn slot_position(&self, slot: &str) -> Option<usize> {
        self.slots.iter().position(|s| s == slot)
    }
}

/// Registry of all caseframes in a network.
#[derive(Debug, Clone, Default)]
pub struct CaseframeRegistry {
    frames: Vec<Caseframe>,
    /// Name or alias → caseframe.
    names: HashMap<String, CaseframeId>,
}

impl CaseframeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a caseframe.
    pub fn define(
        &mut self,
        name: &str,
        result_type: &str,
        slot_names: &[&str],
        docstring: &str,
        types: &TypeHierarchy,
        slots: &SlotRegistry,
    ) -> Result<CaseframeId, SchemaError> {
        if !types.contains(result_type) {
            return Err(SchemaError::UnknownType {
                name: result_type.into(),
            });
        }
        for slot in slot_names {
            slots.require(slot)?;
        }
        self.insert(
            name,
            result_type,
            slot_names.iter().map(|s| s.to_string()).collect(),
            docstring,
        )
    }

    /// Insert a caseframe whose result type and slots were already validated.
    pub(crate) fn insert(
        &mut self,
        name: &str,
        result_type: &str,
        slots: Vec<String>,
        docstring: &str,
    ) -> Result<CaseframeId, SchemaError> {
        if self.names.contains_key(name) {
            return Err(SchemaError::DuplicateCaseframe { name: name.into() });
        }
        let id = CaseframeId(self.frames.len() as u32);
        tracing::debug!(name, result_type, slots = ?slots, "defined caseframe");
        self.frames.push(Caseframe {
            id,
            name: name.to_string(),
            result_type: result_type.to_string(),
            slots,
            aliases: BTreeSet::new(),
            docstring: docstring.to_string(),
            dual: None,
        });
        self.names.insert(name.to_string(), id);
        Ok(id)
    }

    /// Register `alias` as another name for `caseframe` (itself a name or alias).
    pub fn add_alias(&mut self, caseframe: &str, alias: &str) -> Result<CaseframeId, SchemaError> {
        let id = self.resolve(caseframe)?;
        if self.names.contains_key(alias) {
            return Err(SchemaError::AliasCollision {
                alias: alias.into(),
            });
        }
        tracing::debug!(caseframe, alias, "added caseframe alias");
        self.names.insert(alias.to_string(), id);
        self.frames[id.index()].aliases.insert(alias.to_string());
        Ok(id)
    }

    /// Pair two caseframes as negation duals. Checks beyond existence are
    /// done by the caller, which can see the slot and type registries.
    pub(crate) fn set_dual(&mut self, a: CaseframeId, b: CaseframeId) {
        self.frames[a.index()].dual = Some(b);
        self.frames[b.index()].dual = Some(a);
    }

    /// Resolve a name or alias to its caseframe id.
    pub fn resolve(&self, name: &str) -> Result<CaseframeId, SchemaError> {
        self.names
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownCaseframe { name: name.into() })
    }

    /// Look up a caseframe by name or alias.
    pub fn lookup(&self, name: &str) -> Option<&Caseframe> {
        self.names.get(name).map(|id| &self.frames[id.index()])
    }

    /// Whether a name or alias is taken.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn get(&self, id: CaseframeId) -> &Caseframe {
        &self.frames[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Caseframe> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CaseframeRegistry {
        let mut reg = CaseframeRegistry::new();
        reg.insert("nor", "Propositional", vec!["nor".into()], "not any of [nor]")
            .unwrap();
        reg.insert("Isa", "Propositional", vec!["member".into(), "class".into()], "")
            .unwrap();
        reg
    }

    #[test]
    fn alias_resolves_to_same_caseframe() {
        let mut reg = registry();
        let nor = reg.add_alias("nor", "not").unwrap();
        assert_eq!(reg.resolve("not").unwrap(), nor);
        assert!(std::ptr::eq(reg.lookup("not").unwrap(), reg.lookup("nor").unwrap()));
        assert!(reg.get(nor).answers_to("not"));
    }

    #[test]
    fn alias_cannot_shadow_names() {
        let mut reg = registry();
        reg.add_alias("nor", "not").unwrap();
        assert!(matches!(
            reg.add_alias("Isa", "nor"),
            Err(SchemaError::AliasCollision { .. })
        ));
        assert!(matches!(
            reg.add_alias("Isa", "not"),
            Err(SchemaError::AliasCollision { .. })
        ));
        assert!(matches!(
            reg.insert("not", "Propositional", vec![], ""),
            Err(SchemaError::DuplicateCaseframe { .. })
        ));
    }

    #[test]
    fn alias_of_unknown_caseframe_fails() {
        let mut reg = registry();
        assert!(matches!(
            reg.add_alias("missing", "m"),
            Err(SchemaError::UnknownCaseframe { .. })
        ));
    }

    #[test]
    fn define_validates_type_and_slots() {
        use crate::schema::slot::SlotSpec;

        let mut types = TypeHierarchy::new();
        types.define("Propositional", &[]).unwrap();
        let mut slots = SlotRegistry::new();
        slots.define(SlotSpec::new("agent", "Entity"), &types).unwrap();

        let mut reg = CaseframeRegistry::new();
        assert!(matches!(
            reg.define("Runs", "Propositional", &["agent", "speed"], "", &types, &slots),
            Err(SchemaError::UnknownSlot { name }) if name == "speed"
        ));
        assert!(matches!(
            reg.define("Runs", "Event", &["agent"], "", &types, &slots),
            Err(SchemaError::UnknownType { .. })
        ));
        assert!(reg.is_empty());

        let id = reg
            .define("Runs", "Propositional", &["agent"], "[agent] runs", &types, &slots)
            .unwrap();
        assert_eq!(reg.get(id).slots, vec!["agent".to_string()]);
    }

    #[test]
    fn slot_positions() {
        let reg = registry();
        let isa = reg.lookup("Isa").unwrap();
        assert_eq!(isa.slot_position("class"), Some(1));
        assert_eq!(isa.slot_position("nor"), None);
    }
}
