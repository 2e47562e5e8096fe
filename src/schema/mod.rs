//! Schema registries: semantic types, slots and caseframes.
//!
//! - **Types** ([`TypeHierarchy`]): multi-parent DAG with O(1) subsumption
//! - **Slots** ([`SlotRegistry`]): typed, bounded, adjustment-annotated attributes
//! - **Caseframes** ([`CaseframeRegistry`]): ordered slot lists with aliases and duals
//!
//! [`Schema`] is a read-only view over all three, handed to the node store and
//! the formula lowering so they can validate without owning the registries.

pub mod caseframe;
pub mod slot;
pub mod types;

use std::sync::LazyLock;

use regex::Regex;

pub use caseframe::{Caseframe, CaseframeId, CaseframeRegistry};
pub use slot::{AdjRule, Slot, SlotRegistry, SlotSpec};
pub use types::{SemanticType, TypeHierarchy, ROOT_TYPE};

use crate::error::SchemaError;

/// The type every proposition-valued node descends from.
pub const PROPOSITIONAL: &str = "Propositional";

static NAME_SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").expect("static regex"));

/// Whether a user-supplied name is acceptable when name syntax is enforced.
pub fn is_valid_name(name: &str) -> bool {
    NAME_SYNTAX.is_match(name)
}

/// Borrowed view over the three schema registries.
#[derive(Debug, Clone, Copy)]
pub struct Schema<'a> {
    pub types: &'a TypeHierarchy,
    pub slots: &'a SlotRegistry,
    pub caseframes: &'a CaseframeRegistry,
}

impl<'a> Schema<'a> {
    pub fn new(
        types: &'a TypeHierarchy,
        slots: &'a SlotRegistry,
        caseframes: &'a CaseframeRegistry,
    ) -> Self {
        Self {
            types,
            slots,
            caseframes,
        }
    }

    /// The slot definitions of a caseframe, in order.
    ///
    /// Caseframes are only inserted after their slots were validated, so every
    /// name resolves.
    pub fn slots_of(&self, caseframe: CaseframeId) -> Vec<&'a Slot> {
        self.caseframes
            .get(caseframe)
            .slots
            .iter()
            .filter_map(|name| self.slots.get(name))
            .collect()
    }

    /// The single slot of a connective caseframe: one slot whose fillers are
    /// propositions. Adjustment rules only act on connectives.
    pub fn connective_slot(&self, caseframe: CaseframeId) -> Option<&'a Slot> {
        let frame = self.caseframes.get(caseframe);
        match frame.slots.as_slice() {
            [only] => self
                .slots
                .get(only)
                .filter(|slot| self.types.is_subtype(&slot.sem_type, PROPOSITIONAL)),
            _ => None,
        }
    }

    /// Check that two caseframes can be paired as negation duals.
    pub fn check_dual(&self, a: &str, b: &str) -> Result<(CaseframeId, CaseframeId), SchemaError> {
        let a_id = self.caseframes.resolve(a)?;
        let b_id = self.caseframes.resolve(b)?;
        let invalid = |reason: &str| SchemaError::InvalidDual {
            a: a.into(),
            b: b.into(),
            reason: reason.into(),
        };
        if a_id == b_id {
            return Err(invalid("a caseframe cannot be its own dual"));
        }
        if self.connective_slot(a_id).is_none() || self.connective_slot(b_id).is_none() {
            return Err(invalid("both must have a single proposition-valued slot"));
        }
        if self.caseframes.get(a_id).dual.is_some() || self.caseframes.get(b_id).dual.is_some() {
            return Err(invalid("one of them already has a dual"));
        }
        Ok((a_id, b_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_syntax() {
        assert!(is_valid_name("Dog"));
        assert!(is_valid_name("has_part2"));
        assert!(!is_valid_name("2fast"));
        assert!(!is_valid_name("with space"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("_hidden"));
    }

    fn fixture() -> (TypeHierarchy, SlotRegistry, CaseframeRegistry) {
        let mut types = TypeHierarchy::new();
        types.define(PROPOSITIONAL, &[]).unwrap();
        types.define("Proposition", &[PROPOSITIONAL]).unwrap();
        let mut slots = SlotRegistry::new();
        slots.define(SlotSpec::new("and", "Proposition").min(2), &types).unwrap();
        slots.define(SlotSpec::new("nand", "Proposition").min(2), &types).unwrap();
        slots.define(SlotSpec::new("member", "Entity"), &types).unwrap();
        let mut frames = CaseframeRegistry::new();
        frames.define("and", PROPOSITIONAL, &["and"], "", &types, &slots).unwrap();
        frames.define("nand", PROPOSITIONAL, &["nand"], "", &types, &slots).unwrap();
        frames.define("Member", PROPOSITIONAL, &["member"], "", &types, &slots).unwrap();
        (types, slots, frames)
    }

    #[test]
    fn connectives_need_one_propositional_slot() {
        let (types, slots, frames) = fixture();
        let schema = Schema::new(&types, &slots, &frames);
        let and = frames.resolve("and").unwrap();
        let member = frames.resolve("Member").unwrap();
        assert_eq!(schema.connective_slot(and).map(|s| s.name.as_str()), Some("and"));
        assert!(schema.connective_slot(member).is_none());
    }

    #[test]
    fn dual_checks() {
        let (types, slots, mut frames) = fixture();
        let (a, b) = Schema::new(&types, &slots, &frames).check_dual("and", "nand").unwrap();
        frames.set_dual(a, b);
        let schema = Schema::new(&types, &slots, &frames);
        assert!(matches!(
            schema.check_dual("and", "Member"),
            Err(SchemaError::InvalidDual { .. })
        ));
        assert!(matches!(
            schema.check_dual("nand", "and"),
            Err(SchemaError::InvalidDual { .. })
        ));
        assert_eq!(frames.get(a).dual, Some(b));
    }
}
