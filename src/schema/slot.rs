//! Slots: named, typed, cardinality-bounded attributes of caseframes.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::error::{FillerBounds, SchemaError};

use super::types::TypeHierarchy;

/// How a slot's filler set is normalized in positive or negated position.
///
/// See [`crate::node::adjust`] for the algebra these rules drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjRule {
    #[default]
    None,
    Reduce,
    InfReduce,
    Expand,
    InfExpand,
}

impl fmt::Display for AdjRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Reduce => write!(f, "reduce"),
            Self::InfReduce => write!(f, "inf_reduce"),
            Self::Expand => write!(f, "expand"),
            Self::InfExpand => write!(f, "inf_expand"),
        }
    }
}

impl AdjRule {
    /// Parse a rule from its label.
    pub fn from_label(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "none" => Some(Self::None),
            "reduce" => Some(Self::Reduce),
            "inf_reduce" | "infreduce" => Some(Self::InfReduce),
            "expand" => Some(Self::Expand),
            "inf_expand" | "infexpand" => Some(Self::InfExpand),
            _ => None,
        }
    }
}

/// A slot definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub name: String,
    pub docstring: String,
    /// Fillers must be subtypes of this type.
    pub sem_type: String,
    pub pos_adj: AdjRule,
    pub neg_adj: AdjRule,
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
    /// Reserved for path-based inference.
    pub path: Option<String>,
}

impl Slot {
    pub fn bounds(&self) -> FillerBounds {
        FillerBounds {
            min: self.min,
            max: self.max,
        }
    }

    /// Whether `count` fillers satisfy this slot's bounds.
    pub fn admits(&self, count: usize) -> bool {
        count >= self.min && self.max.is_none_or(|max| count <= max)
    }
}

/// Builder for [`Slot`] definitions.
///
/// Defaults: positive adjustment `reduce`, negative adjustment `expand`,
/// at least one filler, no upper bound.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    slot: Slot,
}

impl SlotSpec {
    pub fn new(name: impl Into<String>, sem_type: impl Into<String>) -> Self {
        Self {
            slot: Slot {
                name: name.into(),
                docstring: String::new(),
                sem_type: sem_type.into(),
                pos_adj: AdjRule::Reduce,
                neg_adj: AdjRule::Expand,
                min: 1,
                max: None,
                path: None,
            },
        }
    }

    pub fn docstring(mut self, docstring: impl Into<String>) -> Self {
        self.slot.docstring = docstring.into();
        self
    }

    pub fn pos_adj(mut self, rule: AdjRule) -> Self {
        self.slot.pos_adj = rule;
        self
    }

    pub fn neg_adj(mut self, rule: AdjRule) -> Self {
        self.slot.neg_adj = rule;
        self
    }

    pub fn min(mut self, min: usize) -> Self {
        self.slot.min = min;
        self
    }

    pub fn max(mut self, max: usize) -> Self {
        self.slot.max = Some(max);
        self
    }

    pub fn unbounded(mut self) -> Self {
        self.slot.max = None;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.slot.path = Some(path.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.slot.name
    }
}

/// Registry of all slots in a network.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    slots: HashMap<String, Slot>,
    order: Vec<String>,
}

impl SlotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and insert a slot.
    pub fn define(&mut self, spec: SlotSpec, types: &TypeHierarchy) -> Result<&Slot, SchemaError> {
        let slot = spec.slot;
        if self.slots.contains_key(&slot.name) {
            return Err(SchemaError::DuplicateSlot { name: slot.name });
        }
        if !types.contains(&slot.sem_type) {
            return Err(SchemaError::UnknownType {
                name: slot.sem_type,
            });
        }
        if let Some(max) = slot.max {
            if slot.min > max {
                return Err(SchemaError::InvalidBounds {
                    name: slot.name,
                    min: slot.min,
                    max,
                });
            }
        }

        tracing::debug!(
            name = %slot.name,
            sem_type = %slot.sem_type,
            bounds = %slot.bounds(),
            pos_adj = %slot.pos_adj,
            neg_adj = %slot.neg_adj,
            "defined slot"
        );
        let name = slot.name.clone();
        self.order.push(name.clone());
        Ok(self.slots.entry(name).or_insert(slot))
    }

    pub fn get(&self, name: &str) -> Option<&Slot> {
        self.slots.get(name)
    }

    /// Look up a slot, failing with [`SchemaError::UnknownSlot`].
    pub fn require(&self, name: &str) -> Result<&Slot, SchemaError> {
        self.get(name)
            .ok_or_else(|| SchemaError::UnknownSlot { name: name.into() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// All slots in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.order.iter().filter_map(|n| self.slots.get(n))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
