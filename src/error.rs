//! Rich diagnostic error types for the semnet knowledge base.
//!
//! Each subsystem defines its own error type with miette `#[diagnostic]` derives,
//! providing error codes and help text so callers know exactly which definition
//! or assertion was rejected and why. Every failed call leaves the network in
//! its previous state.

use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

use crate::seeds::SeedError;
use crate::wft::ParseError;

/// Top-level error type for the semnet knowledge base.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, source spans) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum NetError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Cardinality(#[from] CardinalityError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    TypeConstraint(#[from] TypeConstraintError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Seed(#[from] SeedError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for network operations.
pub type NetResult<T> = std::result::Result<T, NetError>;

// ---------------------------------------------------------------------------
// Schema errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum SchemaError {
    #[error("type \"{name}\" is already defined")]
    #[diagnostic(
        code(semnet::schema::duplicate_type),
        help("Type names are unique within a network. Pick another name or reuse the existing type.")
    )]
    DuplicateType { name: String },

    #[error("unknown type \"{name}\"")]
    #[diagnostic(
        code(semnet::schema::unknown_type),
        help("Define the type with `define_type()` before referring to it. Every type descends from \"Entity\".")
    )]
    UnknownType { name: String },

    #[error("slot \"{name}\" is already defined")]
    #[diagnostic(
        code(semnet::schema::duplicate_slot),
        help("Slot names are unique within a network. Reuse the existing slot in your caseframe instead.")
    )]
    DuplicateSlot { name: String },

    #[error("unknown slot \"{name}\"")]
    #[diagnostic(
        code(semnet::schema::unknown_slot),
        help("Define the slot with `define_slot()` before listing it in a caseframe.")
    )]
    UnknownSlot { name: String },

    #[error("slot \"{name}\" has invalid bounds: min {min} exceeds max {max}")]
    #[diagnostic(
        code(semnet::schema::invalid_bounds),
        help("A slot's minimum filler count must not exceed its maximum. Leave `max` unset for an unbounded slot.")
    )]
    InvalidBounds { name: String, min: usize, max: usize },

    #[error("caseframe name \"{name}\" is already in use")]
    #[diagnostic(
        code(semnet::schema::duplicate_caseframe),
        help("Caseframe names and aliases share one namespace. Choose a name that is neither an existing caseframe nor an alias.")
    )]
    DuplicateCaseframe { name: String },

    #[error("unknown caseframe \"{name}\"")]
    #[diagnostic(
        code(semnet::schema::unknown_caseframe),
        help("No caseframe or alias with this name exists. Define it with `define_caseframe()` or register an alias with `add_alias()`.")
    )]
    UnknownCaseframe { name: String },

    #[error("alias \"{alias}\" collides with an existing caseframe or alias")]
    #[diagnostic(
        code(semnet::schema::alias_collision),
        help("An alias must not shadow any caseframe name or alias already registered.")
    )]
    AliasCollision { alias: String },

    #[error("caseframe \"{caseframe}\" takes {expected} argument(s), got {actual}")]
    #[diagnostic(
        code(semnet::schema::arity),
        help("Arguments of a caseframe application are positional, one per slot. Use `none` for an empty slot and `setof(...)` for several fillers.")
    )]
    ArityMismatch {
        caseframe: String,
        expected: usize,
        actual: usize,
    },

    #[error("caseframes \"{a}\" and \"{b}\" cannot be declared duals: {reason}")]
    #[diagnostic(
        code(semnet::schema::invalid_dual),
        help("Duals must be two distinct single-slot connective caseframes without an existing dual.")
    )]
    InvalidDual { a: String, b: String, reason: String },

    #[error("name \"{name}\" is not allowed for a {what}")]
    #[diagnostic(
        code(semnet::schema::invalid_name),
        help("Names must start with a letter and contain only letters, digits and underscores.")
    )]
    InvalidName { name: String, what: &'static str },

    #[error("node \"{name}\" already exists as {existing}, cannot use it as a {requested} term")]
    #[diagnostic(
        code(semnet::schema::node_conflict),
        help("A node name identifies exactly one node. Use a different name for the new term.")
    )]
    NodeConflict {
        name: String,
        existing: String,
        requested: String,
    },

    #[error("bounds ({min}, {max}) of caseframe \"{caseframe}\" are invalid for {count} argument(s)")]
    #[diagnostic(
        code(semnet::schema::invalid_min_max),
        help("Connective bounds must satisfy min <= max <= number of arguments.")
    )]
    InvalidMinMax {
        caseframe: String,
        min: usize,
        max: usize,
        count: usize,
    },

    #[error("unknown node \"{name}\"")]
    #[diagnostic(
        code(semnet::schema::unknown_node),
        help("`wftN` references must name a molecular node that already exists in the network.")
    )]
    UnknownNode { name: String },
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// Inclusive filler-count bounds of a slot; `max = None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillerBounds {
    pub min: usize,
    pub max: Option<usize>,
}

impl fmt::Display for FillerBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "[{}, {}]", self.min, max),
            None => write!(f, "[{}, unbounded)", self.min),
        }
    }
}

/// A slot received a number of fillers outside its `[min, max]` bounds.
#[derive(Debug, Error, Diagnostic)]
#[error("slot \"{slot}\" of caseframe \"{caseframe}\" takes {bounds} filler(s), got {actual}")]
#[diagnostic(
    code(semnet::node::cardinality),
    help("Add or remove fillers so the count falls within the slot's bounds.")
)]
pub struct CardinalityError {
    pub caseframe: String,
    pub slot: String,
    pub bounds: FillerBounds,
    pub actual: usize,
}

/// A filler's semantic type is unrelated to the slot's semantic type.
#[derive(Debug, Error, Diagnostic)]
#[error(
    "filler \"{filler}\" of type {filler_type} cannot fill slot \"{slot}\" of caseframe \
     \"{caseframe}\", which requires {expected}"
)]
#[diagnostic(
    code(semnet::node::type_constraint),
    help(
        "A filler must be a subtype of the slot's type, or a supertype that can be refined \
         to it. Check the type hierarchy with `is_subtype()`."
    )
)]
pub struct TypeConstraintError {
    pub caseframe: String,
    pub slot: String,
    pub filler: String,
    pub filler_type: String,
    pub expected: String,
}

// ---------------------------------------------------------------------------
// Context errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ContextError {
    #[error("context \"{name}\" is already defined")]
    #[diagnostic(
        code(semnet::context::duplicate),
        help("Context names are unique. Switch to the existing context with `set_current_context()`.")
    )]
    Duplicate { name: String },

    #[error("parent context \"{parent}\" of \"{name}\" does not exist")]
    #[diagnostic(
        code(semnet::context::unknown_parent),
        help("Define the parent context first. Every context descends from \"default\".")
    )]
    UnknownParent { name: String, parent: String },

    #[error("context \"{name}\" does not exist")]
    #[diagnostic(
        code(semnet::context::unknown),
        help("Define the context with `define_context()` before using it.")
    )]
    Unknown { name: String },

    #[error("context name \"{name}\" is not allowed")]
    #[diagnostic(
        code(semnet::context::invalid_name),
        help("Context names must start with a letter and contain only letters, digits and underscores.")
    )]
    InvalidName { name: String },

    #[error("node {node} does not exist")]
    #[diagnostic(
        code(semnet::context::unknown_node),
        help("Only nodes created by this network can be added to its contexts.")
    )]
    UnknownNode { node: u32 },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid network configuration: {message}")]
    #[diagnostic(
        code(semnet::config::invalid),
        help("The configuration is TOML with optional keys `enforce_name_syntax` and `seed_ontology` (both booleans).")
    )]
    Invalid { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_display() {
        assert_eq!(FillerBounds { min: 2, max: None }.to_string(), "[2, unbounded)");
        assert_eq!(FillerBounds { min: 1, max: Some(1) }.to_string(), "[1, 1]");
    }

    #[test]
    fn cardinality_message_names_slot() {
        let err = CardinalityError {
            caseframe: "and".into(),
            slot: "and".into(),
            bounds: FillerBounds { min: 2, max: None },
            actual: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("slot \"and\""));
        assert!(msg.contains("got 1"));
    }

    #[test]
    fn transparent_wrapping_keeps_code() {
        let err: NetError = ContextError::Unknown { name: "nope".into() }.into();
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("semnet::context::unknown"));
    }
}
