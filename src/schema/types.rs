//! Semantic type hierarchy: a multi-parent DAG with subsumption queries.
//!
//! Types are append-only and a type's parents must exist before it does, so
//! the hierarchy can never contain a cycle. The transitive closure of each
//! type's ancestors is computed once, when the type is defined, which makes
//! `is_subtype` a constant-time lookup.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::SchemaError;

/// The root type every other type descends from.
pub const ROOT_TYPE: &str = "Entity";

/// A named semantic type and its direct parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticType {
    pub name: String,
    pub parents: Vec<String>,
}

/// Cached subsumption lattice over all defined types.
#[derive(Debug, Clone)]
pub struct TypeHierarchy {
    types: HashMap<String, SemanticType>,
    /// For type T, every strict ancestor of T (transitively).
    ancestors: HashMap<String, HashSet<String>>,
    /// Definition order, for deterministic enumeration.
    order: Vec<String>,
}

impl Default for TypeHierarchy {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeHierarchy {
    /// Create a hierarchy containing only the root type.
    pub fn new() -> Self {
        let mut types = HashMap::new();
        types.insert(
            ROOT_TYPE.to_string(),
            SemanticType {
                name: ROOT_TYPE.to_string(),
                parents: Vec::new(),
            },
        );
        let mut ancestors = HashMap::new();
        ancestors.insert(ROOT_TYPE.to_string(), HashSet::new());
        Self {
            types,
            ancestors,
            order: vec![ROOT_TYPE.to_string()],
        }
    }

    /// Define a new type. An empty parent list makes it a child of the root.
    pub fn define(&mut self, name: &str, parents: &[&str]) -> Result<(), SchemaError> {
        if self.types.contains_key(name) {
            return Err(SchemaError::DuplicateType { name: name.into() });
        }
        if let Some(missing) = parents.iter().find(|p| !self.types.contains_key(**p)) {
            return Err(SchemaError::UnknownType {
                name: (*missing).into(),
            });
        }

        let parents: Vec<String> = if parents.is_empty() {
            vec![ROOT_TYPE.to_string()]
        } else {
            let mut seen = HashSet::new();
            parents
                .iter()
                .filter(|p| seen.insert(**p))
                .map(|p| p.to_string())
                .collect()
        };

        let mut closure = HashSet::new();
        for parent in &parents {
            closure.insert(parent.clone());
            if let Some(above) = self.ancestors.get(parent) {
                closure.extend(above.iter().cloned());
            }
        }

        tracing::debug!(name, parents = ?parents, "defined type");
        self.ancestors.insert(name.to_string(), closure);
        self.types.insert(
            name.to_string(),
            SemanticType {
                name: name.to_string(),
                parents,
            },
        );
        self.order.push(name.to_string());
        Ok(())
    }

    /// Whether `sub` is `sup` or one of its (transitive) descendants.
    ///
    /// Unknown names are only subtypes of themselves.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        sub == sup
            || self
                .ancestors
                .get(sub)
                .is_some_and(|above| above.contains(sup))
    }

    /// Whether either type subsumes the other.
    pub fn comparable(&self, a: &str, b: &str) -> bool {
        self.is_subtype(a, b) || self.is_subtype(b, a)
    }

    /// Whether a type with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Look up a type by name.
    pub fn get(&self, name: &str) -> Option<&SemanticType> {
        self.types.get(name)
    }

    /// Direct parents of a type.
    pub fn parents(&self, name: &str) -> &[String] {
        self.types
            .get(name)
            .map(|t| t.parents.as_slice())
            .unwrap_or(&[])
    }

    /// All strict ancestors of a type, sorted by name.
    pub fn ancestors(&self, name: &str) -> BTreeSet<&str> {
        self.ancestors
            .get(name)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// All types in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &SemanticType> {
        self.order.iter().filter_map(|n| self.types.get(n))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_exists() {
        let h = TypeHierarchy::new();
        assert!(h.contains(ROOT_TYPE));
        assert!(h.is_subtype(ROOT_TYPE, ROOT_TYPE));
    }

    #[test]
    fn parentless_types_hang_off_root() {
        let mut h = TypeHierarchy::new();
        h.define("Thing", &[]).unwrap();
        assert_eq!(h.parents("Thing"), ["Entity".to_string()]);
        assert!(h.is_subtype("Thing", "Entity"));
        assert!(!h.is_subtype("Entity", "Thing"));
    }

    #[test]
    fn subsumption_is_transitive() {
        let mut h = TypeHierarchy::new();
        h.define("Thing", &[]).unwrap();
        h.define("Category", &["Thing"]).unwrap();
        h.define("Species", &["Category"]).unwrap();
        assert!(h.is_subtype("Species", "Thing"));
        assert!(h.is_subtype("Species", "Entity"));
        assert!(!h.is_subtype("Thing", "Species"));
    }

    #[test]
    fn multiple_parents() {
        let mut h = TypeHierarchy::new();
        h.define("Agent", &[]).unwrap();
        h.define("Thing", &[]).unwrap();
        h.define("Robot", &["Agent", "Thing"]).unwrap();
        assert!(h.is_subtype("Robot", "Agent"));
        assert!(h.is_subtype("Robot", "Thing"));
        assert!(!h.comparable("Agent", "Thing"));
        assert_eq!(
            h.ancestors("Robot").into_iter().collect::<Vec<_>>(),
            vec!["Agent", "Entity", "Thing"]
        );
    }

    #[test]
    fn duplicate_and_unknown_parent_rejected() {
        let mut h = TypeHierarchy::new();
        h.define("Thing", &[]).unwrap();
        assert!(matches!(
            h.define("Thing", &[]),
            Err(SchemaError::DuplicateType { .. })
        ));
        assert!(matches!(
            h.define("Robot", &["Machine"]),
            Err(SchemaError::UnknownType { name }) if name == "Machine"
        ));
        assert!(!h.contains("Robot"));
    }
}
