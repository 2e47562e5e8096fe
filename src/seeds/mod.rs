//! Schema packs: TOML-defined bundles of types, slots and caseframes.
//!
//! A schema pack declares the vocabulary a network understands. The built-in
//! ontology is itself a pack, `core`, bundled into the binary and applied
//! when a network is created. Users extend a network with their own packs
//! through [`Network::apply_schema_pack`](crate::network::Network::apply_schema_pack).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::schema::{AdjRule, SlotSpec};

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error("schema pack not found: \"{id}\"")]
    #[diagnostic(
        code(semnet::seed::not_found),
        help("The bundled pack is \"core\". Load other packs with `SeedRegistry::discover()`.")
    )]
    NotFound { id: String },

    #[error("failed to parse schema pack \"{id}\": {message}")]
    #[diagnostic(
        code(semnet::seed::parse),
        help(
            "A pack is TOML with a [seed] table (id, name, version, description) and \
             optional [[types]], [[slots]], [[caseframes]] and [[duals]] arrays."
        )
    )]
    Parse { id: String, message: String },

    #[error("failed to read schema pack file: {path}")]
    #[diagnostic(code(semnet::seed::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type SeedResult<T> = std::result::Result<T, SeedError>;

// ── Pack data model ─────────────────────────────────────────────────────

/// A schema pack.
#[derive(Debug, Clone)]
pub struct SchemaPack {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub types: Vec<SeedType>,
    pub slots: Vec<SeedSlot>,
    pub caseframes: Vec<SeedCaseframe>,
    pub duals: Vec<SeedDual>,
    /// Source: `Bundled` or `External(path)`.
    pub source: SeedSource,
}

/// Where a pack came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// Bundled into the binary via `include_str!`.
    Bundled,
    /// Loaded from an external file.
    External(PathBuf),
    /// Built from a string at runtime.
    Inline,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedType {
    pub name: String,
    #[serde(default)]
    pub parents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedSlot {
    pub name: String,
    #[serde(rename = "type")]
    pub sem_type: String,
    #[serde(default)]
    pub docstring: String,
    #[serde(default = "default_pos_adj")]
    pub pos_adj: AdjRule,
    #[serde(default = "default_neg_adj")]
    pub neg_adj: AdjRule,
    #[serde(default = "default_min")]
    pub min: usize,
    #[serde(default)]
    pub max: Option<usize>,
    #[serde(default)]
    pub path: Option<String>,
}

fn default_pos_adj() -> AdjRule {
    AdjRule::Reduce
}

fn default_neg_adj() -> AdjRule {
    AdjRule::Expand
}

fn default_min() -> usize {
    1
}

impl SeedSlot {
    /// The slot definition this entry describes.
    pub fn to_spec(&self) -> SlotSpec {
        let mut spec = SlotSpec::new(&self.name, &self.sem_type)
            .docstring(&self.docstring)
            .pos_adj(self.pos_adj)
            .neg_adj(self.neg_adj)
            .min(self.min);
        if let Some(max) = self.max {
            spec = spec.max(max);
        }
        if let Some(path) = &self.path {
            spec = spec.path(path);
        }
        spec
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedCaseframe {
    pub name: String,
    #[serde(rename = "type")]
    pub result_type: String,
    pub slots: Vec<String>,
    #[serde(default)]
    pub docstring: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Two caseframes that are each other's negation.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedDual {
    pub a: String,
    pub b: String,
}

/// Report after applying a pack.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub id: String,
    pub types: usize,
    pub slots: usize,
    pub caseframes: usize,
    pub aliases: usize,
    pub duals: usize,
    pub already_applied: bool,
}

// ── TOML deserialization helpers ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SeedToml {
    seed: SeedMeta,
    #[serde(default)]
    types: Vec<SeedType>,
    #[serde(default)]
    slots: Vec<SeedSlot>,
    #[serde(default)]
    caseframes: Vec<SeedCaseframe>,
    #[serde(default)]
    duals: Vec<SeedDual>,
}

#[derive(Debug, Deserialize)]
struct SeedMeta {
    id: String,
    name: String,
    version: String,
    #[serde(default)]
    description: String,
}

impl SchemaPack {
    /// Parse a pack from TOML text.
    pub fn from_toml_str(toml_str: &str) -> SeedResult<Self> {
        parse_seed_toml(toml_str, SeedSource::Inline)
    }

    /// Read and parse a pack file.
    pub fn from_path(path: &Path) -> SeedResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        parse_seed_toml(&content, SeedSource::External(path.to_path_buf()))
    }

    /// The built-in ontology.
    pub fn core() -> SeedResult<Self> {
        parse_seed_toml(CORE_TOML, SeedSource::Bundled)
    }
}

// ── Bundled packs ───────────────────────────────────────────────────────

const CORE_TOML: &str = include_str!("../../data/seeds/core/seed.toml");

fn parse_seed_toml(toml_str: &str, source: SeedSource) -> SeedResult<SchemaPack> {
    let parsed: SeedToml = toml::from_str(toml_str).map_err(|e| SeedError::Parse {
        id: "(unknown)".into(),
        message: e.to_string(),
    })?;
    Ok(SchemaPack {
        id: parsed.seed.id,
        name: parsed.seed.name,
        version: parsed.seed.version,
        description: parsed.seed.description,
        types: parsed.types,
        slots: parsed.slots,
        caseframes: parsed.caseframes,
        duals: parsed.duals,
        source,
    })
}

// ── Seed Registry ───────────────────────────────────────────────────────

/// Registry of available packs (bundled + discovered from disk).
pub struct SeedRegistry {
    packs: HashMap<String, SchemaPack>,
}

impl SeedRegistry {
    /// Create a registry with only the bundled pack.
    pub fn bundled() -> Self {
        let mut packs = HashMap::new();
        match SchemaPack::core() {
            Ok(pack) => {
                packs.insert(pack.id.clone(), pack);
            }
            Err(e) => tracing::warn!(seed = "core", "Failed to parse bundled pack: {e}"),
        }
        Self { packs }
    }

    /// Discover packs from a directory (in addition to the bundled pack).
    ///
    /// Each subdirectory containing a `seed.toml` is loaded as a pack.
    pub fn discover(seeds_dir: &Path) -> Self {
        let mut registry = Self::bundled();

        if let Ok(entries) = std::fs::read_dir(seeds_dir) {
            for entry in entries.flatten() {
                let seed_file = entry.path().join("seed.toml");
                if !seed_file.is_file() {
                    continue;
                }
                match SchemaPack::from_path(&seed_file) {
                    Ok(pack) => {
                        registry.packs.insert(pack.id.clone(), pack);
                    }
                    Err(e) => {
                        tracing::warn!(path = %seed_file.display(), "Failed to load schema pack: {e}");
                    }
                }
            }
        }

        registry
    }

    /// List all available packs, sorted by id.
    pub fn list(&self) -> Vec<&SchemaPack> {
        let mut packs: Vec<&SchemaPack> = self.packs.values().collect();
        packs.sort_by(|a, b| a.id.cmp(&b.id));
        packs
    }

    /// Get a pack by id.
    pub fn get(&self, id: &str) -> SeedResult<&SchemaPack> {
        self.packs
            .get(id)
            .ok_or_else(|| SeedError::NotFound { id: id.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_pack_parses() {
        let pack = SchemaPack::core().unwrap();
        assert_eq!(pack.id, "core");
        assert_eq!(pack.source, SeedSource::Bundled);
        assert!(pack.types.iter().any(|t| t.name == "Proposition"));
        let nor = pack.caseframes.iter().find(|c| c.name == "nor").unwrap();
        assert_eq!(nor.aliases, vec!["not".to_string()]);
        assert_eq!(pack.duals.len(), 2);
    }

    #[test]
    fn slot_defaults_apply() {
        let pack = SchemaPack::from_toml_str(
            r#"
            [seed]
            id = "pets"
            name = "Pets"
            version = "0.1.0"

            [[slots]]
            name = "owner"
            type = "Entity"
            "#,
        )
        .unwrap();
        let owner = &pack.slots[0];
        assert_eq!(owner.pos_adj, AdjRule::Reduce);
        assert_eq!(owner.neg_adj, AdjRule::Expand);
        assert_eq!((owner.min, owner.max), (1, None));
        assert_eq!(pack.source, SeedSource::Inline);
    }

    #[test]
    fn unknown_rule_label_is_a_parse_error() {
        let err = SchemaPack::from_toml_str(
            r#"
            [seed]
            id = "bad"
            name = "Bad"
            version = "0.1.0"

            [[slots]]
            name = "owner"
            type = "Entity"
            pos_adj = "sideways"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SeedError::Parse { .. }));
    }

    #[test]
    fn registry_finds_core() {
        let reg = SeedRegistry::bundled();
        assert!(reg.get("core").is_ok());
        assert!(matches!(reg.get("nope"), Err(SeedError::NotFound { .. })));
        assert_eq!(reg.list().len(), 1);
    }
}
