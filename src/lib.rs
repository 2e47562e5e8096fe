// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # semnet
//!
//! A typed semantic-network knowledge base in the SNePS tradition: every
//! proposition, rule and term is a node, and nodes are built from caseframes
//! whose slots are filled by sets of other nodes.
//!
//! ## Architecture
//!
//! - **Schema** (`schema`): semantic type hierarchy, slots with adjustment rules,
//!   caseframes with aliases and negation duals
//! - **Nodes** (`node`): hash-consed store; structurally equal nodes are one node,
//!   and connectives are normalized before interning (`¬¬a = a`, `¬and = nand`)
//! - **Contexts** (`context`): named sets of hypotheses and derived beliefs
//! - **Formulas** (`wft`): a small logic language parsed and lowered into nodes
//! - **Seed packs** (`seeds`): TOML bundles of schema definitions; the built-in
//!   ontology is one of them
//! - **Export** (`export`): serializable snapshots, Graphviz output behind `dot`
//!
//! ## Library usage
//!
//! ```no_run
//! use semnet::network::{Network, NetworkConfig};
//!
//! let mut net = Network::new(NetworkConfig::default()).unwrap();
//! let fido = net.assert_wft("Isa(Fido, Dog)", true).unwrap();
//! let both = net.assert_wft("And(Isa(Fido, Dog), Isa(Rex, Dog))", true).unwrap();
//! assert!(net.is_asserted("default", fido).unwrap());
//! assert_ne!(fido, both);
//! ```

pub mod context;
pub mod error;
pub mod export;
pub mod network;
pub mod node;
pub mod schema;
pub mod seeds;
pub mod wft;

pub use error::{NetError, NetResult};
pub use network::{Network, NetworkConfig};
pub use node::NodeId;
