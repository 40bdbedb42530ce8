//! # Originator
//!
//! Node-identity bootstrap and envelope stamping for a node that accepts
//! client messages into a shared, replicated log.
//!
//! On startup a [`Registrant`] proves the configured key owns a slot in the
//! node registry and that the local database belongs to that slot. After
//! that it attests to every accepted message with a globally unique
//! sequence ID, a timestamp and a recoverable signature.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use originator::{Registrant, RegistrantConfig};
//! use originator::registry::StaticRegistry;
//! use originator::store::SqliteStore;
//!
//! async fn example(registry: StaticRegistry) {
//!     let store = SqliteStore::open("node.db").unwrap();
//!     let config = RegistrantConfig::new("0x...");
//!
//!     let registrant = Registrant::new(&registry, &store, &config).await.unwrap();
//!     println!("running as node {}", registrant.node_id());
//! }
//! ```
//!
//! ## Architecture
//!
//! The crate is composed of:
//! - `originator-core`: keys, signatures, sequence IDs, envelopes
//! - `originator-registry`: the node roster abstraction
//! - `originator-store`: the persisted identity record
//! - `originator` (this crate): resolution, the database guard and signing

pub mod error;
pub mod guard;
pub mod registrant;
pub mod resolver;

pub use error::{ErrorCategory, RegistrantError, Result, SignError};
pub use registrant::{DuplicateKeyPolicy, Registrant, RegistrantConfig};

// Re-export component crates
pub use originator_core as core;
pub use originator_registry as registry;
pub use originator_store as store;

// Re-export commonly used types
pub use originator_core::{
    NodeId, NodeInfo, OriginatorEnvelope, PayerEnvelope, PublicKey, SequenceId, StagedEnvelope,
    UnsignedOriginatorEnvelope,
};
pub use originator_registry::{Node, NodeRegistry};
pub use originator_store::NodeInfoStore;
