//! # Originator Registry
//!
//! The node roster capability. The registry is the authority on which node
//! identity belongs to which public key; the registrant only reads it.
//!
//! ## Key Types
//!
//! - [`NodeRegistry`] - The async trait for fetching the roster
//! - [`Node`] - A roster entry
//! - [`StaticRegistry`] - In-memory roster for tests and fixed deployments

pub mod error;
pub mod registry;

pub use error::{RegistryError, Result};
pub use registry::memory::StaticRegistry;
pub use registry::{Node, NodeRegistry};
