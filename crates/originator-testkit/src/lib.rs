//! # Originator Testkit
//!
//! Testing utilities for the originator crates.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Known SIDs and canonical envelope bytes for cross-implementation checks
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Test nodes, registries and failing collaborators
//!
//! ## Golden Vectors
//!
//! ```rust
//! use originator_testkit::vectors::verify_all_vectors;
//!
//! verify_all_vectors().expect("golden vectors hold");
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use originator_testkit::fixtures::TestNetwork;
//!
//! let network = TestNetwork::new(&[100, 200]);
//! let registry = network.registry();
//! let secret = network.node(0).prefixed_secret_hex();
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{
    fixed_time, payer_envelope, random_payload, staged_envelope, InconsistentStore, TestNetwork,
    TestNode, UnavailableRegistry, UnavailableStore,
};
pub use vectors::{all_vectors, unsigned_envelope_from_vector, verify_all_vectors, GoldenVector};
