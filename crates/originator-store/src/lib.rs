//! # Originator Store
//!
//! Persistence for the node identity record. The record binds a database to
//! one node identity and one public key for the lifetime of the database.
//!
//! ## Key Types
//!
//! - [`NodeInfoStore`] - The async trait for the identity record
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of inserting the record
//! - [`StoredNodeInfo`] - The record as persisted, uninterpreted
//!
//! ## Usage
//!
//! ```rust,no_run
//! use originator_store::{NodeInfoStore, SqliteStore};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("node.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let current = store.select_node_info().await.unwrap();
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Insert-if-absent**: Inserting when a record exists returns `AlreadyExists`
//!   and leaves the stored record untouched
//! - **Single row**: The schema allows exactly one identity record

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, NodeInfoStore, StoredNodeInfo};
