//! Error types for the registry module.

use thiserror::Error;

/// Errors that can occur while reading the node roster.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The roster could not be fetched.
    #[error("registry unavailable: {0}")]
    Unavailable(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
