//! Database identity guard.
//!
//! Prevents mistakes such as:
//! - Running multiple nodes with different private keys against the same DB
//! - Changing a server's configuration while pointing to data in an existing DB
//! - A registry reassigning our key to a different node ID between runs
//!
//! The stored record is compared byte for byte. A value that cannot be
//! interpreted at all still counts as a different identity.

use originator_core::NodeInfo;
use originator_store::{InsertResult, NodeInfoStore, StoredNodeInfo};

use crate::error::{RegistrantError, Result};

/// Bind the database to `info` on first run; verify the binding afterwards.
pub async fn ensure_database_matches<S>(store: &S, info: &NodeInfo) -> Result<()>
where
    S: NodeInfoStore + ?Sized,
{
    match store.insert_node_info(info).await? {
        InsertResult::Inserted => {
            tracing::info!(node_id = %info.node_id, "bound database to node identity");
            Ok(())
        }
        InsertResult::AlreadyExists => {
            let existing = store.select_node_info().await?.ok_or_else(|| {
                tracing::error!(
                    node_id = %info.node_id,
                    "database reports an existing node identity but none could be read"
                );
                RegistrantError::RecordMissing
            })?;
            verify_matches(info, existing)?;

            tracing::info!(node_id = %info.node_id, "database node identity verified");
            Ok(())
        }
    }
}

fn verify_matches(registry: &NodeInfo, database: StoredNodeInfo) -> Result<()> {
    if database.matches(registry) {
        return Ok(());
    }

    if database.node_id != i64::from(registry.node_id.get()) {
        tracing::error!(
            registry = %registry.node_id,
            database = database.node_id,
            "registry node ID does not match ID in database"
        );
        return Err(RegistrantError::NodeIdMismatch {
            registry: registry.node_id,
            database: database.node_id,
        });
    }

    tracing::error!(
        node_id = %registry.node_id,
        registry = %registry.public_key.to_hex(),
        database = %hex::encode(&database.public_key),
        "registry public key does not match public key in database"
    );
    Err(RegistrantError::PublicKeyMismatch {
        registry: registry.public_key,
        database: database.public_key,
    })
}
