//! Identity resolution: which registry slot does our key own?

use originator_core::PublicKey;
use originator_registry::{Node, NodeRegistry};

use crate::error::{RegistrantError, Result};
use crate::registrant::DuplicateKeyPolicy;

/// Find the roster entry whose signing key equals `public_key`.
///
/// The registry is expected to hold each key at most once. When it doesn't,
/// `policy` decides between taking the first entry and failing.
pub fn resolve_node(
    nodes: &[Node],
    public_key: &PublicKey,
    policy: DuplicateKeyPolicy,
) -> Result<Node> {
    let mut matches = nodes.iter().filter(|n| &n.signing_key == public_key);

    let first = matches.next().ok_or(RegistrantError::NotRegistered)?;
    let others: Vec<_> = matches.map(|n| n.node_id).collect();

    if !others.is_empty() {
        let mut node_ids = vec![first.node_id];
        node_ids.extend(others);

        match policy {
            DuplicateKeyPolicy::FirstMatch => {
                tracing::warn!(
                    ?node_ids,
                    chosen = %first.node_id,
                    "public key registered more than once, using first entry"
                );
            }
            DuplicateKeyPolicy::Reject => {
                return Err(RegistrantError::DuplicateRegistration(node_ids));
            }
        }
    }

    Ok(first.clone())
}

/// Fetch the roster and resolve our entry in it.
pub async fn fetch_registry_record<R>(
    registry: &R,
    public_key: &PublicKey,
    policy: DuplicateKeyPolicy,
) -> Result<Node>
where
    R: NodeRegistry + ?Sized,
{
    let nodes = registry.get_nodes().await?;
    resolve_node(&nodes, public_key, policy)
}
