//! Sequence identifiers.
//!
//! A sequence ID packs a node's identity and a local message identifier into
//! one `u64`: the node ID occupies the top 16 bits, the local ID the low 48.
//!
//! ```text
//!  63            48 47                                             0
//! +----------------+------------------------------------------------+
//! |    node_id     |                    local_id                    |
//! +----------------+------------------------------------------------+
//! ```
//!
//! For a fixed node, sequence IDs order exactly like local IDs. Sequence IDs
//! of different nodes never collide because the node bits differ.

use std::fmt;

use crate::error::CoreError;
use crate::types::NodeId;

/// Bit offset of the node ID within a sequence ID.
pub const NODE_ID_SHIFT: u32 = 48;

/// Largest local ID that fits in a sequence ID.
pub const MAX_LOCAL_ID: i64 = (1 << NODE_ID_SHIFT) - 1;

const LOCAL_ID_MASK: u64 = MAX_LOCAL_ID as u64;

/// Returns true if `local_id` can be packed into a sequence ID.
///
/// Local IDs start at 1. Zero, negative values and values wider than
/// 48 bits are rejected.
pub const fn is_valid_local_id(local_id: i64) -> bool {
    local_id > 0 && local_id <= MAX_LOCAL_ID
}

/// A node-scoped, globally unique sequence identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SequenceId(pub u64);

impl SequenceId {
    /// Pack a node ID and a local ID.
    pub fn new(node_id: NodeId, local_id: i64) -> Result<Self, CoreError> {
        if !is_valid_local_id(local_id) {
            return Err(CoreError::InvalidLocalId(local_id));
        }
        Ok(Self(
            (u64::from(node_id.get()) << NODE_ID_SHIFT) | local_id as u64,
        ))
    }

    /// Wrap a raw value.
    pub const fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The originating node.
    pub const fn node_id(&self) -> NodeId {
        NodeId((self.0 >> NODE_ID_SHIFT) as u16)
    }

    /// The node-local identifier.
    pub const fn local_id(&self) -> i64 {
        (self.0 & LOCAL_ID_MASK) as i64
    }
}

impl fmt::Debug for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SequenceId({}:{})", self.node_id(), self.local_id())
    }
}

impl fmt::Display for SequenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
