//! Node identifiers and collision-free generation

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// 128-bit identifier of a group or entry, unique across a whole tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// The all-zero identifier, used as "no reference" in serialized forms.
    pub const ZERO: NodeId = NodeId(Uuid::nil());

    pub fn from_uuid(uuid: Uuid) -> Self {
        NodeId(uuid)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Generate an identifier not present in `in_use`.
///
/// Pure over its inputs: the caller supplies the set of identifiers already
/// in the tree and the random source, so generation is deterministic under a
/// seeded rng. The retry loop guards against the astronomically unlikely
/// collision; it terminates because the id space dwarfs any real tree.
pub fn fresh_id(in_use: &HashSet<NodeId>, rng: &mut impl RngCore) -> NodeId {
    loop {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        let id = NodeId(Uuid::from_bytes(bytes));
        if !id.is_zero() && !in_use.contains(&id) {
            return id;
        }
    }
}
