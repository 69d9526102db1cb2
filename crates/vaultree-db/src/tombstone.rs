//! Permanent deletion and the tombstone ledger
//!
//! A tombstone records that a node with a given id was deleted at a given
//! time, so two diverging copies of a database can reconcile deletions. The
//! ledger is append-only and unbounded; pruning belongs to whatever
//! synchronization process consumes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vaultree_core::{NodeId, VaultResult};

use crate::tree::DetachedSubtree;
use crate::Database;

/// One deletion record. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub id: NodeId,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TombstoneLog {
    items: Vec<Tombstone>,
}

impl TombstoneLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: NodeId, deleted_at: DateTime<Utc>) {
        self.items.push(Tombstone { id, deleted_at });
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.items.iter().any(|t| t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tombstone> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop records for resurrected nodes. Only undo-delete calls this; the
    /// ledger stays append-only for everyone else.
    pub(crate) fn remove_ids(&mut self, ids: &HashSet<NodeId>) {
        self.items.retain(|t| !ids.contains(&t.id));
    }
}

impl Database {
    /// Permanently remove a node (for a group: its whole subtree) from the
    /// live tree, appending one tombstone per destroyed node.
    ///
    /// The detached nodes are returned; keep them to allow
    /// [`undo_delete`](Self::undo_delete), drop them to let the contents
    /// die.
    pub fn delete(&mut self, node: NodeId) -> VaultResult<DetachedSubtree> {
        let parent = self.tree.parent_of(node);
        let detached = self.tree.take_subtree(node)?;

        let now = Utc::now();
        let ids = detached.node_ids();
        for id in &ids {
            self.tombstones.push(*id, now);
        }
        if let Some(parent) = parent {
            self.tree.touch(parent, true, true);
        }

        tracing::debug!(node = %node, tombstones = ids.len(), "deleted subtree");
        Ok(detached)
    }

    /// Reinsert a deleted subtree under `original_parent`.
    ///
    /// The matching tombstones are removed: leaving them would let a later
    /// reconciliation pass delete the resurrected nodes again.
    pub fn undo_delete(&mut self, detached: DetachedSubtree, original_parent: NodeId) -> VaultResult<()> {
        let ids: HashSet<NodeId> = detached.node_ids().into_iter().collect();
        self.tree.restore_subtree(detached, original_parent)?;
        self.tombstones.remove_ids(&ids);
        self.tree.touch(original_parent, true, true);
        Ok(())
    }
}
