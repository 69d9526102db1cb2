//! Recycle-bin soft deletion
//!
//! The bin is an ordinary group under root, created lazily on first use with
//! searching and autotype disabled so its contents stay out of lookups.
//! Undo keeps no relocation history: the caller must remember the original
//! parent, so only a single-level undo is possible.

use vaultree_core::{NodeId, VaultError, VaultResult};

use crate::node::Group;
use crate::Database;

const RECYCLE_BIN_NAME: &str = "Recycle Bin";
const RECYCLE_BIN_ICON: u32 = 43;

impl Database {
    /// The bin group, if it has been created and still exists.
    pub fn recycle_bin(&self) -> Option<&Group> {
        self.recycle_bin_id.and_then(|id| self.tree.group(id))
    }

    /// Whether `node` may be recycled: the feature must be enabled and the
    /// node must not already lie inside the bin subtree (recycling the bin
    /// or its contents into itself is forbidden).
    pub fn can_recycle(&self, node: NodeId) -> bool {
        if !self.config.recycle_bin_enabled || !self.tree.contains(node) {
            return false;
        }
        if node == self.tree.root() {
            return false;
        }
        match self.recycle_bin_id {
            Some(bin) => !self.tree.is_inside(node, bin),
            None => true,
        }
    }

    /// Whether `node` currently sits in the bin subtree.
    pub fn is_backup(&self, node: NodeId) -> bool {
        if !self.config.recycle_bin_enabled {
            return false;
        }
        match self.recycle_bin_id {
            Some(bin) => self.tree.is_inside(node, bin),
            None => false,
        }
    }

    /// Soft-delete: move `node` under the bin, creating the bin first if it
    /// does not exist yet.
    pub fn recycle(&mut self, node: NodeId) -> VaultResult<()> {
        if !self.can_recycle(node) {
            return Err(VaultError::TreeIntegrity(format!(
                "{node} cannot be recycled (feature disabled, unknown node, or already in the bin)"
            )));
        }
        let old_parent = self.tree.parent_of(node).ok_or_else(|| {
            VaultError::TreeIntegrity(format!("cannot recycle {node}: no parent"))
        })?;
        let bin = self.ensure_recycle_bin()?;

        self.tree.detach(node)?;
        self.tree.touch(old_parent, true, true);
        self.tree.attach(node, bin)?;
        self.tree.touch(node, true, false);
        self.tree.touch_location(node);

        tracing::debug!(node = %node, "recycled node");
        Ok(())
    }

    /// Move `node` out of the bin back under `original_parent`.
    ///
    /// No relocation history is kept; the caller supplies the parent it
    /// remembers from before the recycle.
    pub fn undo_recycle(&mut self, node: NodeId, original_parent: NodeId) -> VaultResult<()> {
        let bin = self.recycle_bin_id.ok_or_else(|| {
            VaultError::TreeIntegrity("undo_recycle: no recycle bin exists".into())
        })?;
        if self.tree.parent_of(node) != Some(bin) {
            return Err(VaultError::TreeIntegrity(format!(
                "undo_recycle: {node} is not an immediate child of the bin"
            )));
        }

        // move_node validates the destination before detaching, so a bad
        // original_parent leaves the node in the bin instead of orphaning it.
        self.tree.move_node(node, original_parent)?;
        self.tree.touch(node, true, false);
        Ok(())
    }

    /// Create the bin under root if absent. Self-healing for the case where
    /// the recorded bin id no longer resolves to a live group.
    fn ensure_recycle_bin(&mut self) -> VaultResult<NodeId> {
        if let Some(bin) = self.recycle_bin_id {
            if self.tree.group(bin).is_some() {
                return Ok(bin);
            }
        }

        let bin = self.tree.create_group(self.tree.root())?;
        let group = self.tree.group_mut(bin).expect("just created");
        group.name = RECYCLE_BIN_NAME.into();
        group.icon = RECYCLE_BIN_ICON;
        group.searching_enabled = Some(false);
        group.autotype_enabled = Some(false);
        group.expanded = false;
        self.recycle_bin_id = Some(bin);

        tracing::debug!(bin = %bin, "created recycle bin");
        Ok(bin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ProtectedValue;

    fn database_with_entry() -> (Database, NodeId, NodeId) {
        let mut db = Database::new("vault");
        let group = db.tree.create_group(db.tree.root()).unwrap();
        let entry = db.tree.create_entry(group).unwrap();
        db.tree.entry_mut(entry).unwrap().title = ProtectedValue::plain("paypal");
        (db, group, entry)
    }

    #[test]
    fn recycle_lazily_creates_a_disabled_bin() {
        let (mut db, _, entry) = database_with_entry();
        assert!(db.recycle_bin().is_none());

        db.recycle(entry).unwrap();

        let bin = db.recycle_bin().expect("bin created on first recycle");
        assert_eq!(bin.name, RECYCLE_BIN_NAME);
        assert_eq!(bin.searching_enabled, Some(false));
        assert_eq!(bin.autotype_enabled, Some(false));
        assert!(!bin.expanded);
        assert_eq!(db.tree.parent_of(bin.id), Some(db.tree.root()));
        assert_eq!(db.tree.parent_of(entry), Some(bin.id));
    }

    #[test]
    fn recycle_then_undo_restores_original_parent() {
        let (mut db, group, entry) = database_with_entry();

        db.recycle(entry).unwrap();
        db.undo_recycle(entry, group).unwrap();

        assert_eq!(db.tree.parent_of(entry), Some(group));
        assert_eq!(db.tree.entry(entry).unwrap().title.value(), "paypal");
        let bin = db.recycle_bin().unwrap();
        assert!(!bin.entries.contains(&entry), "bin no longer holds the entry");
    }

    #[test]
    fn cannot_recycle_what_is_already_in_the_bin() {
        let (mut db, _, entry) = database_with_entry();
        db.recycle(entry).unwrap();

        assert!(!db.can_recycle(entry));
        assert!(db.recycle(entry).is_err());
        let bin = db.recycle_bin().unwrap().id;
        assert!(!db.can_recycle(bin), "the bin itself is not recyclable");
    }

    #[test]
    fn can_recycle_respects_the_feature_toggle() {
        let (mut db, _, entry) = database_with_entry();
        assert!(db.can_recycle(entry));

        db.config.recycle_bin_enabled = false;
        assert!(!db.can_recycle(entry));
        assert!(!db.is_backup(entry));
        assert!(db.recycle(entry).is_err());
    }

    #[test]
    fn is_backup_tracks_bin_membership() {
        let (mut db, group, entry) = database_with_entry();
        assert!(!db.is_backup(entry));

        db.recycle(entry).unwrap();
        assert!(db.is_backup(entry));
        assert!(!db.is_backup(group));
    }

    #[test]
    fn recycling_a_group_moves_its_subtree() {
        let (mut db, group, entry) = database_with_entry();

        db.recycle(group).unwrap();
        let bin = db.recycle_bin().unwrap().id;
        assert_eq!(db.tree.parent_of(group), Some(bin));
        // The entry rides along and is now backup material.
        assert_eq!(db.tree.parent_of(entry), Some(group));
        assert!(db.is_backup(entry));
    }

    #[test]
    fn undo_recycle_rejects_nodes_outside_the_bin() {
        let (mut db, group, entry) = database_with_entry();
        assert!(db.undo_recycle(entry, group).is_err(), "no bin yet");

        db.recycle(entry).unwrap();
        assert!(db.undo_recycle(group, db.tree.root()).is_err());
    }

    #[test]
    fn failed_undo_leaves_the_node_in_the_bin() {
        let (mut db, _, entry) = database_with_entry();
        db.recycle(entry).unwrap();
        let bin = db.recycle_bin().unwrap().id;

        let bogus = vaultree_core::NodeId::from_uuid(uuid::Uuid::from_bytes([7; 16]));
        assert!(matches!(db.undo_recycle(entry, bogus), Err(VaultError::UnknownNode(_))));

        // Still an ordinary bin child, reachable from root.
        assert_eq!(db.tree.parent_of(entry), Some(bin));
        assert!(db.tree.iter().any(|node| node.id() == entry));
    }
}
