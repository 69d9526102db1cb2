//! The group/entry tree
//!
//! Slot model: the tree owns every group and entry in two id-keyed maps;
//! parents list their children as ordered id vectors and children carry
//! their parent's id as a plain lookup key. No owning reference ever points
//! upward, so a cycle is unrepresentable without corrupting both maps.
//!
//! Invariants maintained by every operation:
//! - exactly one root group, the only node with no parent
//! - a node's parent back-reference names a group whose child list contains
//!   the node exactly once
//! - ids are unique across groups and entries at any instant

use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use vaultree_core::{fresh_id, NodeId, VaultError, VaultResult};

use crate::node::{Entry, Group};

/// A visited node during pre-order traversal.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Group(&'a Group),
    Entry(&'a Entry),
}

impl NodeRef<'_> {
    pub fn id(&self) -> NodeId {
        match self {
            NodeRef::Group(g) => g.id,
            NodeRef::Entry(e) => e.id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialTree {
    root: NodeId,
    groups: HashMap<NodeId, Group>,
    entries: HashMap<NodeId, Entry>,
}

/// A subtree removed from the live tree, reinsertable via
/// [`CredentialTree::restore_subtree`]. Holds the nodes by value; dropping
/// it destroys them for good.
#[derive(Debug)]
pub struct DetachedSubtree {
    pub(crate) root: NodeId,
    pub(crate) groups: Vec<Group>,
    pub(crate) entries: Vec<Entry>,
}

impl DetachedSubtree {
    /// Ids of every node in the subtree, detached root first.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = vec![self.root];
        ids.extend(
            self.groups
                .iter()
                .map(|g| g.id)
                .chain(self.entries.iter().map(|e| e.id))
                .filter(|id| *id != self.root),
        );
        ids
    }
}

impl CredentialTree {
    /// Fresh tree holding only a root group with the given name.
    pub fn new(root_name: impl Into<String>) -> Self {
        let root = fresh_id(&HashSet::new(), &mut rand::thread_rng());
        let mut groups = HashMap::new();
        groups.insert(root, Group::new(root, None, root_name));
        CredentialTree {
            root,
            groups,
            entries: HashMap::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn group(&self, id: NodeId) -> Option<&Group> {
        self.groups.get(&id)
    }

    pub fn group_mut(&mut self, id: NodeId) -> Option<&mut Group> {
        self.groups.get_mut(&id)
    }

    pub fn entry(&self, id: NodeId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub fn entry_mut(&mut self, id: NodeId) -> Option<&mut Entry> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.groups.contains_key(&id) || self.entries.contains_key(&id)
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Every id currently claimed by a group or entry.
    pub fn in_use_ids(&self) -> HashSet<NodeId> {
        self.groups
            .keys()
            .chain(self.entries.keys())
            .copied()
            .collect()
    }

    /// Parent of a node, `None` for the root (or an unknown id).
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        if let Some(g) = self.groups.get(&id) {
            return g.parent;
        }
        self.entries.get(&id).and_then(|e| e.parent)
    }

    /// Whether `id` equals `ancestor` or lies anywhere below it.
    ///
    /// Iterative walk up the parent chain; depth bounds it.
    pub fn is_inside(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent_of(node);
        }
        false
    }

    // ── Node creation ─────────────────────────────────────────────────────

    /// Create an empty group under `parent` with a fresh unique id.
    pub fn create_group(&mut self, parent: NodeId) -> VaultResult<NodeId> {
        self.create_group_with(parent, &mut rand::thread_rng())
    }

    /// As [`create_group`](Self::create_group) with an injected random
    /// source, for deterministic tests.
    pub fn create_group_with(&mut self, parent: NodeId, rng: &mut impl RngCore) -> VaultResult<NodeId> {
        if !self.groups.contains_key(&parent) {
            return Err(VaultError::UnknownNode(parent.as_uuid()));
        }
        let id = fresh_id(&self.in_use_ids(), rng);
        self.groups.insert(id, Group::new(id, Some(parent), ""));
        self.groups
            .get_mut(&parent)
            .expect("parent checked above")
            .groups
            .push(id);
        Ok(id)
    }

    /// Create an empty entry under `parent` with a fresh unique id.
    pub fn create_entry(&mut self, parent: NodeId) -> VaultResult<NodeId> {
        self.create_entry_with(parent, &mut rand::thread_rng())
    }

    pub fn create_entry_with(&mut self, parent: NodeId, rng: &mut impl RngCore) -> VaultResult<NodeId> {
        if !self.groups.contains_key(&parent) {
            return Err(VaultError::UnknownNode(parent.as_uuid()));
        }
        let id = fresh_id(&self.in_use_ids(), rng);
        self.entries.insert(id, Entry::new(id, Some(parent)));
        self.groups
            .get_mut(&parent)
            .expect("parent checked above")
            .entries
            .push(id);
        Ok(id)
    }

    // ── Structural mutation ───────────────────────────────────────────────

    /// Detach `node` from its parent's child list and clear the
    /// back-reference. The node stays in the tree's slot maps.
    pub fn detach(&mut self, node: NodeId) -> VaultResult<()> {
        let parent = self
            .parent_of(node)
            .ok_or_else(|| VaultError::TreeIntegrity(format!("cannot detach {node}: no parent")))?;

        let parent_group = self
            .groups
            .get_mut(&parent)
            .ok_or_else(|| VaultError::TreeIntegrity(format!("parent {parent} of {node} is not in the tree")))?;

        let list = if self.entries.contains_key(&node) {
            &mut parent_group.entries
        } else {
            &mut parent_group.groups
        };
        let position = list.iter().position(|c| *c == node).ok_or_else(|| {
            VaultError::TreeIntegrity(format!("parent {parent} does not list child {node}"))
        })?;
        list.remove(position);

        self.set_parent(node, None);
        Ok(())
    }

    /// Append `node` to `new_parent`'s child list and set the
    /// back-reference. The node must currently be detached.
    pub fn attach(&mut self, node: NodeId, new_parent: NodeId) -> VaultResult<()> {
        if !self.groups.contains_key(&new_parent) {
            return Err(VaultError::UnknownNode(new_parent.as_uuid()));
        }
        if self.parent_of(node).is_some() {
            return Err(VaultError::TreeIntegrity(format!("{node} is already attached")));
        }
        if self.groups.contains_key(&node) {
            // Reattaching a group below itself would orphan the subtree.
            if self.is_inside(new_parent, node) {
                return Err(VaultError::TreeIntegrity(format!(
                    "{new_parent} lies inside {node}; attach would create a cycle"
                )));
            }
            self.groups.get_mut(&new_parent).expect("checked").groups.push(node);
        } else if self.entries.contains_key(&node) {
            self.groups.get_mut(&new_parent).expect("checked").entries.push(node);
        } else {
            return Err(VaultError::UnknownNode(node.as_uuid()));
        }
        self.set_parent(node, Some(new_parent));
        Ok(())
    }

    /// Atomic detach-then-reattach. Validates the destination before any
    /// mutation so a failure leaves the tree untouched.
    pub fn move_node(&mut self, node: NodeId, new_parent: NodeId) -> VaultResult<()> {
        if node == self.root {
            return Err(VaultError::TreeIntegrity("cannot move the root group".into()));
        }
        if !self.groups.contains_key(&new_parent) {
            return Err(VaultError::UnknownNode(new_parent.as_uuid()));
        }
        if self.groups.contains_key(&node) && self.is_inside(new_parent, node) {
            return Err(VaultError::TreeIntegrity(format!(
                "cannot move {node} below its own descendant {new_parent}"
            )));
        }
        self.detach(node)?;
        self.attach(node, new_parent)?;
        self.touch_location(node);
        Ok(())
    }

    /// Remove a whole subtree (or a single entry) from the slot maps.
    ///
    /// Returns the detached nodes so the caller can reinsert them; dropping
    /// the return value destroys them.
    pub fn take_subtree(&mut self, node: NodeId) -> VaultResult<DetachedSubtree> {
        if node == self.root {
            return Err(VaultError::TreeIntegrity("cannot delete the root group".into()));
        }
        if self.parent_of(node).is_some() {
            self.detach(node)?;
        } else if !self.contains(node) {
            return Err(VaultError::UnknownNode(node.as_uuid()));
        }

        let mut groups = Vec::new();
        let mut entries = Vec::new();

        if let Some(entry) = self.entries.remove(&node) {
            entries.push(entry);
            return Ok(DetachedSubtree { root: node, groups, entries });
        }

        // Breadth order is fine here; only membership matters.
        let mut queue = VecDeque::from([node]);
        while let Some(group_id) = queue.pop_front() {
            let group = self.groups.remove(&group_id).ok_or_else(|| {
                VaultError::TreeIntegrity(format!("child list references missing group {group_id}"))
            })?;
            for entry_id in &group.entries {
                let entry = self.entries.remove(entry_id).ok_or_else(|| {
                    VaultError::TreeIntegrity(format!("child list references missing entry {entry_id}"))
                })?;
                entries.push(entry);
            }
            queue.extend(group.groups.iter().copied());
            groups.push(group);
        }

        Ok(DetachedSubtree { root: node, groups, entries })
    }

    /// Reinsert a subtree produced by [`take_subtree`](Self::take_subtree)
    /// under `parent`.
    pub fn restore_subtree(&mut self, subtree: DetachedSubtree, parent: NodeId) -> VaultResult<()> {
        if !self.groups.contains_key(&parent) {
            return Err(VaultError::UnknownNode(parent.as_uuid()));
        }
        for id in subtree.node_ids() {
            if self.contains(id) {
                return Err(VaultError::TreeIntegrity(format!(
                    "cannot restore subtree: id {id} is already in the tree"
                )));
            }
        }

        let DetachedSubtree { root, groups, entries } = subtree;
        for group in groups {
            self.groups.insert(group.id, group);
        }
        for entry in entries {
            self.entries.insert(entry.id, entry);
        }
        self.set_parent(root, None);
        self.attach(root, parent)?;
        self.touch_location(root);
        Ok(())
    }

    // ── Timestamps ────────────────────────────────────────────────────────

    /// Update the access timestamp (and the modification timestamp when
    /// `modified`). With `touch_parents`, every ancestor is marked modified
    /// too, so any group's "last changed" reflects changes anywhere below
    /// it. The ancestor walk is iterative; tree depth bounds it, not stack.
    pub fn touch(&mut self, node: NodeId, modified: bool, touch_parents: bool) {
        let now = Utc::now();

        if let Some(entry) = self.entries.get_mut(&node) {
            entry.times.accessed = now;
            if modified {
                entry.times.modified = now;
            }
        } else if let Some(group) = self.groups.get_mut(&node) {
            group.times.accessed = now;
            if modified {
                group.times.modified = now;
            }
        } else {
            return;
        }

        if !touch_parents {
            return;
        }
        let mut current = self.parent_of(node);
        while let Some(ancestor) = current {
            let Some(group) = self.groups.get_mut(&ancestor) else { break };
            group.times.accessed = now;
            group.times.modified = now;
            current = group.parent;
        }
    }

    /// Record a reparenting on the node's timestamps.
    pub fn touch_location(&mut self, node: NodeId) {
        let now = Utc::now();
        if let Some(entry) = self.entries.get_mut(&node) {
            entry.times.location_changed = now;
        } else if let Some(group) = self.groups.get_mut(&node) {
            group.times.location_changed = now;
        }
    }

    // ── Traversal ─────────────────────────────────────────────────────────

    /// Pre-order walk: each group is visited, then its immediate entries,
    /// then its child groups recursively. Search, the version policy, and
    /// flattening all reuse this order.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder {
            tree: self,
            group_stack: vec![self.root],
            entry_queue: VecDeque::new(),
        }
    }

    /// All entries in traversal order.
    pub fn entries_preorder(&self) -> impl Iterator<Item = &Entry> {
        self.iter().filter_map(|node| match node {
            NodeRef::Entry(e) => Some(e),
            NodeRef::Group(_) => None,
        })
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if let Some(g) = self.groups.get_mut(&node) {
            g.parent = parent;
        } else if let Some(e) = self.entries.get_mut(&node) {
            e.parent = parent;
        }
    }
}

/// Explicit-stack pre-order iterator over a [`CredentialTree`].
pub struct Preorder<'a> {
    tree: &'a CredentialTree,
    group_stack: Vec<NodeId>,
    entry_queue: VecDeque<NodeId>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        loop {
            if let Some(entry_id) = self.entry_queue.pop_front() {
                match self.tree.entries.get(&entry_id) {
                    Some(entry) => return Some(NodeRef::Entry(entry)),
                    None => {
                        tracing::warn!(entry = %entry_id, "child list references missing entry, skipping");
                        continue;
                    }
                }
            }
            let group_id = self.group_stack.pop()?;
            let Some(group) = self.tree.groups.get(&group_id) else {
                tracing::warn!(group = %group_id, "child list references missing group, skipping");
                continue;
            };
            self.entry_queue.extend(group.entries.iter().copied());
            // Reversed so the first child group is popped first.
            self.group_stack.extend(group.groups.iter().rev().copied());
            return Some(NodeRef::Group(group));
        }
    }
}
