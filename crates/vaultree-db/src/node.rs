//! Groups, entries, and protected field values

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vaultree_core::{NodeId, NodeTimes};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A string field with an in-memory-protection marker.
///
/// The flag records whether the container stores the field encrypted in
/// memory; this engine keeps the plaintext but zeroizes it on drop and
/// redacts protected values from Debug output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct ProtectedValue {
    value: String,
    #[zeroize(skip)]
    protect: bool,
}

impl ProtectedValue {
    pub fn plain(value: impl Into<String>) -> Self {
        ProtectedValue {
            value: value.into(),
            protect: false,
        }
    }

    pub fn protected(value: impl Into<String>) -> Self {
        ProtectedValue {
            value: value.into(),
            protect: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_protected(&self) -> bool {
        self.protect
    }

    pub fn set(&mut self, value: impl Into<String>) {
        self.value.zeroize();
        self.value = value.into();
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Default for ProtectedValue {
    fn default() -> Self {
        ProtectedValue::plain("")
    }
}

impl std::fmt::Debug for ProtectedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.protect {
            write!(f, "ProtectedValue([REDACTED])")
        } else {
            write!(f, "ProtectedValue({:?})", self.value)
        }
    }
}

/// A group node: ordered child lists plus display state.
///
/// `searching_enabled` and `autotype_enabled` are tri-state: `None` inherits
/// from the nearest ancestor carrying `Some`, the root defaulting to
/// enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: NodeId,
    /// Back-reference into the tree; `None` only for the root or while
    /// detached mid-operation.
    pub parent: Option<NodeId>,
    pub name: String,
    pub icon: u32,
    pub times: NodeTimes,
    pub searching_enabled: Option<bool>,
    pub autotype_enabled: Option<bool>,
    pub expanded: bool,
    pub custom_data: BTreeMap<String, String>,
    /// Ordered child groups (ids into the tree's group slots)
    pub groups: Vec<NodeId>,
    /// Ordered child entries (ids into the tree's entry slots)
    pub entries: Vec<NodeId>,
}

impl Group {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, name: impl Into<String>) -> Self {
        Group {
            id,
            parent,
            name: name.into(),
            icon: 0,
            times: NodeTimes::now(),
            searching_enabled: None,
            autotype_enabled: None,
            expanded: true,
            custom_data: BTreeMap::new(),
            groups: Vec::new(),
            entries: Vec::new(),
        }
    }
}

/// An entry node: the credential itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub title: ProtectedValue,
    pub username: ProtectedValue,
    pub password: ProtectedValue,
    pub url: ProtectedValue,
    pub notes: ProtectedValue,
    /// Open map of extra custom fields
    pub fields: BTreeMap<String, ProtectedValue>,
    /// Attachment name → handle into the database's binary pool
    pub binaries: BTreeMap<String, u32>,
    pub icon: u32,
    pub times: NodeTimes,
    pub custom_data: BTreeMap<String, String>,
    /// Prior versions, oldest first. Snapshots carry no history of their own.
    pub history: Vec<Entry>,
}

impl Entry {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>) -> Self {
        Entry {
            id,
            parent,
            title: ProtectedValue::default(),
            username: ProtectedValue::default(),
            password: ProtectedValue::protected(""),
            url: ProtectedValue::default(),
            notes: ProtectedValue::default(),
            fields: BTreeMap::new(),
            binaries: BTreeMap::new(),
            icon: 0,
            times: NodeTimes::now(),
            custom_data: BTreeMap::new(),
            history: Vec::new(),
        }
    }

    /// The searchable strings in their fixed enumeration order: title,
    /// username, url, notes, then extra fields in key order.
    pub fn search_strings(&self) -> impl Iterator<Item = &str> {
        [
            self.title.value(),
            self.username.value(),
            self.url.value(),
            self.notes.value(),
        ]
        .into_iter()
        .chain(self.fields.values().map(|v| v.value()))
    }

    /// Snapshot the current state into history, then trim to the caps.
    ///
    /// Negative caps mean unlimited. Oldest snapshots go first when
    /// trimming.
    pub fn push_history(&mut self, max_items: i32, max_size: i64) {
        let mut snapshot = self.clone();
        snapshot.history.clear();
        self.history.push(snapshot);
        self.maintain_history(max_items, max_size);
    }

    fn maintain_history(&mut self, max_items: i32, max_size: i64) {
        if max_items >= 0 {
            while self.history.len() > max_items as usize {
                self.history.remove(0);
            }
        }
        if max_size >= 0 {
            while self.history.len() > 1
                && self.history.iter().map(Entry::approximate_size).sum::<u64>() > max_size as u64
            {
                self.history.remove(0);
            }
        }
    }

    /// Rough byte footprint, used only for the history size cap.
    pub fn approximate_size(&self) -> u64 {
        let strings = self.search_strings().map(|s| s.len() as u64).sum::<u64>()
            + self.password.value().len() as u64;
        let custom = self
            .custom_data
            .iter()
            .map(|(k, v)| (k.len() + v.len()) as u64)
            .sum::<u64>();
        let attachments = self
            .binaries
            .keys()
            .map(|name| name.len() as u64 + 4)
            .sum::<u64>();
        strings + custom + attachments
    }
}
