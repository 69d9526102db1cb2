//! Predicate search over the tree
//!
//! Entries are tested in traversal order; results keep that order and hold
//! no duplicates (each entry short-circuits at its first matching test).
//! `now` is captured once per invocation so every expiry comparison in one
//! search agrees.

use chrono::Utc;
use std::borrow::Cow;
use vaultree_core::NodeId;

use crate::node::Entry;
use crate::tree::{CredentialTree, NodeRef};

#[derive(Debug, Clone)]
pub struct SearchParameters {
    pub query: String,
    pub ignore_case: bool,
    /// Skip entries whose effective searching-enabled state (inherited from
    /// ancestor groups) is off.
    pub respect_searching_disabled: bool,
    pub exclude_expired: bool,
    /// Also match against the immediate parent group's name.
    pub search_in_group_names: bool,
    /// Also match against the entry's textual identifier.
    pub search_in_ids: bool,
}

impl SearchParameters {
    pub fn new(query: impl Into<String>) -> Self {
        SearchParameters {
            query: query.into(),
            ..Default::default()
        }
    }
}

impl Default for SearchParameters {
    fn default() -> Self {
        SearchParameters {
            query: String::new(),
            ignore_case: true,
            respect_searching_disabled: true,
            exclude_expired: false,
            search_in_group_names: false,
            search_in_ids: false,
        }
    }
}

/// Run a search, returning matching entry ids in traversal order.
pub fn search(tree: &CredentialTree, params: &SearchParameters) -> Vec<NodeId> {
    let now = Utc::now();
    let term = fold(&params.query, params.ignore_case);

    let mut matches = Vec::new();
    for node in tree.iter() {
        let NodeRef::Entry(entry) = node else { continue };

        if params.respect_searching_disabled && !searching_enabled_for(tree, entry) {
            continue;
        }
        if params.exclude_expired && entry.times.expired(now) {
            continue;
        }
        if entry_matches(tree, entry, term.as_ref(), params) {
            matches.push(entry.id);
        }
    }
    matches
}

/// Tests in fixed order, first hit wins: the entry's own string set, then
/// the parent group name, then the textual id.
fn entry_matches(tree: &CredentialTree, entry: &Entry, term: &str, params: &SearchParameters) -> bool {
    for candidate in entry.search_strings() {
        if contains(candidate, term, params.ignore_case) {
            return true;
        }
    }

    if params.search_in_group_names {
        if let Some(parent) = entry.parent.and_then(|p| tree.group(p)) {
            if contains(&parent.name, term, params.ignore_case) {
                return true;
            }
        }
    }

    if params.search_in_ids {
        // Uuid renders lowercase-hyphenated; fold handles a cased query.
        let id_text = entry.id.to_string();
        if contains(&id_text, term, params.ignore_case) {
            return true;
        }
    }

    false
}

/// Effective searching-enabled state: the nearest ancestor group carrying an
/// explicit flag decides; nothing explicit means enabled.
fn searching_enabled_for(tree: &CredentialTree, entry: &Entry) -> bool {
    let mut current = entry.parent;
    while let Some(group_id) = current {
        let Some(group) = tree.group(group_id) else { break };
        if let Some(enabled) = group.searching_enabled {
            return enabled;
        }
        current = group.parent;
    }
    true
}

fn contains(haystack: &str, term: &str, ignore_case: bool) -> bool {
    if haystack.is_empty() {
        return false;
    }
    fold(haystack, ignore_case).contains(term)
}

fn fold(s: &str, ignore_case: bool) -> Cow<'_, str> {
    if ignore_case {
        Cow::Owned(s.to_lowercase())
    } else {
        Cow::Borrowed(s)
    }
}
