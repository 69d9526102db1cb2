//! End-to-end scenarios over a whole database.
//!
//! Exercises the pieces together the way an application shell would:
//!   1. Unlocking — key derivation against the database's stored settings
//!   2. Soft delete — recycle, undo, and search visibility of the bin
//!   3. Hard delete — tombstones and reconciliation-facing guarantees
//!   4. Format version — feature use drives the minimum container version
//!   5. Traversal invariants under randomized tree shapes

use proptest::prelude::*;
use secrecy::SecretString;
use std::collections::HashSet;
use vaultree_core::NodeId;
use vaultree_crypto::cipher::{CIPHER_AES256_GCM, CIPHER_XCHACHA20_POLY1305};
use vaultree_crypto::kdf::{PARAM_ROUNDS, PARAM_SEED};
use vaultree_crypto::{CipherRegistry, KdfRegistry};
use vaultree_db::{
    minimum_version, search, CredentialTree, Database, FormatVersion, NodeRef, ProtectedValue,
    SearchParameters,
};

fn fast_database() -> Database {
    let mut db = Database::new("integration");
    // Cheap KDF settings; production defaults take seconds by design.
    db.kdf_params.fields.set_u64(PARAM_ROUNDS, 32);
    db.kdf_params.fields.set_bytes(PARAM_SEED, vec![0x5A; 32]);
    db
}

#[test]
fn unlock_produces_cipher_sized_keys_for_every_registered_cipher() {
    let ciphers = CipherRegistry::default();
    let kdfs = KdfRegistry::default();
    let password = SecretString::from("correct horse battery staple");
    let seed = [0x42u8; 32];

    for cipher_id in [CIPHER_AES256_GCM, CIPHER_XCHACHA20_POLY1305] {
        let mut db = fast_database();
        db.cipher_id = cipher_id;
        let keys = db
            .derive_keys(Some(&password), None, &seed, &ciphers, &kdfs)
            .unwrap();
        let expected = ciphers.get(cipher_id).unwrap().key_len();
        assert_eq!(keys.final_key().len(), expected);
        assert_eq!(keys.hmac_key().len(), 64);
    }
}

#[test]
fn recycled_entries_disappear_from_search_until_restored() {
    let mut db = fast_database();
    let group = db.tree.create_group(db.tree.root()).unwrap();
    let entry = db.tree.create_entry(group).unwrap();
    db.tree.entry_mut(entry).unwrap().title = ProtectedValue::plain("GitHub");

    assert_eq!(search(&db.tree, &SearchParameters::new("git")), vec![entry]);

    db.recycle(entry).unwrap();
    assert!(
        search(&db.tree, &SearchParameters::new("git")).is_empty(),
        "the bin has searching disabled, so recycled entries stay hidden"
    );

    db.undo_recycle(entry, group).unwrap();
    assert_eq!(search(&db.tree, &SearchParameters::new("git")), vec![entry]);
    assert_eq!(db.tree.parent_of(entry), Some(group));
}

#[test]
fn delete_then_undo_keeps_ledger_and_tree_consistent() {
    let mut db = fast_database();
    let group = db.tree.create_group(db.tree.root()).unwrap();
    let entry = db.tree.create_entry(group).unwrap();
    db.tree.entry_mut(entry).unwrap().username = ProtectedValue::plain("alice");

    let detached = db.delete(entry).unwrap();
    assert!(db.tombstones.contains(entry));
    assert!(!db.tree.contains(entry));

    db.undo_delete(detached, group).unwrap();
    assert!(!db.tombstones.contains(entry));
    assert_eq!(db.tree.entry(entry).unwrap().username.value(), "alice");
}

#[test]
fn feature_use_escalates_the_minimum_format_version() {
    let mut db = fast_database();
    let group = db.tree.create_group(db.tree.root()).unwrap();
    let entry = db.tree.create_entry(group).unwrap();
    assert_eq!(minimum_version(&db), FormatVersion::Reduced);

    db.tree
        .entry_mut(entry)
        .unwrap()
        .custom_data
        .insert("plugin".into(), "data".into());
    assert_eq!(minimum_version(&db), FormatVersion::Full);
}

// ── Randomized tree shapes ──────────────────────────────────────────────────

/// Build a tree from a shape description: each element places a group under
/// one of the already-created groups and gives it that many entries.
fn build_tree(shape: &[(usize, usize)]) -> (CredentialTree, usize, usize) {
    let mut tree = CredentialTree::new("root");
    let mut group_ids: Vec<NodeId> = vec![tree.root()];
    let mut entry_count = 0usize;

    for &(parent_index, entries) in shape {
        let parent = group_ids[parent_index % group_ids.len()];
        let group = tree.create_group(parent).unwrap();
        group_ids.push(group);
        for _ in 0..entries {
            tree.create_entry(group).unwrap();
            entry_count += 1;
        }
    }
    (tree, group_ids.len(), entry_count)
}

proptest! {
    /// Pre-order traversal covers every node exactly once, and each group
    /// appears before its own entries and before its child groups.
    #[test]
    fn traversal_covers_and_orders(shape in proptest::collection::vec((0usize..8, 0usize..4), 0..24)) {
        let (tree, group_count, entry_count) = build_tree(&shape);

        let mut seen = HashSet::new();
        let mut position = std::collections::HashMap::new();
        for (index, node) in tree.iter().enumerate() {
            prop_assert!(seen.insert(node.id()), "node visited twice");
            position.insert(node.id(), index);
        }
        prop_assert_eq!(seen.len(), group_count + entry_count);

        for node in tree.iter() {
            if let NodeRef::Group(group) = node {
                let own = position[&group.id];
                for child in group.groups.iter().chain(group.entries.iter()) {
                    prop_assert!(position[child] > own, "parent must precede its children");
                }
            }
        }
    }

    /// Searching never returns a recycled entry while the flag is honored,
    /// regardless of tree shape.
    #[test]
    fn recycle_hides_from_search(shape in proptest::collection::vec((0usize..4, 1usize..3), 1..8)) {
        let (tree, _, _) = build_tree(&shape);
        let mut db = fast_database();
        db.tree = tree;

        let targets: Vec<NodeId> = db.tree.entries_preorder().map(|e| e.id).collect();
        for id in &targets {
            db.tree.entry_mut(*id).unwrap().title = ProtectedValue::plain("needle");
        }

        let first = targets[0];
        db.recycle(first).unwrap();

        let hits = search(&db.tree, &SearchParameters::new("needle"));
        prop_assert!(!hits.contains(&first));
        prop_assert_eq!(hits.len(), targets.len() - 1);
    }
}
