//! vaultree-db: the encrypted credential database's in-memory engine
//!
//! Owns the group/entry tree and everything that operates on it: soft
//! deletion through the recycle bin, permanent deletion with tombstones,
//! predicate search, the attachment pool, and the minimum-format-version
//! policy. Key derivation lives in `vaultree-crypto`; the binary container
//! codec that persists all of this is a separate consumer and out of scope.
//!
//! Single-writer discipline: one open session mutates a database at a time,
//! so there is no internal locking.

pub mod binary;
pub mod node;
pub mod recycle;
pub mod search;
pub mod tombstone;
pub mod tree;
pub mod version;

pub use binary::BinaryPool;
pub use node::{Entry, Group, ProtectedValue};
pub use search::{search, SearchParameters};
pub use tombstone::{Tombstone, TombstoneLog};
pub use tree::{CredentialTree, DetachedSubtree, NodeRef, Preorder};
pub use version::{minimum_version, FormatVersion};

use secrecy::SecretString;
use uuid::Uuid;
use vaultree_core::{DatabaseConfig, NodeId, VariantDictionary, VaultResult};
use vaultree_crypto::kdf::{KdfEngine, Sha256RoundsKdf};
use vaultree_crypto::{CipherRegistry, FinalKeys, KdfParameters, KdfRegistry, CIPHER_AES256_GCM};

/// An open credential database: the tree plus its side structures and the
/// cryptographic settings the container codec needs.
pub struct Database {
    pub tree: CredentialTree,
    pub config: DatabaseConfig,
    pub kdf_params: KdfParameters,
    pub cipher_id: Uuid,
    pub public_custom_data: VariantDictionary,
    pub tombstones: TombstoneLog,
    pub binaries: BinaryPool,
    pub(crate) recycle_bin_id: Option<NodeId>,
}

impl Database {
    /// Fresh database with default settings: default KDF with a random
    /// seed, AES-256-GCM, empty pools.
    pub fn new(name: impl Into<String>) -> Self {
        Database {
            tree: CredentialTree::new(name),
            config: DatabaseConfig::default(),
            kdf_params: Sha256RoundsKdf.default_params(&mut rand::thread_rng()),
            cipher_id: CIPHER_AES256_GCM,
            public_custom_data: VariantDictionary::new(),
            tombstones: TombstoneLog::new(),
            binaries: BinaryPool::new(),
            recycle_bin_id: None,
        }
    }

    /// Reconstruct a database from parts the container codec decoded.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        tree: CredentialTree,
        config: DatabaseConfig,
        kdf_params: KdfParameters,
        cipher_id: Uuid,
        public_custom_data: VariantDictionary,
        tombstones: TombstoneLog,
        binaries: BinaryPool,
        recycle_bin_id: Option<NodeId>,
    ) -> Self {
        Database {
            tree,
            config,
            kdf_params,
            cipher_id,
            public_custom_data,
            tombstones,
            binaries,
            recycle_bin_id,
        }
    }

    /// Derive this database's final and integrity keys from credentials.
    ///
    /// Thin wrapper over [`vaultree_crypto::derive_final_key`] using the
    /// database's stored KDF parameters and cipher id.
    pub fn derive_keys(
        &self,
        password: Option<&SecretString>,
        key_file: Option<&[u8]>,
        master_seed: &[u8],
        ciphers: &CipherRegistry,
        kdfs: &KdfRegistry,
    ) -> VaultResult<FinalKeys> {
        vaultree_crypto::derive_final_key(
            password,
            key_file,
            master_seed,
            &self.kdf_params,
            self.cipher_id,
            ciphers,
            kdfs,
        )
    }

    /// Snapshot an entry into its history, applying the configured caps,
    /// and mark it modified. Call before mutating the entry's fields.
    pub fn backup_entry(&mut self, entry: NodeId) -> VaultResult<()> {
        let max_items = self.config.history_max_items;
        let max_size = self.config.history_max_size;
        let e = self
            .tree
            .entry_mut(entry)
            .ok_or(vaultree_core::VaultError::UnknownNode(entry.as_uuid()))?;
        e.push_history(max_items, max_size);
        self.tree.touch(entry, true, true);
        Ok(())
    }

    /// Attach a blob to an entry under `name`, deduplicating through the
    /// pool.
    pub fn attach_binary(&mut self, entry: NodeId, name: impl Into<String>, data: Vec<u8>) -> VaultResult<u32> {
        let handle = self.binaries.put(data);
        let e = self
            .tree
            .entry_mut(entry)
            .ok_or(vaultree_core::VaultError::UnknownNode(entry.as_uuid()))?;
        e.binaries.insert(name.into(), handle);
        self.tree.touch(entry, true, false);
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultree_crypto::DEFAULT_KDF_ID;

    #[test]
    fn new_database_uses_default_algorithms() {
        let db = Database::new("vault");
        assert_eq!(db.kdf_params.kdf_id, DEFAULT_KDF_ID);
        assert_eq!(db.cipher_id, CIPHER_AES256_GCM);
        assert!(db.tombstones.is_empty());
        assert!(db.binaries.is_empty());
        assert!(db.recycle_bin().is_none());
    }

    #[test]
    fn attach_binary_dedupes_across_entries() {
        let mut db = Database::new("vault");
        let group = db.tree.create_group(db.tree.root()).unwrap();
        let e1 = db.tree.create_entry(group).unwrap();
        let e2 = db.tree.create_entry(group).unwrap();

        let h1 = db.attach_binary(e1, "cert.pem", b"pem bytes".to_vec()).unwrap();
        let h2 = db.attach_binary(e2, "cert.pem", b"pem bytes".to_vec()).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(db.binaries.len(), 1);
    }

    #[test]
    fn backup_entry_applies_config_caps() {
        let mut db = Database::new("vault");
        db.config.history_max_items = 2;
        let group = db.tree.create_group(db.tree.root()).unwrap();
        let entry = db.tree.create_entry(group).unwrap();

        for _ in 0..5 {
            db.backup_entry(entry).unwrap();
        }
        assert_eq!(db.tree.entry(entry).unwrap().history.len(), 2);
    }
}
