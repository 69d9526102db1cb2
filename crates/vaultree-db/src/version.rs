//! Minimum container format version
//!
//! The reduced format cannot carry a non-default KDF, public custom data,
//! or per-node custom data; a database using any of those needs the full
//! format. The per-node check reuses the shared pre-order walk (groups
//! before their entries) and stops at the first node carrying custom data.

use vaultree_crypto::DEFAULT_KDF_ID;

use crate::tree::NodeRef;
use crate::Database;

/// The container format version a database requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatVersion {
    /// Legacy format: default KDF only, no custom data anywhere.
    Reduced,
    /// Current format: any registered KDF, custom data on database and
    /// nodes.
    Full,
}

/// Compute the minimum format version the database can be written as.
pub fn minimum_version(db: &Database) -> FormatVersion {
    if db.kdf_params.kdf_id != DEFAULT_KDF_ID {
        return FormatVersion::Full;
    }
    if !db.public_custom_data.is_empty() {
        return FormatVersion::Full;
    }

    let any_node_custom_data = db.tree.iter().any(|node| match node {
        NodeRef::Group(g) => !g.custom_data.is_empty(),
        NodeRef::Entry(e) => !e.custom_data.is_empty(),
    });
    if any_node_custom_data {
        FormatVersion::Full
    } else {
        FormatVersion::Reduced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use vaultree_core::VariantValue;
    use vaultree_crypto::kdf::{Argon2Kdf, KdfEngine};

    #[test]
    fn fresh_database_fits_the_reduced_format() {
        let db = Database::new("vault");
        assert_eq!(minimum_version(&db), FormatVersion::Reduced);
    }

    #[test]
    fn non_default_kdf_forces_full() {
        let mut db = Database::new("vault");
        db.kdf_params = Argon2Kdf.default_params(&mut StdRng::seed_from_u64(1));
        assert_eq!(minimum_version(&db), FormatVersion::Full);
    }

    #[test]
    fn public_custom_data_forces_full() {
        let mut db = Database::new("vault");
        db.public_custom_data
            .set("plugin", VariantValue::String("state".into()));
        assert_eq!(minimum_version(&db), FormatVersion::Full);
    }

    #[test]
    fn one_entry_custom_field_flips_the_result() {
        let mut db = Database::new("vault");
        let group = db.tree.create_group(db.tree.root()).unwrap();
        let entry = db.tree.create_entry(group).unwrap();
        assert_eq!(minimum_version(&db), FormatVersion::Reduced);

        db.tree
            .entry_mut(entry)
            .unwrap()
            .custom_data
            .insert("origin".into(), "imported".into());
        assert_eq!(minimum_version(&db), FormatVersion::Full);
    }

    #[test]
    fn group_custom_data_also_counts() {
        let mut db = Database::new("vault");
        let group = db.tree.create_group(db.tree.root()).unwrap();
        db.tree
            .group_mut(group)
            .unwrap()
            .custom_data
            .insert("color".into(), "blue".into());
        assert_eq!(minimum_version(&db), FormatVersion::Full);
    }
}
