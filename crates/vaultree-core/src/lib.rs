//! vaultree-core: shared types for the vaultree credential database engine
//!
//! Holds everything both the crypto layer and the database layer depend on:
//! the error taxonomy, node identifiers, node timestamps, the variant
//! dictionary used for KDF parameters and custom data, and the database
//! configuration schema.

pub mod config;
pub mod error;
pub mod ids;
pub mod times;
pub mod variant;

pub use config::{DatabaseConfig, MemoryProtection};
pub use error::{VaultError, VaultResult};
pub use ids::{fresh_id, NodeId};
pub use times::NodeTimes;
pub use variant::{VariantDictionary, VariantValue};
