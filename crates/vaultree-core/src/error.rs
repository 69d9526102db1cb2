use thiserror::Error;
use uuid::Uuid;

pub type VaultResult<T> = Result<T, VaultError>;

#[derive(Debug, Error)]
pub enum VaultError {
    /// Unknown cipher identifier at registry lookup. Fatal: substituting a
    /// default cipher would silently weaken the derived key.
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(Uuid),

    /// Unknown key-derivation-function identifier at registry lookup.
    #[error("unsupported key derivation function: {0}")]
    UnsupportedKdf(Uuid),

    /// Structured key-file content that could not be decoded.
    #[error("invalid key file: {0}")]
    InvalidKeyFile(String),

    /// KDF transform rejected its parameters or failed mid-stretch.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Cipher encrypt/decrypt failure (bad key length, corrupted buffer).
    #[error("cipher error: {0}")]
    Cipher(String),

    /// Parent/child linkage inconsistency. Programmer error, not
    /// recoverable at runtime.
    #[error("tree integrity violation: {0}")]
    TreeIntegrity(String),

    /// Referenced node is not in the tree.
    #[error("unknown node: {0}")]
    UnknownNode(Uuid),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
