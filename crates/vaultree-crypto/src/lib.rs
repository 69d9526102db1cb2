//! vaultree-crypto: master-key derivation for the credential database
//!
//! Key hierarchy:
//! ```text
//! password ──sha256──┐
//!                    ├── composite key (256-bit)
//! key file ──digest──┘        │
//!                         KDF stretch (Argon2id | iterated SHA-256, by id)
//!                              │
//!                    transformed key (normalized to 256-bit)
//!                    ├── final key   = resize(sha256(seed ‖ tkey), cipher key length)
//!                    └── hmac key    = sha512(seed ‖ tkey ‖ 0x01), always 64 bytes
//! ```
//!
//! Ciphers and KDFs are looked up in registries by 128-bit identifier so new
//! algorithms slot in without touching derivation callers. Unknown
//! identifiers are hard failures; there is no fallback algorithm.

pub mod cipher;
pub mod kdf;
pub mod keyfile;
pub mod master;

pub use cipher::{CipherEngine, CipherRegistry, CIPHER_AES256_GCM, CIPHER_XCHACHA20_POLY1305};
pub use kdf::{KdfEngine, KdfParameters, KdfRegistry, DEFAULT_KDF_ID, KDF_ARGON2ID, KDF_SHA256_ROUNDS};
pub use master::{composite_key, derive_final_key, FinalKeys};

/// Size of the composite and transformed keys (256-bit)
pub const KEY_SIZE: usize = 32;

/// Size of the integrity (HMAC) key, fixed regardless of cipher
pub const HMAC_KEY_SIZE: usize = 64;
