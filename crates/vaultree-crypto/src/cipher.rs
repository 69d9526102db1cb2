//! Symmetric cipher engines and registry
//!
//! An engine exposes its key/IV lengths and AEAD encrypt/decrypt over opaque
//! buffers; the container codec owns framing and nonce management. Lookup is
//! by 128-bit identifier so a container can name its cipher and the registry
//! either honors it or fails hard — never a silent default.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use std::collections::HashMap;
use uuid::Uuid;
use vaultree_core::{VaultError, VaultResult};

/// AES-256-GCM cipher identifier
pub const CIPHER_AES256_GCM: Uuid = Uuid::from_bytes([
    0x31, 0xc1, 0xf2, 0xe6, 0xbf, 0x71, 0x43, 0x50, 0xbe, 0x58, 0x05, 0x21, 0x6a, 0xfc, 0x5a, 0xff,
]);

/// XChaCha20-Poly1305 cipher identifier
pub const CIPHER_XCHACHA20_POLY1305: Uuid = Uuid::from_bytes([
    0xd6, 0x03, 0x8a, 0x2b, 0x8b, 0x6f, 0x4c, 0xb5, 0xa5, 0x24, 0x33, 0x9a, 0x31, 0xdb, 0xb5, 0x9a,
]);

/// A symmetric cipher usable as the database's data cipher.
pub trait CipherEngine: Send + Sync {
    fn uuid(&self) -> Uuid;
    /// Required key length in bytes.
    fn key_len(&self) -> usize;
    /// Required IV/nonce length in bytes.
    fn iv_len(&self) -> usize;
    fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> VaultResult<Vec<u8>>;
    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> VaultResult<Vec<u8>>;
}

/// AES-256-GCM (96-bit nonce, 128-bit tag)
pub struct AesGcmEngine;

impl CipherEngine for AesGcmEngine {
    fn uuid(&self) -> Uuid {
        CIPHER_AES256_GCM
    }

    fn key_len(&self) -> usize {
        32
    }

    fn iv_len(&self) -> usize {
        12
    }

    fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        let cipher = aes_cipher(key)?;
        check_iv(iv, self.iv_len())?;
        cipher
            .encrypt(Nonce::from_slice(iv), plaintext)
            .map_err(|_| VaultError::Cipher("AES-GCM encryption failed".into()))
    }

    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
        let cipher = aes_cipher(key)?;
        check_iv(iv, self.iv_len())?;
        cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| VaultError::Cipher("AES-GCM decryption failed: wrong key or corrupted data".into()))
    }
}

fn aes_cipher(key: &[u8]) -> VaultResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key)
        .map_err(|_| VaultError::Cipher(format!("AES-256-GCM requires a 32-byte key, got {}", key.len())))
}

/// XChaCha20-Poly1305 (192-bit nonce, 128-bit tag)
pub struct XChaChaEngine;

impl CipherEngine for XChaChaEngine {
    fn uuid(&self) -> Uuid {
        CIPHER_XCHACHA20_POLY1305
    }

    fn key_len(&self) -> usize {
        32
    }

    fn iv_len(&self) -> usize {
        24
    }

    fn encrypt(&self, key: &[u8], iv: &[u8], plaintext: &[u8]) -> VaultResult<Vec<u8>> {
        let cipher = xchacha_cipher(key)?;
        check_iv(iv, self.iv_len())?;
        cipher
            .encrypt(XNonce::from_slice(iv), plaintext)
            .map_err(|_| VaultError::Cipher("XChaCha20-Poly1305 encryption failed".into()))
    }

    fn decrypt(&self, key: &[u8], iv: &[u8], ciphertext: &[u8]) -> VaultResult<Vec<u8>> {
        let cipher = xchacha_cipher(key)?;
        check_iv(iv, self.iv_len())?;
        cipher
            .decrypt(XNonce::from_slice(iv), ciphertext)
            .map_err(|_| {
                VaultError::Cipher("XChaCha20-Poly1305 decryption failed: wrong key or corrupted data".into())
            })
    }
}

fn xchacha_cipher(key: &[u8]) -> VaultResult<XChaCha20Poly1305> {
    XChaCha20Poly1305::new_from_slice(key).map_err(|_| {
        VaultError::Cipher(format!("XChaCha20-Poly1305 requires a 32-byte key, got {}", key.len()))
    })
}

fn check_iv(iv: &[u8], expected: usize) -> VaultResult<()> {
    if iv.len() != expected {
        return Err(VaultError::Cipher(format!(
            "IV must be {expected} bytes, got {}",
            iv.len()
        )));
    }
    Ok(())
}

/// Cipher lookup by identifier.
pub struct CipherRegistry {
    engines: HashMap<Uuid, Box<dyn CipherEngine>>,
}

impl CipherRegistry {
    /// Empty registry, for callers composing their own engine set.
    pub fn empty() -> Self {
        CipherRegistry {
            engines: HashMap::new(),
        }
    }

    pub fn register(&mut self, engine: Box<dyn CipherEngine>) {
        self.engines.insert(engine.uuid(), engine);
    }

    pub fn get(&self, id: Uuid) -> VaultResult<&dyn CipherEngine> {
        self.engines
            .get(&id)
            .map(|e| e.as_ref())
            .ok_or(VaultError::UnsupportedCipher(id))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.engines.contains_key(&id)
    }
}

impl Default for CipherRegistry {
    /// Registry with both built-in engines.
    fn default() -> Self {
        let mut registry = CipherRegistry::empty();
        registry.register(Box::new(AesGcmEngine));
        registry.register(Box::new(XChaChaEngine));
        registry
    }
}
