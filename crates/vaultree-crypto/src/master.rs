//! Composite-key construction and final-key derivation
//!
//! Every intermediate buffer holding the composite or transformed key is
//! wrapped in `Zeroizing`, so success, error, and unwind paths all scrub key
//! material before the stack frame dies.

use hkdf::Hkdf;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256, Sha512};
use uuid::Uuid;
use zeroize::Zeroizing;

use vaultree_core::VaultResult;

use crate::cipher::CipherRegistry;
use crate::kdf::{KdfParameters, KdfRegistry};
use crate::keyfile;
use crate::{HMAC_KEY_SIZE, KEY_SIZE};

/// The derived key pair the container codec consumes.
///
/// `final_key` has the active cipher's key length; `hmac_key` is always 64
/// bytes. Both are zeroized on drop.
pub struct FinalKeys {
    final_key: Zeroizing<Vec<u8>>,
    hmac_key: Zeroizing<[u8; HMAC_KEY_SIZE]>,
}

impl FinalKeys {
    pub fn final_key(&self) -> &[u8] {
        &self.final_key
    }

    pub fn hmac_key(&self) -> &[u8; HMAC_KEY_SIZE] {
        &self.hmac_key
    }
}

impl std::fmt::Debug for FinalKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinalKeys")
            .field("final_key", &"[REDACTED]")
            .field("hmac_key", &"[REDACTED]")
            .finish()
    }
}

/// Build the 256-bit composite key from the credentials present.
///
/// Password and key file are digested independently; with both present the
/// two digests are concatenated and hashed, with one present its digest is
/// hashed alone, with neither the empty buffer is hashed. The result is
/// always exactly 32 bytes.
pub fn composite_key(
    password: Option<&SecretString>,
    key_file: Option<&[u8]>,
) -> Zeroizing<[u8; KEY_SIZE]> {
    let password_digest: Option<Zeroizing<[u8; KEY_SIZE]>> = password
        .map(|p| Zeroizing::new(Sha256::digest(p.expose_secret().as_bytes()).into()));
    let key_file_digest: Option<Zeroizing<[u8; KEY_SIZE]>> =
        key_file.map(|bytes| Zeroizing::new(keyfile::key_file_digest(bytes)));

    let mut hasher = Sha256::new();
    if let Some(d) = &password_digest {
        hasher.update(d.as_slice());
    }
    if let Some(d) = &key_file_digest {
        hasher.update(d.as_slice());
    }
    Zeroizing::new(hasher.finalize().into())
}

/// Derive the final encryption key and the integrity key.
///
/// Fails hard on an unknown cipher or KDF identifier; there is no fallback
/// algorithm. The KDF transform is the expensive step — callers on a
/// latency-sensitive thread should move this call to a blocking worker.
pub fn derive_final_key(
    password: Option<&SecretString>,
    key_file: Option<&[u8]>,
    master_seed: &[u8],
    kdf_params: &KdfParameters,
    cipher_id: Uuid,
    ciphers: &CipherRegistry,
    kdfs: &KdfRegistry,
) -> VaultResult<FinalKeys> {
    // Resolve both algorithms before any expensive work.
    let cipher = ciphers.get(cipher_id)?;
    let kdf = kdfs.get(kdf_params.kdf_id)?;

    let composite = composite_key(password, key_file);

    let transformed_raw = Zeroizing::new(kdf.transform(&composite, kdf_params)?);
    let transformed: Zeroizing<[u8; KEY_SIZE]> = if transformed_raw.len() == KEY_SIZE {
        let mut out = Zeroizing::new([0u8; KEY_SIZE]);
        out.copy_from_slice(&transformed_raw);
        out
    } else {
        // Normalize odd-length KDF output back to 256 bits.
        Zeroizing::new(Sha256::digest(transformed_raw.as_slice()).into())
    };
    drop(transformed_raw);

    tracing::debug!(kdf = kdf.name(), "composite key transformed");

    let final_key = Zeroizing::new(resize_key(master_seed, &transformed, cipher.key_len()));

    let mut hmac_hasher = Sha512::new();
    hmac_hasher.update(master_seed);
    hmac_hasher.update(transformed.as_slice());
    hmac_hasher.update([0x01u8]);
    let mut hmac_key = Zeroizing::new([0u8; HMAC_KEY_SIZE]);
    hmac_key.copy_from_slice(&hmac_hasher.finalize());

    Ok(FinalKeys {
        final_key,
        hmac_key,
    })
}

/// Resize `sha256(master_seed ‖ transformed)` to the cipher's key length.
///
/// Target lengths up to the digest size take a prefix of the digest; longer
/// targets are produced by HKDF-SHA-256 expansion over the same input
/// material (extend by rehashing, never by repeating bytes).
fn resize_key(master_seed: &[u8], transformed: &[u8; KEY_SIZE], target_len: usize) -> Vec<u8> {
    if target_len <= KEY_SIZE {
        let mut hasher = Sha256::new();
        hasher.update(master_seed);
        hasher.update(transformed);
        let digest: Zeroizing<[u8; KEY_SIZE]> = Zeroizing::new(hasher.finalize().into());
        return digest[..target_len].to_vec();
    }

    let mut ikm = Zeroizing::new(Vec::with_capacity(master_seed.len() + KEY_SIZE));
    ikm.extend_from_slice(master_seed);
    ikm.extend_from_slice(transformed);

    let hkdf = Hkdf::<Sha256>::new(None, &ikm);
    let mut okm = vec![0u8; target_len];
    // Expand cannot fail for any cipher key length below 255 * 32 bytes.
    hkdf.expand(b"vaultree final key", &mut okm)
        .expect("requested key length exceeds HKDF-SHA-256 output bound");
    okm
}
