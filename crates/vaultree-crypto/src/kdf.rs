//! Key derivation engines and registry
//!
//! A KDF stretches the 256-bit composite key into a transformed key.
//! Parameters travel as a [`VariantDictionary`] keyed by algorithm id so the
//! container codec can round-trip them without knowing any algorithm's
//! field set.
//!
//! Two engines ship: the iterated-SHA-256 "rounds" KDF (the legacy default,
//! compatible with the reduced container format) and Argon2id (memory-hard,
//! forces the full format version).

use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;
use vaultree_core::{VariantDictionary, VaultError, VaultResult};

use crate::KEY_SIZE;

/// Iterated-SHA-256 rounds KDF identifier
pub const KDF_SHA256_ROUNDS: Uuid = Uuid::from_bytes([
    0xc9, 0xd9, 0xf3, 0x9a, 0x62, 0x8a, 0x44, 0x60, 0xbf, 0x74, 0x0d, 0x08, 0xc1, 0x8a, 0x4f, 0xea,
]);

/// Argon2id KDF identifier
pub const KDF_ARGON2ID: Uuid = Uuid::from_bytes([
    0x9e, 0x29, 0x8b, 0x19, 0x56, 0xdb, 0x47, 0x73, 0xb2, 0x3d, 0xfc, 0x3e, 0xc6, 0xf0, 0xa1, 0xe6,
]);

/// The KDF a freshly created database uses; also the one the reduced
/// container format version can represent.
pub const DEFAULT_KDF_ID: Uuid = KDF_SHA256_ROUNDS;

pub const PARAM_ROUNDS: &str = "rounds";
pub const PARAM_SEED: &str = "seed";
pub const PARAM_MEMORY_KIB: &str = "memory_kib";
pub const PARAM_ITERATIONS: &str = "iterations";
pub const PARAM_PARALLELISM: &str = "parallelism";
pub const PARAM_SALT: &str = "salt";

const DEFAULT_ROUNDS: u64 = 600_000;
const DEFAULT_MEMORY_KIB: u64 = 65536;
const DEFAULT_ITERATIONS: u32 = 3;
const DEFAULT_PARALLELISM: u32 = 4;

/// Algorithm identifier plus its named parameter fields.
///
/// Must round-trip exactly through the container codec; both pieces are
/// plain serde data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParameters {
    pub kdf_id: Uuid,
    pub fields: VariantDictionary,
}

impl KdfParameters {
    pub fn new(kdf_id: Uuid) -> Self {
        KdfParameters {
            kdf_id,
            fields: VariantDictionary::new(),
        }
    }
}

/// A key-derivation algorithm.
pub trait KdfEngine: Send + Sync {
    fn uuid(&self) -> Uuid;
    fn name(&self) -> &'static str;

    /// Stretch the composite key. Output length is algorithm-defined; the
    /// caller normalizes to 32 bytes.
    fn transform(&self, composite: &[u8; KEY_SIZE], params: &KdfParameters) -> VaultResult<Vec<u8>>;

    /// Fresh parameters with default costs and a random seed/salt.
    fn default_params(&self, rng: &mut dyn RngCore) -> KdfParameters;
}

/// Iterated SHA-256: `state ← sha256(seed ‖ state)`, repeated `rounds` times.
///
/// CPU-bound only. Kept as the legacy default; new databases wanting
/// memory-hard stretching should select Argon2id.
pub struct Sha256RoundsKdf;

impl KdfEngine for Sha256RoundsKdf {
    fn uuid(&self) -> Uuid {
        KDF_SHA256_ROUNDS
    }

    fn name(&self) -> &'static str {
        "sha256-rounds"
    }

    fn transform(&self, composite: &[u8; KEY_SIZE], params: &KdfParameters) -> VaultResult<Vec<u8>> {
        let rounds = params.fields.get_u64(PARAM_ROUNDS).unwrap_or(DEFAULT_ROUNDS);
        let seed = params
            .fields
            .get_bytes(PARAM_SEED)
            .ok_or_else(|| VaultError::KeyDerivation("sha256-rounds: missing seed".into()))?;

        let mut state = *composite;
        for _ in 0..rounds {
            let mut hasher = Sha256::new();
            hasher.update(seed);
            hasher.update(state);
            state = hasher.finalize().into();
        }
        Ok(state.to_vec())
    }

    fn default_params(&self, rng: &mut dyn RngCore) -> KdfParameters {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);

        let mut params = KdfParameters::new(self.uuid());
        params.fields.set_u64(PARAM_ROUNDS, DEFAULT_ROUNDS);
        params.fields.set_bytes(PARAM_SEED, seed.to_vec());
        params
    }
}

/// Argon2id via the `argon2` crate.
pub struct Argon2Kdf;

impl KdfEngine for Argon2Kdf {
    fn uuid(&self) -> Uuid {
        KDF_ARGON2ID
    }

    fn name(&self) -> &'static str {
        "argon2id"
    }

    fn transform(&self, composite: &[u8; KEY_SIZE], params: &KdfParameters) -> VaultResult<Vec<u8>> {
        let memory = params
            .fields
            .get_u64(PARAM_MEMORY_KIB)
            .unwrap_or(DEFAULT_MEMORY_KIB);
        let iterations = params
            .fields
            .get_u32(PARAM_ITERATIONS)
            .unwrap_or(DEFAULT_ITERATIONS);
        let parallelism = params
            .fields
            .get_u32(PARAM_PARALLELISM)
            .unwrap_or(DEFAULT_PARALLELISM);
        let salt = params
            .fields
            .get_bytes(PARAM_SALT)
            .ok_or_else(|| VaultError::KeyDerivation("argon2id: missing salt".into()))?;

        let memory = u32::try_from(memory)
            .map_err(|_| VaultError::KeyDerivation("argon2id: memory cost out of range".into()))?;
        let argon2_params = Params::new(memory, iterations, parallelism, Some(KEY_SIZE))
            .map_err(|e| VaultError::KeyDerivation(format!("argon2id: invalid params: {e}")))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params);

        let mut out = vec![0u8; KEY_SIZE];
        argon2
            .hash_password_into(composite, salt, &mut out)
            .map_err(|e| VaultError::KeyDerivation(format!("argon2id: {e}")))?;
        Ok(out)
    }

    fn default_params(&self, rng: &mut dyn RngCore) -> KdfParameters {
        let mut salt = [0u8; 16];
        rng.fill_bytes(&mut salt);

        let mut params = KdfParameters::new(self.uuid());
        params.fields.set_u64(PARAM_MEMORY_KIB, DEFAULT_MEMORY_KIB);
        params.fields.set_u32(PARAM_ITERATIONS, DEFAULT_ITERATIONS);
        params.fields.set_u32(PARAM_PARALLELISM, DEFAULT_PARALLELISM);
        params.fields.set_bytes(PARAM_SALT, salt.to_vec());
        params
    }
}

/// KDF lookup by identifier.
pub struct KdfRegistry {
    engines: HashMap<Uuid, Box<dyn KdfEngine>>,
}

impl KdfRegistry {
    pub fn empty() -> Self {
        KdfRegistry {
            engines: HashMap::new(),
        }
    }

    pub fn register(&mut self, engine: Box<dyn KdfEngine>) {
        self.engines.insert(engine.uuid(), engine);
    }

    pub fn get(&self, id: Uuid) -> VaultResult<&dyn KdfEngine> {
        self.engines
            .get(&id)
            .map(|e| e.as_ref())
            .ok_or(VaultError::UnsupportedKdf(id))
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.engines.contains_key(&id)
    }
}

impl Default for KdfRegistry {
    fn default() -> Self {
        let mut registry = KdfRegistry::empty();
        registry.register(Box::new(Sha256RoundsKdf));
        registry.register(Box::new(Argon2Kdf));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rounds_params(rounds: u64) -> KdfParameters {
        let mut params = KdfParameters::new(KDF_SHA256_ROUNDS);
        params.fields.set_u64(PARAM_ROUNDS, rounds);
        params.fields.set_bytes(PARAM_SEED, vec![5u8; 32]);
        params
    }

    fn argon2_params() -> KdfParameters {
        let mut params = KdfParameters::new(KDF_ARGON2ID);
        params.fields.set_u64(PARAM_MEMORY_KIB, 1024);
        params.fields.set_u32(PARAM_ITERATIONS, 1);
        params.fields.set_u32(PARAM_PARALLELISM, 1);
        params.fields.set_bytes(PARAM_SALT, vec![9u8; 16]);
        params
    }

    #[test]
    fn rounds_kdf_deterministic() {
        let composite = [3u8; KEY_SIZE];
        let params = rounds_params(100);
        let a = Sha256RoundsKdf.transform(&composite, &params).unwrap();
        let b = Sha256RoundsKdf.transform(&composite, &params).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), KEY_SIZE);
    }

    #[test]
    fn rounds_kdf_round_count_matters() {
        let composite = [3u8; KEY_SIZE];
        let a = Sha256RoundsKdf.transform(&composite, &rounds_params(100)).unwrap();
        let b = Sha256RoundsKdf.transform(&composite, &rounds_params(101)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rounds_kdf_requires_seed() {
        let mut params = KdfParameters::new(KDF_SHA256_ROUNDS);
        params.fields.set_u64(PARAM_ROUNDS, 10);
        let result = Sha256RoundsKdf.transform(&[0u8; KEY_SIZE], &params);
        assert!(matches!(result, Err(VaultError::KeyDerivation(_))));
    }

    #[test]
    fn argon2_deterministic_and_salted() {
        let composite = [7u8; KEY_SIZE];
        let params = argon2_params();
        let a = Argon2Kdf.transform(&composite, &params).unwrap();
        let b = Argon2Kdf.transform(&composite, &params).unwrap();
        assert_eq!(a, b);

        let mut other_salt = argon2_params();
        other_salt.fields.set_bytes(PARAM_SALT, vec![8u8; 16]);
        let c = Argon2Kdf.transform(&composite, &other_salt).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn registry_rejects_unknown_kdf() {
        let registry = KdfRegistry::default();
        let unknown = Uuid::from_bytes([0xAB; 16]);
        assert!(matches!(
            registry.get(unknown),
            Err(VaultError::UnsupportedKdf(id)) if id == unknown
        ));
    }

    #[test]
    fn default_params_carry_random_seed() {
        let mut rng = StdRng::seed_from_u64(11);
        let a = Sha256RoundsKdf.default_params(&mut rng);
        let b = Sha256RoundsKdf.default_params(&mut rng);
        assert_eq!(a.kdf_id, KDF_SHA256_ROUNDS);
        assert_eq!(a.fields.get_u64(PARAM_ROUNDS), Some(DEFAULT_ROUNDS));
        assert_ne!(
            a.fields.get_bytes(PARAM_SEED),
            b.fields.get_bytes(PARAM_SEED),
            "seeds must not repeat"
        );
    }
}
