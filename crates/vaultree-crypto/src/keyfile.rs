//! Key-file interpretation
//!
//! A key file is either a small structured JSON document carrying a base64
//! key payload, or arbitrary raw bytes. Either way it reduces to 32 bytes of
//! key material feeding the composite key.
//!
//! Document shape:
//! ```json
//! { "meta": { "version": 1 }, "key": { "data": "<base64>" } }
//! ```
//!
//! Malformed structured content falls back to hashing the raw bytes instead
//! of failing; the fallback is logged so a corrupted key file is observable.
//! (A base64 typo silently changes the derived key otherwise.)

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::KEY_SIZE;

#[derive(Debug, Deserialize)]
struct KeyFileDocument {
    #[allow(dead_code)]
    meta: Option<KeyFileMeta>,
    key: KeyFileKey,
}

#[derive(Debug, Deserialize)]
struct KeyFileMeta {
    #[allow(dead_code)]
    version: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct KeyFileKey {
    data: String,
}

/// Reduce key-file bytes to 32 bytes of key material.
///
/// A structured document contributes its decoded payload directly; a raw
/// file contributes the SHA-256 of its bytes (exactly 32 raw bytes are used
/// as-is, so externally generated binary key files survive unchanged). The
/// structured path sits one hash level below the raw path, so a structured
/// document and a raw file carrying the same payload never derive the same
/// digest.
pub fn key_file_digest(bytes: &[u8]) -> [u8; KEY_SIZE] {
    match decode_structured(bytes) {
        Some(payload) => payload,
        None => normalize(bytes),
    }
}

/// Try the structured path; `None` means "treat as raw bytes". The payload
/// must decode to exactly 32 bytes, anything else counts as malformed.
fn decode_structured(bytes: &[u8]) -> Option<[u8; KEY_SIZE]> {
    // Cheap pre-check: a structured key file is a JSON object.
    if !bytes.starts_with(b"{") {
        return None;
    }

    let document: KeyFileDocument = match serde_json::from_slice(bytes) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("structured key file did not parse, hashing raw bytes instead: {e}");
            return None;
        }
    };

    let payload = match BASE64.decode(document.key.data.trim()) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("structured key file payload is not valid base64, hashing raw bytes instead: {e}");
            return None;
        }
    };

    match <[u8; KEY_SIZE]>::try_from(payload.as_slice()) {
        Ok(key) => Some(key),
        Err(_) => {
            tracing::warn!(
                len = payload.len(),
                "structured key file payload is not {KEY_SIZE} bytes, hashing raw bytes instead"
            );
            None
        }
    }
}

fn normalize(material: &[u8]) -> [u8; KEY_SIZE] {
    if material.len() == KEY_SIZE {
        let mut out = [0u8; KEY_SIZE];
        out.copy_from_slice(material);
        return out;
    }
    Sha256::digest(material).into()
}
