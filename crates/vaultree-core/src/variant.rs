//! Self-describing typed dictionary
//!
//! KDF parameters and public custom data travel through the container codec
//! as a typed dictionary: named fields, each tagged with its concrete type.
//! The codec (out of scope here) must round-trip these byte-exactly, so the
//! representation is a plain serde-derived map with no lossy coercions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// A single typed value in a [`VariantDictionary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariantValue {
    U32(u32),
    U64(u64),
    I32(i32),
    I64(i64),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
}

/// An ordered dictionary of named, typed fields.
///
/// Typed getters return `None` both for a missing field and for a field of
/// the wrong type; algorithm code treats either as "parameter absent".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantDictionary {
    fields: BTreeMap<String, VariantValue>,
}

impl VariantDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn set(&mut self, name: impl Into<String>, value: VariantValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&VariantValue> {
        self.fields.get(name)
    }

    pub fn set_u32(&mut self, name: impl Into<String>, value: u32) {
        self.set(name, VariantValue::U32(value));
    }

    pub fn set_u64(&mut self, name: impl Into<String>, value: u64) {
        self.set(name, VariantValue::U64(value));
    }

    pub fn set_bytes(&mut self, name: impl Into<String>, value: Vec<u8>) {
        self.set(name, VariantValue::Bytes(value));
    }

    pub fn get_u32(&self, name: &str) -> Option<u32> {
        match self.fields.get(name) {
            Some(VariantValue::U32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        match self.fields.get(name) {
            Some(VariantValue::U64(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_bytes(&self, name: &str) -> Option<&[u8]> {
        match self.fields.get(name) {
            Some(VariantValue::Bytes(v)) => Some(v.as_slice()),
            _ => None,
        }
    }

    /// Store a UUID as its 16 raw bytes (the container's convention).
    pub fn set_uuid(&mut self, name: impl Into<String>, value: Uuid) {
        self.set_bytes(name, value.as_bytes().to_vec());
    }

    pub fn get_uuid(&self, name: &str) -> Option<Uuid> {
        let bytes = self.get_bytes(name)?;
        let arr: [u8; 16] = bytes.try_into().ok()?;
        Some(Uuid::from_bytes(arr))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &VariantValue)> {
        self.fields.iter()
    }
}
