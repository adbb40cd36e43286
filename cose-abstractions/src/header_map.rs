// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE header map types.
//!
//! COSE header parameters live in two header maps per layer:
//! - Protected headers: serialized as a CBOR bstr containing a CBOR map.
//! - Unprotected headers: serialized as an inline CBOR map.
//!
//! For protected headers, COSE requires the serialized bytes to be included
//! verbatim in Sig/MAC/Enc structures. [`CoseHeaderMap`] therefore retains
//! the encoded bytes alongside the decoded map: a decoded message keeps the
//! received bytes, a freshly built message caches its canonical encoding the
//! first time it is signed/MACed/encrypted, and any mutation clears the
//! cache.

use std::collections::BTreeMap;

use crate::algorithms::CoseAlgorithm;
use crate::keys::CoseKey;

/// A header map key: an integer label (the common case) or a text label.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum HeaderKey {
    Int(i64),
    Text(String),
}

/// A header map value.
///
/// Known labels parse to the typed variants (`Alg`, `Labels`, `Key`);
/// unknown labels keep their raw CBOR shape and round-trip unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    Bool(bool),
    Null,
    /// A resolved algorithm identifier (label `alg`).
    Alg(CoseAlgorithm),
    /// A list of header labels (label `crit`).
    Labels(Vec<HeaderKey>),
    /// An embedded COSE key (labels `ephemeral_key`, `static_key`).
    Key(CoseKey),
    Array(Vec<HeaderValue>),
    Map(BTreeMap<HeaderKey, HeaderValue>),
}

impl HeaderValue {
    /// The value as an algorithm, if it is one.
    pub fn as_alg(&self) -> Option<CoseAlgorithm> {
        match self {
            HeaderValue::Alg(a) => Some(*a),
            _ => None,
        }
    }

    /// The value as a byte string, if it is one.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            HeaderValue::Bytes(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// The value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            HeaderValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The value as an embedded key, if it is one.
    pub fn as_key(&self) -> Option<&CoseKey> {
        match self {
            HeaderValue::Key(k) => Some(k),
            _ => None,
        }
    }
}

/// A single COSE header bucket.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CoseHeaderMap {
    /// Serialized form of the map. Present on decoded messages (the received
    /// bytes, kept verbatim) and after an operation froze the canonical
    /// encoding. `None` means not yet serialized.
    encoded: Option<Vec<u8>>,

    /// Decoded map used for lookups.
    map: BTreeMap<HeaderKey, HeaderValue>,
}

impl CoseHeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from a decoded map plus (for protected buckets) the exact
    /// bytes it was decoded from.
    pub fn from_parts(encoded: Option<Vec<u8>>, map: BTreeMap<HeaderKey, HeaderValue>) -> Self {
        Self { encoded, map }
    }

    /// The serialized map bytes, if this bucket has been serialized.
    pub fn encoded(&self) -> Option<&[u8]> {
        self.encoded.as_deref()
    }

    /// Record the serialized form of this bucket.
    pub fn set_encoded(&mut self, bytes: Vec<u8>) {
        self.encoded = Some(bytes);
    }

    /// Insert an attribute, invalidating any cached serialization.
    pub fn insert(&mut self, key: HeaderKey, value: HeaderValue) -> Option<HeaderValue> {
        self.encoded = None;
        self.map.insert(key, value)
    }

    /// Remove an attribute, invalidating any cached serialization.
    pub fn remove(&mut self, key: &HeaderKey) -> Option<HeaderValue> {
        self.encoded = None;
        self.map.remove(key)
    }

    pub fn get(&self, key: &HeaderKey) -> Option<&HeaderValue> {
        self.map.get(key)
    }

    /// Look up an integer-labelled attribute.
    pub fn get_label(&self, label: i64) -> Option<&HeaderValue> {
        self.map.get(&HeaderKey::Int(label))
    }

    pub fn contains(&self, key: &HeaderKey) -> bool {
        self.map.contains_key(key)
    }

    /// The resolved `alg` attribute, if present in this bucket.
    pub fn alg(&self) -> Option<CoseAlgorithm> {
        self.get_label(crate::header_params::ALG)
            .and_then(HeaderValue::as_alg)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn map(&self) -> &BTreeMap<HeaderKey, HeaderValue> {
        &self.map
    }

    pub fn clear(&mut self) {
        self.encoded = None;
        self.map.clear();
    }
}
