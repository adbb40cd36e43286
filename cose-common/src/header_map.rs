// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE header map decoding and canonical encoding.
//!
//! Decoding is intentionally conservative:
//! - Only the CBOR types COSE headers need are supported.
//! - Indefinite-length arrays/maps are rejected.
//! - Duplicate labels within a map are rejected.
//! - Known labels are parsed into their typed form; unknown labels are
//!   carried as raw values and round-trip unchanged.
//!
//! Encoding is canonical: definite lengths, shortest-form integers (via
//! minicbor), and map entries sorted bytewise on their encoded keys, so the
//! protected bucket serializes to the same bytes every time.

use std::collections::BTreeMap;

use cose_abstractions::header_params::{self, AttrKind};
use cose_abstractions::{CoseAlgorithm, CoseError, CoseHeaderMap, HeaderKey, HeaderValue};
use minicbor::data::Type;
use minicbor::{Decoder, Encoder};

use crate::key_codec;

/// Decode a header map from the CBOR bytes contained within a protected
/// header bstr.
///
/// An empty bstr means an empty map.
pub(crate) fn decode_header_map_from_cbor(
    bytes: &[u8],
) -> Result<BTreeMap<HeaderKey, HeaderValue>, CoseError> {
    if bytes.is_empty() {
        return Ok(BTreeMap::new());
    }

    let mut dec = Decoder::new(bytes);
    let map = decode_header_map_from_decoder(&mut dec)?;

    if dec.position() != bytes.len() {
        return Err(CoseError::InvalidHeader(
            "trailing bytes after header map".to_string(),
        ));
    }

    Ok(map)
}

/// Decode a header map directly from a CBOR decoder.
///
/// This is used for unprotected headers, which appear inline in messages.
pub(crate) fn decode_header_map_from_decoder(
    dec: &mut Decoder<'_>,
) -> Result<BTreeMap<HeaderKey, HeaderValue>, CoseError> {
    let len = dec
        .map()
        .map_err(|e| CoseError::InvalidHeader(format!("failed to read map: {e}")))?
        .ok_or_else(|| {
            CoseError::InvalidHeader("indefinite-length maps are not supported".to_string())
        })?;

    let mut map = BTreeMap::new();
    for _ in 0..len {
        let key = decode_header_key(dec)?;
        let value = decode_raw_value(dec)?;
        if map.insert(key.clone(), value).is_some() {
            return Err(CoseError::InvalidHeader(format!(
                "duplicate header label: {key:?}"
            )));
        }
    }

    Ok(map)
}

/// Decode a COSE header map key.
///
/// COSE keys are most often small integers, but may also be text.
fn decode_header_key(dec: &mut Decoder<'_>) -> Result<HeaderKey, CoseError> {
    match datatype(dec)? {
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => {
            let i = dec
                .i64()
                .map_err(|e| CoseError::InvalidHeader(format!("failed to decode int label: {e}")))?;
            Ok(HeaderKey::Int(i))
        }
        Type::String => {
            let s = dec.str().map_err(|e| {
                CoseError::InvalidHeader(format!("failed to decode text label: {e}"))
            })?;
            Ok(HeaderKey::Text(s.to_string()))
        }
        other => Err(CoseError::InvalidHeader(format!(
            "unsupported header label type: {other:?}"
        ))),
    }
}

/// Decode a raw header value, without label-specific parsing.
pub(crate) fn decode_raw_value(dec: &mut Decoder<'_>) -> Result<HeaderValue, CoseError> {
    match datatype(dec)? {
        Type::Null => {
            dec.null().map_err(decode_err)?;
            Ok(HeaderValue::Null)
        }
        Type::Bool => Ok(HeaderValue::Bool(dec.bool().map_err(decode_err)?)),
        Type::Bytes => Ok(HeaderValue::Bytes(dec.bytes().map_err(decode_err)?.to_vec())),
        Type::String => Ok(HeaderValue::Text(dec.str().map_err(decode_err)?.to_string())),
        Type::I8
        | Type::I16
        | Type::I32
        | Type::I64
        | Type::Int
        | Type::U8
        | Type::U16
        | Type::U32
        | Type::U64 => Ok(HeaderValue::Int(dec.i64().map_err(decode_err)?)),
        Type::Array => {
            let len = dec.array().map_err(decode_err)?.ok_or_else(|| {
                CoseError::InvalidHeader("indefinite-length arrays are not supported".to_string())
            })?;
            let mut out = Vec::with_capacity(len as usize);
            for _ in 0..len {
                out.push(decode_raw_value(dec)?);
            }
            Ok(HeaderValue::Array(out))
        }
        Type::Map => {
            let len = dec.map().map_err(decode_err)?.ok_or_else(|| {
                CoseError::InvalidHeader("indefinite-length maps are not supported".to_string())
            })?;
            let mut out = BTreeMap::new();
            for _ in 0..len {
                let k = decode_header_key(dec)?;
                let v = decode_raw_value(dec)?;
                if out.insert(k.clone(), v).is_some() {
                    return Err(CoseError::InvalidHeader(format!(
                        "duplicate label in nested map: {k:?}"
                    )));
                }
            }
            Ok(HeaderValue::Map(out))
        }
        other => Err(CoseError::InvalidHeader(format!(
            "unsupported header value type: {other:?}"
        ))),
    }
}

fn datatype(dec: &mut Decoder<'_>) -> Result<Type, CoseError> {
    dec.datatype()
        .map_err(|e| CoseError::InvalidHeader(e.to_string()))
}

fn decode_err(e: minicbor::decode::Error) -> CoseError {
    CoseError::InvalidHeader(e.to_string())
}

/// Parse known labels of a raw-decoded header map into their typed form.
///
/// With `strict` set, labels outside the registry fail with
/// `UnknownAttribute` instead of being carried opaquely.
pub(crate) fn parse_attributes(
    raw: BTreeMap<HeaderKey, HeaderValue>,
    strict: bool,
) -> Result<BTreeMap<HeaderKey, HeaderValue>, CoseError> {
    let mut out = BTreeMap::new();
    for (key, value) in raw {
        let parsed = match &key {
            HeaderKey::Int(label) => match header_params::expected(*label) {
                Some(kind) => parse_known_value(*label, kind, value)?,
                None if strict => {
                    return Err(CoseError::UnknownAttribute(format!(
                        "unknown integer label {label}"
                    )));
                }
                None => value,
            },
            HeaderKey::Text(name) => {
                if strict {
                    return Err(CoseError::UnknownAttribute(format!(
                        "unknown text label {name:?}"
                    )));
                }
                value
            }
        };
        out.insert(key, parsed);
    }
    Ok(out)
}

/// Parse a single known-label value into its typed form.
fn parse_known_value(
    label: i64,
    kind: AttrKind,
    value: HeaderValue,
) -> Result<HeaderValue, CoseError> {
    let name = header_params::label_name(label).unwrap_or("header");
    match kind {
        AttrKind::Alg => match value {
            HeaderValue::Int(id) => Ok(HeaderValue::Alg(CoseAlgorithm::from_id(id)?)),
            HeaderValue::Text(alias) => Ok(HeaderValue::Alg(CoseAlgorithm::from_name(&alias)?)),
            other => Err(CoseError::InvalidHeader(format!(
                "{name} must be an integer or text algorithm identifier, got {other:?}"
            ))),
        },
        AttrKind::Labels => match value {
            HeaderValue::Array(items) if !items.is_empty() => {
                let mut labels = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        HeaderValue::Int(i) => labels.push(HeaderKey::Int(i)),
                        HeaderValue::Text(t) => labels.push(HeaderKey::Text(t)),
                        other => {
                            return Err(CoseError::InvalidCriticalValue(format!(
                                "{name} entries must be labels, got {other:?}"
                            )));
                        }
                    }
                }
                Ok(HeaderValue::Labels(labels))
            }
            HeaderValue::Array(_) => Err(CoseError::InvalidCriticalValue(format!(
                "{name} must not be empty"
            ))),
            other => Err(CoseError::InvalidHeader(format!(
                "{name} must be an array of labels, got {other:?}"
            ))),
        },
        AttrKind::Bytes => match value {
            HeaderValue::Bytes(_) => Ok(value),
            other => Err(CoseError::InvalidHeader(format!(
                "{name} must be a byte string, got {other:?}"
            ))),
        },
        AttrKind::BytesTextOrInt => match value {
            HeaderValue::Bytes(_) | HeaderValue::Text(_) | HeaderValue::Int(_) => Ok(value),
            other => Err(CoseError::InvalidHeader(format!(
                "{name} must be a byte string, text string, or integer, got {other:?}"
            ))),
        },
        AttrKind::Key => match value {
            HeaderValue::Map(map) => Ok(HeaderValue::Key(key_codec::key_from_raw_map(&map)?)),
            other => Err(CoseError::InvalidHeader(format!(
                "{name} must be a COSE key map, got {other:?}"
            ))),
        },
        AttrKind::Raw => Ok(value),
    }
}

/// Enforce the cross-bucket invariants after both buckets are available.
///
/// - No label may appear in both buckets.
/// - `crit` may only appear in the protected bucket, must list labels that
///   are present in the protected bucket, and every listed label must be
///   understood by this implementation.
/// - `IV` and `partial_IV` must not both be present on the same layer.
pub fn validate_buckets(
    protected: &CoseHeaderMap,
    unprotected: &CoseHeaderMap,
) -> Result<(), CoseError> {
    for key in protected.map().keys() {
        if unprotected.contains(key) {
            return Err(CoseError::InvalidHeader(format!(
                "label {key:?} present in both protected and unprotected buckets"
            )));
        }
    }

    if unprotected.get_label(header_params::CRIT).is_some() {
        return Err(CoseError::InvalidHeader(
            "crit is only allowed in the protected bucket".to_string(),
        ));
    }

    if let Some(value) = protected.get_label(header_params::CRIT) {
        let labels = match value {
            HeaderValue::Labels(labels) => labels,
            _ => {
                return Err(CoseError::InvalidCriticalValue(
                    "crit is not a label list".to_string(),
                ));
            }
        };
        for label in labels {
            if !protected.contains(label) {
                return Err(CoseError::InvalidCriticalValue(format!(
                    "critical label {label:?} is not present in the protected bucket"
                )));
            }
            if !header_params::is_understood(label) {
                return Err(CoseError::InvalidCriticalValue(format!(
                    "critical label {label:?} is not understood"
                )));
            }
        }
    }

    let has_iv = protected.get_label(header_params::IV).is_some()
        || unprotected.get_label(header_params::IV).is_some();
    let has_partial = protected.get_label(header_params::PARTIAL_IV).is_some()
        || unprotected.get_label(header_params::PARTIAL_IV).is_some();
    if has_iv && has_partial {
        return Err(CoseError::InvalidHeader(
            "IV and Partial IV must not both be present".to_string(),
        ));
    }

    Ok(())
}

/// Encode a header map key into canonical CBOR.
///
/// Writes into a `Vec` cannot fail, so the encoder results are discarded.
fn encode_header_key(enc: &mut Encoder<&mut Vec<u8>>, key: &HeaderKey) {
    match key {
        HeaderKey::Int(i) => enc.i64(*i).ok(),
        HeaderKey::Text(s) => enc.str(s).ok(),
    };
}

/// Encode a header value into canonical CBOR.
pub(crate) fn encode_value(enc: &mut Encoder<&mut Vec<u8>>, value: &HeaderValue) {
    match value {
        HeaderValue::Int(i) => {
            enc.i64(*i).ok();
        }
        HeaderValue::Bytes(b) => {
            enc.bytes(b).ok();
        }
        HeaderValue::Text(s) => {
            enc.str(s).ok();
        }
        HeaderValue::Bool(b) => {
            enc.bool(*b).ok();
        }
        HeaderValue::Null => {
            enc.null().ok();
        }
        HeaderValue::Alg(a) => {
            enc.i64(a.id()).ok();
        }
        HeaderValue::Labels(labels) => {
            enc.array(labels.len() as u64).ok();
            for label in labels {
                encode_header_key(enc, label);
            }
        }
        HeaderValue::Key(key) => {
            let bytes = key_codec::encode_key(key);
            enc.writer_mut().extend_from_slice(&bytes);
        }
        HeaderValue::Array(items) => {
            enc.array(items.len() as u64).ok();
            for item in items {
                encode_value(enc, item);
            }
        }
        HeaderValue::Map(map) => {
            encode_map_canonical(enc, map);
        }
    }
}

/// Encode a map with entries sorted bytewise on their encoded keys, per the
/// deterministic encoding rules.
pub(crate) fn encode_map_canonical(
    enc: &mut Encoder<&mut Vec<u8>>,
    map: &BTreeMap<HeaderKey, HeaderValue>,
) {
    let mut entries: Vec<(Vec<u8>, &HeaderValue)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        let mut key_bytes = Vec::new();
        let mut key_enc = Encoder::new(&mut key_bytes);
        encode_header_key(&mut key_enc, key);
        entries.push((key_bytes, value));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    enc.map(entries.len() as u64).ok();
    for (key_bytes, value) in entries {
        enc.writer_mut().extend_from_slice(&key_bytes);
        encode_value(enc, value);
    }
}

/// The canonical serialization of a header map.
pub fn encode_header_map(map: &CoseHeaderMap) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = Encoder::new(&mut out);
    encode_map_canonical(&mut enc, map.map());
    out
}

/// The bytes a protected bucket contributes to crypto structures: the
/// retained/cached serialization when present, else a fresh canonical
/// encoding. An empty bucket contributes zero bytes.
pub fn protected_bytes(map: &CoseHeaderMap) -> Vec<u8> {
    if let Some(bytes) = map.encoded() {
        return bytes.to_vec();
    }
    if map.is_empty() {
        return Vec::new();
    }
    encode_header_map(map)
}

/// Serialize a protected bucket and freeze the result, so later structure
/// computations and re-encodings reuse identical bytes.
pub fn freeze_protected(map: &mut CoseHeaderMap) -> Vec<u8> {
    let bytes = protected_bytes(map);
    map.set_encoded(bytes.clone());
    bytes
}
