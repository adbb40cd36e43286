// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Key encoding and decoding (RFC 8152 tables 3-6, RFC 8230).
//!
//! Keys serialize as CBOR maps with integer labels. Encoding is canonical
//! (map entries sorted bytewise on their encoded keys); decoding is strict:
//! duplicate labels, trailing bytes, unknown `kty` values, and wrong-length
//! field elements are all rejected.

use std::collections::BTreeMap;

use cose_abstractions::{
    CoseAlgorithm, CoseError, CoseKey, Curve, HeaderKey, HeaderValue, KeyOperation, KeyParams,
    KeyType,
};
use minicbor::{Decoder, Encoder};

use crate::header_map::decode_header_map_from_decoder;

// Common key map labels (RFC 8152 table 3).
const KTY: i64 = 1;
const KID: i64 = 2;
const ALG: i64 = 3;
const KEY_OPS: i64 = 4;
const BASE_IV: i64 = 5;

// EC2/OKP labels (tables 4 and 5).
const CRV: i64 = -1;
const X: i64 = -2;
const Y: i64 = -3;
const D: i64 = -4;

// Symmetric label (table 6).
const K: i64 = -1;

// RSA labels (RFC 8230 table 4).
const RSA_N: i64 = -1;
const RSA_E: i64 = -2;
const RSA_D: i64 = -3;
const RSA_P: i64 = -4;
const RSA_Q: i64 = -5;
const RSA_DP: i64 = -6;
const RSA_DQ: i64 = -7;
const RSA_QINV: i64 = -8;

/// Decode a COSE key from its CBOR map encoding.
pub fn decode_key(bytes: &[u8]) -> Result<CoseKey, CoseError> {
    if bytes.is_empty() {
        return Err(CoseError::InvalidKeyFormat("empty input".to_string()));
    }

    let mut dec = Decoder::new(bytes);
    let raw = decode_header_map_from_decoder(&mut dec)
        .map_err(|e| CoseError::InvalidKeyFormat(e.to_string()))?;

    if dec.position() != bytes.len() {
        return Err(CoseError::InvalidKeyFormat(
            "trailing bytes after key map".to_string(),
        ));
    }

    key_from_raw_map(&raw)
}

/// Build a COSE key from a raw-decoded CBOR map.
///
/// Also used for keys embedded in headers (`ephemeral_key`, `static_key`).
pub fn key_from_raw_map(raw: &BTreeMap<HeaderKey, HeaderValue>) -> Result<CoseKey, CoseError> {
    let kty = match get(raw, KTY) {
        Some(HeaderValue::Int(id)) => KeyType::from_id(*id)?,
        Some(other) => {
            return Err(CoseError::InvalidKeyFormat(format!(
                "kty must be an integer, got {other:?}"
            )));
        }
        None => {
            return Err(CoseError::InvalidKeyFormat("missing kty".to_string()));
        }
    };

    let mut key = match kty {
        KeyType::Symmetric => CoseKey::symmetric(required_bytes(raw, K, "k")?)?,
        KeyType::Ec2 => {
            let crv = curve(raw)?;
            if let Some(HeaderValue::Bool(_)) = get(raw, Y) {
                return Err(CoseError::InvalidKeyFormat(
                    "compressed EC2 points are not supported".to_string(),
                ));
            }
            CoseKey::ec2(
                crv,
                required_bytes(raw, X, "x")?,
                required_bytes(raw, Y, "y")?,
                optional_bytes(raw, D, "d")?,
            )?
        }
        KeyType::Okp => {
            let crv = curve(raw)?;
            CoseKey::okp(crv, required_bytes(raw, X, "x")?, optional_bytes(raw, D, "d")?)?
        }
        KeyType::Rsa => {
            let n = required_bytes(raw, RSA_N, "n")?;
            let e = required_bytes(raw, RSA_E, "e")?;
            match optional_bytes(raw, RSA_D, "d")? {
                None => CoseKey::rsa(n, e)?,
                Some(d) => {
                    let p = optional_bytes(raw, RSA_P, "p")?;
                    let q = optional_bytes(raw, RSA_Q, "q")?;
                    let (p, q) = match (p, q) {
                        (Some(p), Some(q)) => (p, q),
                        _ => {
                            return Err(CoseError::InvalidKeyFormat(
                                "RSA private key requires p and q".to_string(),
                            ));
                        }
                    };
                    CoseKey::rsa_private(
                        n,
                        e,
                        d,
                        p,
                        q,
                        optional_bytes(raw, RSA_DP, "dP")?,
                        optional_bytes(raw, RSA_DQ, "dQ")?,
                        optional_bytes(raw, RSA_QINV, "qInv")?,
                    )?
                }
            }
        }
    };

    key.kid = optional_bytes(raw, KID, "kid")?;

    key.alg = match get(raw, ALG) {
        Some(HeaderValue::Int(id)) => Some(CoseAlgorithm::from_id(*id)?),
        Some(HeaderValue::Text(alias)) => Some(CoseAlgorithm::from_name(alias)?),
        Some(other) => {
            return Err(CoseError::InvalidKeyFormat(format!(
                "alg must be an integer or text identifier, got {other:?}"
            )));
        }
        None => None,
    };

    key.key_ops = match get(raw, KEY_OPS) {
        Some(HeaderValue::Array(items)) => {
            let mut ops = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    HeaderValue::Int(id) => ops.push(KeyOperation::from_id(*id)?),
                    other => {
                        return Err(CoseError::InvalidKeyFormat(format!(
                            "key_ops entries must be integers, got {other:?}"
                        )));
                    }
                }
            }
            ops
        }
        Some(other) => {
            return Err(CoseError::InvalidKeyFormat(format!(
                "key_ops must be an array, got {other:?}"
            )));
        }
        None => Vec::new(),
    };

    key.base_iv = optional_bytes(raw, BASE_IV, "Base IV")?;

    Ok(key)
}

fn get<'a>(
    raw: &'a BTreeMap<HeaderKey, HeaderValue>,
    label: i64,
) -> Option<&'a HeaderValue> {
    raw.get(&HeaderKey::Int(label))
}

fn curve(raw: &BTreeMap<HeaderKey, HeaderValue>) -> Result<Curve, CoseError> {
    match get(raw, CRV) {
        Some(HeaderValue::Int(id)) => Curve::from_id(*id),
        Some(other) => Err(CoseError::InvalidKeyFormat(format!(
            "crv must be an integer, got {other:?}"
        ))),
        None => Err(CoseError::InvalidKeyFormat("missing crv".to_string())),
    }
}

fn optional_bytes(
    raw: &BTreeMap<HeaderKey, HeaderValue>,
    label: i64,
    name: &str,
) -> Result<Option<Vec<u8>>, CoseError> {
    match get(raw, label) {
        Some(HeaderValue::Bytes(b)) => Ok(Some(b.clone())),
        Some(other) => Err(CoseError::InvalidKeyFormat(format!(
            "{name} must be a byte string, got {other:?}"
        ))),
        None => Ok(None),
    }
}

fn required_bytes(
    raw: &BTreeMap<HeaderKey, HeaderValue>,
    label: i64,
    name: &str,
) -> Result<Vec<u8>, CoseError> {
    optional_bytes(raw, label, name)?
        .ok_or_else(|| CoseError::InvalidKeyFormat(format!("missing {name}")))
}

/// Encode a COSE key as a canonical CBOR map.
pub fn encode_key(key: &CoseKey) -> Vec<u8> {
    let mut entries: Vec<(i64, HeaderValue)> = vec![(KTY, HeaderValue::Int(key.kty().id()))];

    if let Some(kid) = &key.kid {
        entries.push((KID, HeaderValue::Bytes(kid.clone())));
    }
    if let Some(alg) = key.alg {
        entries.push((ALG, HeaderValue::Int(alg.id())));
    }
    if !key.key_ops.is_empty() {
        entries.push((
            KEY_OPS,
            HeaderValue::Array(
                key.key_ops
                    .iter()
                    .map(|op| HeaderValue::Int(op.id()))
                    .collect(),
            ),
        ));
    }
    if let Some(base_iv) = &key.base_iv {
        entries.push((BASE_IV, HeaderValue::Bytes(base_iv.clone())));
    }

    match &key.params {
        KeyParams::Symmetric { k } => {
            entries.push((K, HeaderValue::Bytes(k.clone())));
        }
        KeyParams::Ec2 { crv, x, y, d } => {
            entries.push((CRV, HeaderValue::Int(crv.id())));
            // Field elements keep their fixed per-curve length.
            entries.push((X, HeaderValue::Bytes(x.clone())));
            entries.push((Y, HeaderValue::Bytes(y.clone())));
            if let Some(d) = d {
                entries.push((D, HeaderValue::Bytes(d.clone())));
            }
        }
        KeyParams::Okp { crv, x, d } => {
            entries.push((CRV, HeaderValue::Int(crv.id())));
            entries.push((X, HeaderValue::Bytes(x.clone())));
            if let Some(d) = d {
                entries.push((D, HeaderValue::Bytes(d.clone())));
            }
        }
        KeyParams::Rsa {
            n,
            e,
            d,
            p,
            q,
            dp,
            dq,
            qinv,
        } => {
            // Big integers are emitted minimal-length.
            entries.push((RSA_N, HeaderValue::Bytes(minimal(n))));
            entries.push((RSA_E, HeaderValue::Bytes(minimal(e))));
            for (label, field) in [
                (RSA_D, d),
                (RSA_P, p),
                (RSA_Q, q),
                (RSA_DP, dp),
                (RSA_DQ, dq),
                (RSA_QINV, qinv),
            ] {
                if let Some(bytes) = field {
                    entries.push((label, HeaderValue::Bytes(minimal(bytes))));
                }
            }
        }
    }

    encode_int_label_map(&entries)
}

/// Strip leading zero bytes from an unsigned big-endian integer, keeping at
/// least one byte.
fn minimal(bytes: &[u8]) -> Vec<u8> {
    let start = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len().saturating_sub(1));
    bytes[start..].to_vec()
}

/// Encode integer-labelled entries as a map sorted bytewise on the encoded
/// labels.
fn encode_int_label_map(entries: &[(i64, HeaderValue)]) -> Vec<u8> {
    let mut sorted: Vec<(Vec<u8>, &HeaderValue)> = entries
        .iter()
        .map(|(label, value)| {
            let mut key_bytes = Vec::new();
            Encoder::new(&mut key_bytes).i64(*label).ok();
            (key_bytes, value)
        })
        .collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = Vec::new();
    let mut enc = Encoder::new(&mut out);
    enc.map(sorted.len() as u64).ok();
    for (key_bytes, value) in sorted {
        enc.writer_mut().extend_from_slice(&key_bytes);
        crate::header_map::encode_value(&mut enc, value);
    }
    out
}

/// Decode a key map that arrives as a raw header value (not as bytes).
pub fn key_from_header_value(value: &HeaderValue) -> Result<CoseKey, CoseError> {
    match value {
        HeaderValue::Key(key) => Ok(key.clone()),
        HeaderValue::Map(map) => key_from_raw_map(map),
        other => Err(CoseError::InvalidKeyFormat(format!(
            "expected a COSE key map, got {other:?}"
        ))),
    }
}
