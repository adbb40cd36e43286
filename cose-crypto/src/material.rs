// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Extraction of typed key material from COSE keys.
//!
//! The adapters operate on COSE_Key parameters directly (coordinates,
//! scalars, big-integer components); these helpers centralize the
//! variant/field checks so each adapter reports consistent errors.

use cose_abstractions::{CoseError, CoseKey, Curve, KeyParams};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};

/// The raw bytes of a symmetric key.
pub(crate) fn symmetric_bytes(key: &CoseKey) -> Result<&[u8], CoseError> {
    match &key.params {
        KeyParams::Symmetric { k } => Ok(k.as_slice()),
        _ => Err(CoseError::InvalidKey(
            "operation requires a symmetric key".to_string(),
        )),
    }
}

/// EC2 public coordinates.
pub(crate) fn ec2_public(key: &CoseKey) -> Result<(Curve, &[u8], &[u8]), CoseError> {
    match &key.params {
        KeyParams::Ec2 { crv, x, y, .. } => Ok((*crv, x.as_slice(), y.as_slice())),
        _ => Err(CoseError::InvalidKey(
            "operation requires an EC2 key".to_string(),
        )),
    }
}

/// EC2 private scalar.
pub(crate) fn ec2_private(key: &CoseKey) -> Result<(Curve, &[u8]), CoseError> {
    match &key.params {
        KeyParams::Ec2 {
            crv, d: Some(d), ..
        } => Ok((*crv, d.as_slice())),
        KeyParams::Ec2 { .. } => Err(CoseError::InvalidKey(
            "EC2 key has no private scalar".to_string(),
        )),
        _ => Err(CoseError::InvalidKey(
            "operation requires an EC2 key".to_string(),
        )),
    }
}

/// OKP public coordinate.
pub(crate) fn okp_public(key: &CoseKey) -> Result<(Curve, &[u8]), CoseError> {
    match &key.params {
        KeyParams::Okp { crv, x, .. } => Ok((*crv, x.as_slice())),
        _ => Err(CoseError::InvalidKey(
            "operation requires an OKP key".to_string(),
        )),
    }
}

/// OKP private key bytes.
pub(crate) fn okp_private(key: &CoseKey) -> Result<(Curve, &[u8]), CoseError> {
    match &key.params {
        KeyParams::Okp {
            crv, d: Some(d), ..
        } => Ok((*crv, d.as_slice())),
        KeyParams::Okp { .. } => Err(CoseError::InvalidKey(
            "OKP key has no private key bytes".to_string(),
        )),
        _ => Err(CoseError::InvalidKey(
            "operation requires an OKP key".to_string(),
        )),
    }
}

/// Build an `rsa` public key from COSE_Key components.
pub(crate) fn rsa_public(key: &CoseKey) -> Result<RsaPublicKey, CoseError> {
    match &key.params {
        KeyParams::Rsa { n, e, .. } => RsaPublicKey::new(
            BigUint::from_bytes_be(n),
            BigUint::from_bytes_be(e),
        )
        .map_err(|e| CoseError::InvalidKey(format!("bad RSA public key: {e}"))),
        _ => Err(CoseError::InvalidKey(
            "operation requires an RSA key".to_string(),
        )),
    }
}

/// Build an `rsa` private key from COSE_Key components.
///
/// COSE RSA private keys carry the CRT primes (RFC 8230); n, e, d, p, and q
/// are required here.
pub(crate) fn rsa_private(key: &CoseKey) -> Result<RsaPrivateKey, CoseError> {
    match &key.params {
        KeyParams::Rsa {
            n,
            e,
            d: Some(d),
            p: Some(p),
            q: Some(q),
            ..
        } => RsaPrivateKey::from_components(
            BigUint::from_bytes_be(n),
            BigUint::from_bytes_be(e),
            BigUint::from_bytes_be(d),
            vec![BigUint::from_bytes_be(p), BigUint::from_bytes_be(q)],
        )
        .map_err(|e| CoseError::InvalidKey(format!("bad RSA private key: {e}"))),
        KeyParams::Rsa { .. } => Err(CoseError::InvalidKey(
            "RSA key has no private components".to_string(),
        )),
        _ => Err(CoseError::InvalidKey(
            "operation requires an RSA key".to_string(),
        )),
    }
}
