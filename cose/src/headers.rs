// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Header bucket pair helpers shared by the message operations.
//!
//! COSE specifies header lookup as protected-bucket-first, and forbids the
//! same label from living in both buckets. Mutation goes through
//! [`set_bucket_attr`] so the overlap rule holds by construction; decoded
//! messages are checked by the codec instead.

use cose_abstractions::header_params;
use cose_abstractions::{
    CoseAlgorithm, CoseError, CoseHeaderMap, CoseKey, HeaderKey, HeaderValue,
};
use rand_core::CryptoRngCore;

/// Look up an attribute across a bucket pair, protected first.
pub fn get_attr<'a>(
    protected: &'a CoseHeaderMap,
    unprotected: &'a CoseHeaderMap,
    label: i64,
) -> Option<&'a HeaderValue> {
    protected
        .get_label(label)
        .or_else(|| unprotected.get_label(label))
}

/// The resolved `alg` attribute of a bucket pair.
pub fn alg_of(
    protected: &CoseHeaderMap,
    unprotected: &CoseHeaderMap,
) -> Result<CoseAlgorithm, CoseError> {
    get_attr(protected, unprotected, header_params::ALG)
        .and_then(HeaderValue::as_alg)
        .ok_or_else(|| CoseError::InvalidAlgorithm("missing alg header".to_string()))
}

/// Insert into one bucket, rejecting labels already present in the other.
pub(crate) fn set_bucket_attr(
    target: &mut CoseHeaderMap,
    other: &CoseHeaderMap,
    key: HeaderKey,
    value: HeaderValue,
) -> Result<(), CoseError> {
    if other.contains(&key) {
        return Err(CoseError::InvalidHeader(format!(
            "label {key:?} is already present in the other bucket"
        )));
    }
    target.insert(key, value);
    Ok(())
}

/// Resolve the AEAD nonce carried by the headers, if any.
///
/// Precedence: an explicit `IV` attribute wins; else `partial_IV` is
/// left-padded and XORed into the key's `base_IV`. `Ok(None)` means the
/// headers carry no nonce (the encrypt path then draws a fresh one).
pub(crate) fn nonce_from_headers(
    protected: &CoseHeaderMap,
    unprotected: &CoseHeaderMap,
    alg: CoseAlgorithm,
    base_iv: Option<&[u8]>,
) -> Result<Option<Vec<u8>>, CoseError> {
    let nonce_len = alg.nonce_length().ok_or_else(|| {
        CoseError::InvalidAlgorithm(format!("{} does not take an IV", alg.name()))
    })?;

    let iv = get_attr(protected, unprotected, header_params::IV);
    let partial = get_attr(protected, unprotected, header_params::PARTIAL_IV);

    if iv.is_some() && partial.is_some() {
        return Err(CoseError::InvalidHeader(
            "IV and Partial IV must not both be present".to_string(),
        ));
    }

    if let Some(value) = iv {
        let iv = value
            .as_bytes()
            .ok_or_else(|| CoseError::InvalidHeader("IV must be a byte string".to_string()))?;
        if iv.len() != nonce_len {
            return Err(CoseError::InvalidHeader(format!(
                "IV has length {}, expected {nonce_len}",
                iv.len()
            )));
        }
        return Ok(Some(iv.to_vec()));
    }

    if let Some(value) = partial {
        let partial = value.as_bytes().ok_or_else(|| {
            CoseError::InvalidHeader("Partial IV must be a byte string".to_string())
        })?;
        let base_iv = base_iv.ok_or_else(|| {
            CoseError::InvalidHeader(
                "Partial IV requires a key carrying a Base IV".to_string(),
            )
        })?;
        if base_iv.len() != nonce_len {
            return Err(CoseError::InvalidKey(format!(
                "Base IV has length {}, expected {nonce_len}",
                base_iv.len()
            )));
        }
        if partial.len() > nonce_len {
            return Err(CoseError::InvalidHeader(format!(
                "Partial IV has length {}, longer than the {nonce_len}-byte IV",
                partial.len()
            )));
        }
        // Left-pad the partial IV with zeros, then XOR with the base IV.
        let mut nonce = base_iv.to_vec();
        let offset = nonce_len - partial.len();
        for (i, byte) in partial.iter().enumerate() {
            nonce[offset + i] ^= byte;
        }
        return Ok(Some(nonce));
    }

    Ok(None)
}

/// Draw a fresh nonce for an encryption and record it in the unprotected
/// bucket.
pub(crate) fn generate_nonce<R: CryptoRngCore>(
    unprotected: &mut CoseHeaderMap,
    alg: CoseAlgorithm,
    rng: &mut R,
) -> Result<Vec<u8>, CoseError> {
    let nonce_len = alg.nonce_length().ok_or_else(|| {
        CoseError::InvalidAlgorithm(format!("{} does not take an IV", alg.name()))
    })?;
    let nonce = cose_crypto::rng::random_bytes(rng, nonce_len)?;
    unprotected.insert(
        HeaderKey::Int(header_params::IV),
        HeaderValue::Bytes(nonce.clone()),
    );
    Ok(nonce)
}

/// The public part of an EC key, for transport in the `ephemeral_key`
/// attribute.
pub(crate) fn public_part(key: &CoseKey) -> CoseKey {
    let mut public = key.clone();
    match &mut public.params {
        cose_abstractions::KeyParams::Ec2 { d, .. } => *d = None,
        cose_abstractions::KeyParams::Okp { d, .. } => *d = None,
        _ => {}
    }
    public.key_ops = Vec::new();
    public
}

/// Implements the shared header accessors for a bucket-carrying type.
macro_rules! impl_header_ops {
    ($($t:ty),+ $(,)?) => {
        $(impl crate::HeaderOps for $t {
            fn set_protected(
                &mut self,
                key: cose_abstractions::HeaderKey,
                value: cose_abstractions::HeaderValue,
            ) -> Result<(), cose_abstractions::CoseError> {
                crate::headers::set_bucket_attr(&mut self.protected, &self.unprotected, key, value)
            }

            fn set_unprotected(
                &mut self,
                key: cose_abstractions::HeaderKey,
                value: cose_abstractions::HeaderValue,
            ) -> Result<(), cose_abstractions::CoseError> {
                crate::headers::set_bucket_attr(&mut self.unprotected, &self.protected, key, value)
            }

            fn get_attr(&self, label: i64) -> Option<&cose_abstractions::HeaderValue> {
                crate::headers::get_attr(&self.protected, &self.unprotected, label)
            }

            fn alg(&self) -> Result<cose_abstractions::CoseAlgorithm, cose_abstractions::CoseError> {
                crate::headers::alg_of(&self.protected, &self.unprotected)
            }
        })+
    };
}

pub(crate) use impl_header_ops;
