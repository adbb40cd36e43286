// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Signature primitives.
//!
//! Signing and verification over the Sig_structure bytes, dispatched per
//! algorithm:
//! - ECDSA over P-256/P-384/P-521/secp256k1 (raw `r || s` signatures).
//! - EdDSA over Ed25519.
//! - RSASSA-PSS and RSASSA-PKCS1-v1_5 (SHA-1/SHA-2 family).
//!
//! Keys are COSE_Key values; coordinates and scalars are used directly
//! rather than going through DER.

use cose_abstractions::{CoseAlgorithm, CoseError, CoseKey, Curve};
use rand_core::CryptoRngCore;
use rsa::sha2::{Sha256, Sha384, Sha512};
use rsa::{pkcs1v15, pss};
use signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};

use crate::material;

/// Sign `data` (a Sig_structure) with `key` under `alg`.
///
/// The RNG is consumed by the randomized RSA-PSS salt; the other algorithms
/// are deterministic.
pub fn sign<R: CryptoRngCore>(
    alg: CoseAlgorithm,
    key: &CoseKey,
    data: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, CoseError> {
    match alg {
        CoseAlgorithm::ES256 => sign_ecdsa_p256(key, data),
        CoseAlgorithm::ES384 => sign_ecdsa_p384(key, data),
        CoseAlgorithm::ES512 => sign_ecdsa_p521(key, data),
        CoseAlgorithm::ES256K => sign_ecdsa_k256(key, data),
        CoseAlgorithm::EdDSA => sign_eddsa(key, data),
        CoseAlgorithm::PS256 => {
            let sk = pss::SigningKey::<Sha256>::new(material::rsa_private(key)?);
            let sig = sk.try_sign_with_rng(rng, data).map_err(backend)?;
            Ok(sig.to_vec())
        }
        CoseAlgorithm::PS384 => {
            let sk = pss::SigningKey::<Sha384>::new(material::rsa_private(key)?);
            let sig = sk.try_sign_with_rng(rng, data).map_err(backend)?;
            Ok(sig.to_vec())
        }
        CoseAlgorithm::PS512 => {
            let sk = pss::SigningKey::<Sha512>::new(material::rsa_private(key)?);
            let sig = sk.try_sign_with_rng(rng, data).map_err(backend)?;
            Ok(sig.to_vec())
        }
        CoseAlgorithm::RS1 => {
            let sk = pkcs1v15::SigningKey::<sha1::Sha1>::new(material::rsa_private(key)?);
            let sig = sk.try_sign(data).map_err(backend)?;
            Ok(sig.to_vec())
        }
        CoseAlgorithm::RS256 => {
            let sk = pkcs1v15::SigningKey::<Sha256>::new(material::rsa_private(key)?);
            let sig = sk.try_sign(data).map_err(backend)?;
            Ok(sig.to_vec())
        }
        CoseAlgorithm::RS384 => {
            let sk = pkcs1v15::SigningKey::<Sha384>::new(material::rsa_private(key)?);
            let sig = sk.try_sign(data).map_err(backend)?;
            Ok(sig.to_vec())
        }
        CoseAlgorithm::RS512 => {
            let sk = pkcs1v15::SigningKey::<Sha512>::new(material::rsa_private(key)?);
            let sig = sk.try_sign(data).map_err(backend)?;
            Ok(sig.to_vec())
        }
        other => Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a signature algorithm",
            other.name()
        ))),
    }
}

/// Verify a signature over `data` with `key` under `alg`.
///
/// Returns `VerificationFailure` for any signature that does not verify,
/// including structurally invalid signature bytes.
pub fn verify(
    alg: CoseAlgorithm,
    key: &CoseKey,
    data: &[u8],
    signature: &[u8],
) -> Result<(), CoseError> {
    match alg {
        CoseAlgorithm::ES256 => verify_ecdsa_p256(key, data, signature),
        CoseAlgorithm::ES384 => verify_ecdsa_p384(key, data, signature),
        CoseAlgorithm::ES512 => verify_ecdsa_p521(key, data, signature),
        CoseAlgorithm::ES256K => verify_ecdsa_k256(key, data, signature),
        CoseAlgorithm::EdDSA => verify_eddsa(key, data, signature),
        CoseAlgorithm::PS256 => {
            let vk = pss::VerifyingKey::<Sha256>::new(material::rsa_public(key)?);
            let sig = pss::Signature::try_from(signature)
                .map_err(|_| CoseError::VerificationFailure)?;
            vk.verify(data, &sig)
                .map_err(|_| CoseError::VerificationFailure)
        }
        CoseAlgorithm::PS384 => {
            let vk = pss::VerifyingKey::<Sha384>::new(material::rsa_public(key)?);
            let sig = pss::Signature::try_from(signature)
                .map_err(|_| CoseError::VerificationFailure)?;
            vk.verify(data, &sig)
                .map_err(|_| CoseError::VerificationFailure)
        }
        CoseAlgorithm::PS512 => {
            let vk = pss::VerifyingKey::<Sha512>::new(material::rsa_public(key)?);
            let sig = pss::Signature::try_from(signature)
                .map_err(|_| CoseError::VerificationFailure)?;
            vk.verify(data, &sig)
                .map_err(|_| CoseError::VerificationFailure)
        }
        CoseAlgorithm::RS1 => {
            let vk = pkcs1v15::VerifyingKey::<sha1::Sha1>::new(material::rsa_public(key)?);
            let sig = pkcs1v15::Signature::try_from(signature)
                .map_err(|_| CoseError::VerificationFailure)?;
            vk.verify(data, &sig)
                .map_err(|_| CoseError::VerificationFailure)
        }
        CoseAlgorithm::RS256 => {
            let vk = pkcs1v15::VerifyingKey::<Sha256>::new(material::rsa_public(key)?);
            let sig = pkcs1v15::Signature::try_from(signature)
                .map_err(|_| CoseError::VerificationFailure)?;
            vk.verify(data, &sig)
                .map_err(|_| CoseError::VerificationFailure)
        }
        CoseAlgorithm::RS384 => {
            let vk = pkcs1v15::VerifyingKey::<Sha384>::new(material::rsa_public(key)?);
            let sig = pkcs1v15::Signature::try_from(signature)
                .map_err(|_| CoseError::VerificationFailure)?;
            vk.verify(data, &sig)
                .map_err(|_| CoseError::VerificationFailure)
        }
        CoseAlgorithm::RS512 => {
            let vk = pkcs1v15::VerifyingKey::<Sha512>::new(material::rsa_public(key)?);
            let sig = pkcs1v15::Signature::try_from(signature)
                .map_err(|_| CoseError::VerificationFailure)?;
            vk.verify(data, &sig)
                .map_err(|_| CoseError::VerificationFailure)
        }
        other => Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a signature algorithm",
            other.name()
        ))),
    }
}

fn backend<E: std::fmt::Display>(e: E) -> CoseError {
    CoseError::CryptoBackend(e.to_string())
}

/// Sign with ES256 (P-256 ECDSA, deterministic per RFC 6979).
fn sign_ecdsa_p256(key: &CoseKey, msg: &[u8]) -> Result<Vec<u8>, CoseError> {
    let (_, d) = material::ec2_private(key)?;
    let sk = p256::ecdsa::SigningKey::from_slice(d)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-256 private key: {e}")))?;
    let sig: p256::ecdsa::Signature = sk.sign(msg);
    Ok(sig.to_bytes().to_vec())
}

/// Verify ES256 (P-256 ECDSA).
fn verify_ecdsa_p256(key: &CoseKey, msg: &[u8], sig: &[u8]) -> Result<(), CoseError> {
    let (_, x, y) = material::ec2_public(key)?;
    let point = p256::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let vk = p256::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-256 public key: {e}")))?;
    let signature =
        p256::ecdsa::Signature::from_slice(sig).map_err(|_| CoseError::VerificationFailure)?;
    vk.verify(msg, &signature)
        .map_err(|_| CoseError::VerificationFailure)
}

/// Sign with ES384 (P-384 ECDSA).
fn sign_ecdsa_p384(key: &CoseKey, msg: &[u8]) -> Result<Vec<u8>, CoseError> {
    let (_, d) = material::ec2_private(key)?;
    let sk = p384::ecdsa::SigningKey::from_slice(d)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-384 private key: {e}")))?;
    let sig: p384::ecdsa::Signature = sk.sign(msg);
    Ok(sig.to_bytes().to_vec())
}

/// Verify ES384 (P-384 ECDSA).
fn verify_ecdsa_p384(key: &CoseKey, msg: &[u8], sig: &[u8]) -> Result<(), CoseError> {
    let (_, x, y) = material::ec2_public(key)?;
    let point = p384::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let vk = p384::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-384 public key: {e}")))?;
    let signature =
        p384::ecdsa::Signature::from_slice(sig).map_err(|_| CoseError::VerificationFailure)?;
    vk.verify(msg, &signature)
        .map_err(|_| CoseError::VerificationFailure)
}

/// Sign with ES512 (P-521 ECDSA).
fn sign_ecdsa_p521(key: &CoseKey, msg: &[u8]) -> Result<Vec<u8>, CoseError> {
    let (_, d) = material::ec2_private(key)?;
    let sk = p521::ecdsa::SigningKey::from_slice(d)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-521 private key: {e}")))?;
    let sig: p521::ecdsa::Signature = sk.sign(msg);
    Ok(sig.to_bytes().to_vec())
}

/// Verify ES512 (P-521 ECDSA).
fn verify_ecdsa_p521(key: &CoseKey, msg: &[u8], sig: &[u8]) -> Result<(), CoseError> {
    let (_, x, y) = material::ec2_public(key)?;
    let point = p521::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let vk = p521::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-521 public key: {e}")))?;
    let signature =
        p521::ecdsa::Signature::from_slice(sig).map_err(|_| CoseError::VerificationFailure)?;
    vk.verify(msg, &signature)
        .map_err(|_| CoseError::VerificationFailure)
}

/// Sign with ES256K (secp256k1 ECDSA).
fn sign_ecdsa_k256(key: &CoseKey, msg: &[u8]) -> Result<Vec<u8>, CoseError> {
    let (_, d) = material::ec2_private(key)?;
    let sk = k256::ecdsa::SigningKey::from_slice(d)
        .map_err(|e| CoseError::InvalidKey(format!("bad secp256k1 private key: {e}")))?;
    let sig: k256::ecdsa::Signature = sk.sign(msg);
    Ok(sig.to_bytes().to_vec())
}

/// Verify ES256K (secp256k1 ECDSA).
fn verify_ecdsa_k256(key: &CoseKey, msg: &[u8], sig: &[u8]) -> Result<(), CoseError> {
    let (_, x, y) = material::ec2_public(key)?;
    let point = k256::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let vk = k256::ecdsa::VerifyingKey::from_encoded_point(&point)
        .map_err(|e| CoseError::InvalidKey(format!("bad secp256k1 public key: {e}")))?;
    let signature =
        k256::ecdsa::Signature::from_slice(sig).map_err(|_| CoseError::VerificationFailure)?;
    vk.verify(msg, &signature)
        .map_err(|_| CoseError::VerificationFailure)
}

/// Sign with EdDSA (Ed25519).
fn sign_eddsa(key: &CoseKey, msg: &[u8]) -> Result<Vec<u8>, CoseError> {
    let (crv, d) = material::okp_private(key)?;
    if crv != Curve::Ed25519 {
        return Err(CoseError::InvalidKey(format!(
            "EdDSA over {crv:?} is not supported by this backend"
        )));
    }
    let bytes: [u8; 32] = d
        .try_into()
        .map_err(|_| CoseError::InvalidKey("bad Ed25519 private key length".to_string()))?;
    let sk = ed25519_dalek::SigningKey::from_bytes(&bytes);
    let sig: ed25519_dalek::Signature = sk.sign(msg);
    Ok(sig.to_bytes().to_vec())
}

/// Verify EdDSA (Ed25519).
fn verify_eddsa(key: &CoseKey, msg: &[u8], sig: &[u8]) -> Result<(), CoseError> {
    let (crv, x) = material::okp_public(key)?;
    if crv != Curve::Ed25519 {
        return Err(CoseError::InvalidKey(format!(
            "EdDSA over {crv:?} is not supported by this backend"
        )));
    }
    let bytes: [u8; 32] = x
        .try_into()
        .map_err(|_| CoseError::InvalidKey("bad Ed25519 public key length".to_string()))?;
    let vk = ed25519_dalek::VerifyingKey::from_bytes(&bytes)
        .map_err(|e| CoseError::InvalidKey(format!("bad Ed25519 public key: {e}")))?;
    let signature =
        ed25519_dalek::Signature::from_slice(sig).map_err(|_| CoseError::VerificationFailure)?;
    vk.verify(msg, &signature)
        .map_err(|_| CoseError::VerificationFailure)
}
