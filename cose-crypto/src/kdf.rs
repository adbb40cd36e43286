// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! HKDF key derivation (RFC 5869).
//!
//! Used by the direct-with-KDF and ECDH content key distribution methods.
//! The hash function follows the algorithm registration: the `*-512`
//! variants use HKDF-SHA-512, everything else HKDF-SHA-256.

use cose_abstractions::{AlgorithmKind, CoseAlgorithm, CoseError};
use hkdf::Hkdf;
use sha2::{Sha256, Sha512};
use zeroize::Zeroizing;

/// Derive `length` bytes of key material for the given distribution
/// algorithm.
///
/// `info` is the serialized COSE_KDF_Context; an empty `salt` means no salt.
pub fn derive(
    alg: CoseAlgorithm,
    ikm: &[u8],
    salt: &[u8],
    info: &[u8],
    length: usize,
) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    if !matches!(
        alg.kind(),
        AlgorithmKind::DirectKdf
            | AlgorithmKind::DirectKeyAgreement
            | AlgorithmKind::KeyAgreementWithKeyWrap
    ) {
        return Err(CoseError::InvalidAlgorithm(format!(
            "{} does not use a KDF",
            alg.name()
        )));
    }

    let salt = if salt.is_empty() { None } else { Some(salt) };
    let mut okm = Zeroizing::new(vec![0u8; length]);

    let wide = matches!(
        alg,
        CoseAlgorithm::Direct_HKDF_SHA_512
            | CoseAlgorithm::ECDH_ES_HKDF_512
            | CoseAlgorithm::ECDH_SS_HKDF_512
    );
    if wide {
        Hkdf::<Sha512>::new(salt, ikm)
            .expand(info, &mut okm)
            .map_err(|_| CoseError::CryptoBackend("HKDF output length invalid".to_string()))?;
    } else {
        Hkdf::<Sha256>::new(salt, ikm)
            .expand(info, &mut okm)
            .map_err(|_| CoseError::CryptoBackend("HKDF output length invalid".to_string()))?;
    }

    Ok(okm)
}
