// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key encryption primitives for recipients.
//!
//! AES key wrap (RFC 3394) for the A*KW algorithms, and RSAES-OAEP key
//! transport. Both take the CEK as plain bytes and produce the recipient
//! ciphertext.

use aes_kw::{KekAes128, KekAes192, KekAes256};
use cose_abstractions::{CoseAlgorithm, CoseError, CoseKey};
use rand_core::CryptoRngCore;
use rsa::sha2::{Sha256, Sha512};
use rsa::Oaep;
use zeroize::Zeroizing;

use crate::material;

/// Wrap a CEK for a recipient.
///
/// For the AES variants, `kek` is the raw key-encryption key bytes. The RNG
/// is consumed by RSAES-OAEP only.
pub fn wrap<R: CryptoRngCore>(
    alg: CoseAlgorithm,
    key: Option<&CoseKey>,
    kek: Option<&[u8]>,
    cek: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, CoseError> {
    match alg {
        CoseAlgorithm::A128KW | CoseAlgorithm::A192KW | CoseAlgorithm::A256KW => {
            let kek = match kek {
                Some(kek) => kek,
                None => material::symmetric_bytes(require_key(key)?)?,
            };
            aes_wrap(alg, kek, cek)
        }
        CoseAlgorithm::RSAES_OAEP_SHA_1 => {
            let pk = material::rsa_public(require_key(key)?)?;
            pk.encrypt(rng, Oaep::new::<sha1::Sha1>(), cek)
                .map_err(|e| CoseError::CryptoBackend(format!("RSA-OAEP wrap failed: {e}")))
        }
        CoseAlgorithm::RSAES_OAEP_SHA_256 => {
            let pk = material::rsa_public(require_key(key)?)?;
            pk.encrypt(rng, Oaep::new::<Sha256>(), cek)
                .map_err(|e| CoseError::CryptoBackend(format!("RSA-OAEP wrap failed: {e}")))
        }
        CoseAlgorithm::RSAES_OAEP_SHA_512 => {
            let pk = material::rsa_public(require_key(key)?)?;
            pk.encrypt(rng, Oaep::new::<Sha512>(), cek)
                .map_err(|e| CoseError::CryptoBackend(format!("RSA-OAEP wrap failed: {e}")))
        }
        other => Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a key wrap algorithm",
            other.name()
        ))),
    }
}

/// Unwrap a recipient ciphertext back into the CEK.
pub fn unwrap(
    alg: CoseAlgorithm,
    key: Option<&CoseKey>,
    kek: Option<&[u8]>,
    wrapped: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    match alg {
        CoseAlgorithm::A128KW | CoseAlgorithm::A192KW | CoseAlgorithm::A256KW => {
            let kek = match kek {
                Some(kek) => kek,
                None => material::symmetric_bytes(require_key(key)?)?,
            };
            aes_unwrap(alg, kek, wrapped)
        }
        CoseAlgorithm::RSAES_OAEP_SHA_1 => {
            let sk = material::rsa_private(require_key(key)?)?;
            sk.decrypt(Oaep::new::<sha1::Sha1>(), wrapped)
                .map(Zeroizing::new)
                .map_err(|_| CoseError::DecryptionFailure)
        }
        CoseAlgorithm::RSAES_OAEP_SHA_256 => {
            let sk = material::rsa_private(require_key(key)?)?;
            sk.decrypt(Oaep::new::<Sha256>(), wrapped)
                .map(Zeroizing::new)
                .map_err(|_| CoseError::DecryptionFailure)
        }
        CoseAlgorithm::RSAES_OAEP_SHA_512 => {
            let sk = material::rsa_private(require_key(key)?)?;
            sk.decrypt(Oaep::new::<Sha512>(), wrapped)
                .map(Zeroizing::new)
                .map_err(|_| CoseError::DecryptionFailure)
        }
        other => Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a key wrap algorithm",
            other.name()
        ))),
    }
}

fn aes_wrap(alg: CoseAlgorithm, kek: &[u8], cek: &[u8]) -> Result<Vec<u8>, CoseError> {
    check_kek_len(alg, kek)?;
    let wrapped = match alg {
        CoseAlgorithm::A128KW => KekAes128::try_from(kek)
            .map_err(kw_key_err)?
            .wrap_vec(cek),
        CoseAlgorithm::A192KW => KekAes192::try_from(kek)
            .map_err(kw_key_err)?
            .wrap_vec(cek),
        _ => KekAes256::try_from(kek).map_err(kw_key_err)?.wrap_vec(cek),
    };
    wrapped.map_err(|e| CoseError::CryptoBackend(format!("AES key wrap failed: {e}")))
}

fn aes_unwrap(
    alg: CoseAlgorithm,
    kek: &[u8],
    wrapped: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    check_kek_len(alg, kek)?;
    let cek = match alg {
        CoseAlgorithm::A128KW => KekAes128::try_from(kek)
            .map_err(kw_key_err)?
            .unwrap_vec(wrapped),
        CoseAlgorithm::A192KW => KekAes192::try_from(kek)
            .map_err(kw_key_err)?
            .unwrap_vec(wrapped),
        _ => KekAes256::try_from(kek)
            .map_err(kw_key_err)?
            .unwrap_vec(wrapped),
    };
    // An integrity check failure on unwrap means the wrong KEK or a
    // tampered ciphertext.
    cek.map(Zeroizing::new)
        .map_err(|_| CoseError::DecryptionFailure)
}

fn check_kek_len(alg: CoseAlgorithm, kek: &[u8]) -> Result<(), CoseError> {
    // Registered key wrap algorithms always carry a key length.
    let expected = alg
        .key_length()
        .ok_or_else(|| CoseError::InvalidAlgorithm("missing key length".to_string()))?;
    if kek.len() != expected {
        return Err(CoseError::InvalidKey(format!(
            "{} requires a {expected}-byte KEK, got {}",
            alg.name(),
            kek.len()
        )));
    }
    Ok(())
}

fn kw_key_err(e: aes_kw::Error) -> CoseError {
    CoseError::InvalidKey(format!("bad KEK: {e}"))
}

fn require_key(key: Option<&CoseKey>) -> Result<&CoseKey, CoseError> {
    key.ok_or_else(|| CoseError::InvalidKey("recipient key material is required".to_string()))
}
