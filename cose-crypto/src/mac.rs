// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! MAC primitives.
//!
//! HMAC-SHA-2 and AES-CBC-MAC over the MAC_structure bytes, with the COSE
//! tag truncations applied. Verification recomputes the tag and compares in
//! constant time.

use cbc_mac::CbcMac;
use cose_abstractions::{CoseAlgorithm, CoseError, CoseKey};
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

use crate::material;

type HmacSha256 = Hmac<Sha256>;
type HmacSha384 = Hmac<Sha384>;
type HmacSha512 = Hmac<Sha512>;

type Aes128CbcMac = CbcMac<aes::Aes128>;
type Aes256CbcMac = CbcMac<aes::Aes256>;

/// Compute the authentication tag over `data` (a MAC_structure).
///
/// The returned tag is truncated to the algorithm's tag length.
pub fn tag(alg: CoseAlgorithm, key: &CoseKey, data: &[u8]) -> Result<Vec<u8>, CoseError> {
    let k = material::symmetric_bytes(key)?;
    let mut full = match alg {
        CoseAlgorithm::HMAC_256_64 | CoseAlgorithm::HMAC_256_256 => {
            compute::<HmacSha256>(k, data)?
        }
        CoseAlgorithm::HMAC_384_384 => compute::<HmacSha384>(k, data)?,
        CoseAlgorithm::HMAC_512_512 => compute::<HmacSha512>(k, data)?,
        CoseAlgorithm::AES_MAC_128_64 | CoseAlgorithm::AES_MAC_128_128 => {
            compute::<Aes128CbcMac>(k, data)?
        }
        CoseAlgorithm::AES_MAC_256_64 | CoseAlgorithm::AES_MAC_256_128 => {
            compute::<Aes256CbcMac>(k, data)?
        }
        other => {
            return Err(CoseError::InvalidAlgorithm(format!(
                "{} is not a MAC algorithm",
                other.name()
            )));
        }
    };

    // Registered MAC algorithms always carry a tag length.
    let len = alg
        .tag_length()
        .ok_or_else(|| CoseError::InvalidAlgorithm("missing tag length".to_string()))?;
    full.truncate(len);
    Ok(full)
}

/// Verify an authentication tag in constant time.
pub fn verify(
    alg: CoseAlgorithm,
    key: &CoseKey,
    data: &[u8],
    expected: &[u8],
) -> Result<(), CoseError> {
    let computed = tag(alg, key, data)?;
    if computed.len() != expected.len() {
        return Err(CoseError::VerificationFailure);
    }
    if bool::from(computed.as_slice().ct_eq(expected)) {
        Ok(())
    } else {
        Err(CoseError::VerificationFailure)
    }
}

fn compute<M: Mac + KeyInit>(key: &[u8], data: &[u8]) -> Result<Vec<u8>, CoseError> {
    let mut mac = <M as Mac>::new_from_slice(key)
        .map_err(|e| CoseError::InvalidKey(format!("bad MAC key length: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
