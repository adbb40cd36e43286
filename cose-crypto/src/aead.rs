// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! AEAD primitives.
//!
//! AES-GCM, AES-CCM (the eight COSE parameter sets), and ChaCha20-Poly1305
//! over the Enc_structure AAD. Ciphertexts carry the authentication tag
//! appended, as COSE messages transport them.

use aes::{Aes128, Aes192, Aes256};
use aes_gcm::aead::generic_array::typenum::Unsigned;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes128Gcm, Aes256Gcm};
use ccm::consts::{U12, U13, U16, U7, U8};
use ccm::Ccm;
use cose_abstractions::{CoseAlgorithm, CoseError};

type Aes192Gcm = aes_gcm::AesGcm<Aes192, U12>;

// Aliases follow the COSE registry naming (nonce class, tag bits, key bits).
#[allow(non_camel_case_types)]
type Ccm16_64_128 = Ccm<Aes128, U8, U13>;
#[allow(non_camel_case_types)]
type Ccm16_64_256 = Ccm<Aes256, U8, U13>;
#[allow(non_camel_case_types)]
type Ccm64_64_128 = Ccm<Aes128, U8, U7>;
#[allow(non_camel_case_types)]
type Ccm64_64_256 = Ccm<Aes256, U8, U7>;
#[allow(non_camel_case_types)]
type Ccm16_128_128 = Ccm<Aes128, U16, U13>;
#[allow(non_camel_case_types)]
type Ccm16_128_256 = Ccm<Aes256, U16, U13>;
#[allow(non_camel_case_types)]
type Ccm64_128_128 = Ccm<Aes128, U16, U7>;
#[allow(non_camel_case_types)]
type Ccm64_128_256 = Ccm<Aes256, U16, U7>;

/// Encrypt `plaintext` with `aad` as additional authenticated data.
///
/// Returns the ciphertext with the tag appended.
pub fn encrypt(
    alg: CoseAlgorithm,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CoseError> {
    use CoseAlgorithm::*;
    match alg {
        A128GCM => seal::<Aes128Gcm>(key, nonce, aad, plaintext),
        A192GCM => seal::<Aes192Gcm>(key, nonce, aad, plaintext),
        A256GCM => seal::<Aes256Gcm>(key, nonce, aad, plaintext),
        ChaCha20Poly1305 => seal::<chacha20poly1305::ChaCha20Poly1305>(key, nonce, aad, plaintext),
        AES_CCM_16_64_128 => seal::<Ccm16_64_128>(key, nonce, aad, plaintext),
        AES_CCM_16_64_256 => seal::<Ccm16_64_256>(key, nonce, aad, plaintext),
        AES_CCM_64_64_128 => seal::<Ccm64_64_128>(key, nonce, aad, plaintext),
        AES_CCM_64_64_256 => seal::<Ccm64_64_256>(key, nonce, aad, plaintext),
        AES_CCM_16_128_128 => seal::<Ccm16_128_128>(key, nonce, aad, plaintext),
        AES_CCM_16_128_256 => seal::<Ccm16_128_256>(key, nonce, aad, plaintext),
        AES_CCM_64_128_128 => seal::<Ccm64_128_128>(key, nonce, aad, plaintext),
        AES_CCM_64_128_256 => seal::<Ccm64_128_256>(key, nonce, aad, plaintext),
        other => Err(CoseError::InvalidAlgorithm(format!(
            "{} is not an AEAD algorithm",
            other.name()
        ))),
    }
}

/// Decrypt a ciphertext (with appended tag), authenticating `aad`.
pub fn decrypt(
    alg: CoseAlgorithm,
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CoseError> {
    use CoseAlgorithm::*;
    match alg {
        A128GCM => open::<Aes128Gcm>(key, nonce, aad, ciphertext),
        A192GCM => open::<Aes192Gcm>(key, nonce, aad, ciphertext),
        A256GCM => open::<Aes256Gcm>(key, nonce, aad, ciphertext),
        ChaCha20Poly1305 => open::<chacha20poly1305::ChaCha20Poly1305>(key, nonce, aad, ciphertext),
        AES_CCM_16_64_128 => open::<Ccm16_64_128>(key, nonce, aad, ciphertext),
        AES_CCM_16_64_256 => open::<Ccm16_64_256>(key, nonce, aad, ciphertext),
        AES_CCM_64_64_128 => open::<Ccm64_64_128>(key, nonce, aad, ciphertext),
        AES_CCM_64_64_256 => open::<Ccm64_64_256>(key, nonce, aad, ciphertext),
        AES_CCM_16_128_128 => open::<Ccm16_128_128>(key, nonce, aad, ciphertext),
        AES_CCM_16_128_256 => open::<Ccm16_128_256>(key, nonce, aad, ciphertext),
        AES_CCM_64_128_128 => open::<Ccm64_128_128>(key, nonce, aad, ciphertext),
        AES_CCM_64_128_256 => open::<Ccm64_128_256>(key, nonce, aad, ciphertext),
        other => Err(CoseError::InvalidAlgorithm(format!(
            "{} is not an AEAD algorithm",
            other.name()
        ))),
    }
}

fn seal<A: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<Vec<u8>, CoseError> {
    let cipher = A::new_from_slice(key)
        .map_err(|e| CoseError::InvalidKey(format!("bad AEAD key length: {e}")))?;
    if nonce.len() != A::NonceSize::USIZE {
        return Err(CoseError::InvalidHeader(format!(
            "IV has length {}, expected {}",
            nonce.len(),
            A::NonceSize::USIZE
        )));
    }
    cipher
        .encrypt(
            GenericArray::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CoseError::CryptoBackend("AEAD encryption failed".to_string()))
}

fn open<A: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CoseError> {
    let cipher = A::new_from_slice(key)
        .map_err(|e| CoseError::InvalidKey(format!("bad AEAD key length: {e}")))?;
    if nonce.len() != A::NonceSize::USIZE {
        return Err(CoseError::InvalidHeader(format!(
            "IV has length {}, expected {}",
            nonce.len(),
            A::NonceSize::USIZE
        )));
    }
    cipher
        .decrypt(
            GenericArray::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CoseError::DecryptionFailure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gcm_round_trips_and_authenticates_aad() {
        let key = [0x42u8; 16];
        let nonce = [0x24u8; 12];
        let ct = encrypt(CoseAlgorithm::A128GCM, &key, &nonce, b"aad", b"secret").unwrap();
        assert_eq!(ct.len(), b"secret".len() + 16);

        let pt = decrypt(CoseAlgorithm::A128GCM, &key, &nonce, b"aad", &ct).unwrap();
        assert_eq!(pt, b"secret");

        assert_eq!(
            decrypt(CoseAlgorithm::A128GCM, &key, &nonce, b"AAD", &ct),
            Err(CoseError::DecryptionFailure)
        );
    }

    #[test]
    fn ccm_uses_the_registered_nonce_and_tag_sizes() {
        let key = [7u8; 16];
        let nonce = [9u8; 13];
        let ct = encrypt(
            CoseAlgorithm::AES_CCM_16_64_128,
            &key,
            &nonce,
            b"",
            b"This is the content.",
        )
        .unwrap();
        assert_eq!(ct.len(), 20 + 8);

        let pt = decrypt(CoseAlgorithm::AES_CCM_16_64_128, &key, &nonce, b"", &ct).unwrap();
        assert_eq!(pt, b"This is the content.");
    }

    #[test]
    fn tampered_ciphertext_fails_to_open() {
        let key = [1u8; 32];
        let nonce = [2u8; 12];
        let mut ct =
            encrypt(CoseAlgorithm::ChaCha20Poly1305, &key, &nonce, b"", b"payload").unwrap();
        ct[0] ^= 0x80;
        assert_eq!(
            decrypt(CoseAlgorithm::ChaCha20Poly1305, &key, &nonce, b"", &ct),
            Err(CoseError::DecryptionFailure)
        );
    }

    #[test]
    fn wrong_key_or_nonce_length_is_reported() {
        assert!(matches!(
            encrypt(CoseAlgorithm::A128GCM, &[0u8; 17], &[0u8; 12], b"", b"x"),
            Err(CoseError::InvalidKey(_))
        ));
        assert!(matches!(
            encrypt(CoseAlgorithm::A128GCM, &[0u8; 16], &[0u8; 11], b"", b"x"),
            Err(CoseError::InvalidHeader(_))
        ));
    }
}
