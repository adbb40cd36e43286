// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Encrypt0 operations.

use cose_abstractions::{
    AlgorithmKind, CoseError, CoseKey, CoseEncrypt0, KeyOperation, KeyParams,
    ENC_CONTEXT_ENCRYPT0,
};
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

/// Encryption and decryption for messages without recipient structure.
pub trait CoseEncrypt0Ext {
    /// Encrypt the staged plaintext with the caller's symmetric key.
    ///
    /// The nonce comes from the `IV`/`partial_IV` headers, or is drawn from
    /// the RNG and recorded in the unprotected bucket.
    fn encrypt<R: CryptoRngCore>(&mut self, key: &CoseKey, rng: &mut R) -> Result<(), CoseError>;

    /// Decrypt the embedded ciphertext, returning the plaintext.
    fn decrypt(&self, key: &CoseKey) -> Result<Vec<u8>, CoseError>;

    /// Decrypt a detached ciphertext.
    fn decrypt_detached(&self, key: &CoseKey, ciphertext: &[u8]) -> Result<Vec<u8>, CoseError>;
}

impl CoseEncrypt0Ext for CoseEncrypt0 {
    fn encrypt<R: CryptoRngCore>(&mut self, key: &CoseKey, rng: &mut R) -> Result<(), CoseError> {
        let alg = crate::headers::alg_of(&self.protected, &self.unprotected)?;
        if alg.kind() != AlgorithmKind::Aead {
            return Err(CoseError::InvalidAlgorithm(format!(
                "{} is not a content encryption algorithm",
                alg.name()
            )));
        }
        key.check(KeyOperation::Encrypt, alg)?;
        cose_common::validate_buckets(&self.protected, &self.unprotected)?;

        let plaintext = self.plaintext.clone().ok_or_else(|| {
            CoseError::MalformedMessage("no plaintext staged for encryption".to_string())
        })?;
        let cek = Zeroizing::new(cek_bytes(key, alg)?.to_vec());

        let nonce = match crate::headers::nonce_from_headers(
            &self.protected,
            &self.unprotected,
            alg,
            key.base_iv.as_deref(),
        )? {
            Some(nonce) => nonce,
            None => crate::headers::generate_nonce(&mut self.unprotected, alg, rng)?,
        };

        let body_protected = cose_common::freeze_protected(&mut self.protected);
        let aad = cose_common::encode_enc_structure(
            ENC_CONTEXT_ENCRYPT0,
            &body_protected,
            &self.external_aad,
        );

        self.ciphertext = Some(cose_crypto::aead::encrypt(
            alg, &cek, &nonce, &aad, &plaintext,
        )?);
        Ok(())
    }

    fn decrypt(&self, key: &CoseKey) -> Result<Vec<u8>, CoseError> {
        let ciphertext = self.ciphertext.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage(
                "detached ciphertext requires external ciphertext bytes".to_string(),
            )
        })?;
        decrypt_impl(self, key, ciphertext)
    }

    fn decrypt_detached(&self, key: &CoseKey, ciphertext: &[u8]) -> Result<Vec<u8>, CoseError> {
        if self.ciphertext.is_some() {
            return Err(CoseError::MalformedMessage(
                "message carries an embedded ciphertext".to_string(),
            ));
        }
        decrypt_impl(self, key, ciphertext)
    }
}

fn decrypt_impl(
    msg: &CoseEncrypt0,
    key: &CoseKey,
    ciphertext: &[u8],
) -> Result<Vec<u8>, CoseError> {
    let alg = crate::headers::alg_of(&msg.protected, &msg.unprotected)?;
    if alg.kind() != AlgorithmKind::Aead {
        return Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a content encryption algorithm",
            alg.name()
        )));
    }
    key.check(KeyOperation::Decrypt, alg)?;

    let cek = Zeroizing::new(cek_bytes(key, alg)?.to_vec());

    // Decryption never generates a nonce.
    let nonce = crate::headers::nonce_from_headers(
        &msg.protected,
        &msg.unprotected,
        alg,
        key.base_iv.as_deref(),
    )?
    .ok_or_else(|| CoseError::InvalidHeader("missing IV".to_string()))?;

    let body_protected = cose_common::protected_bytes(&msg.protected);
    let aad = cose_common::encode_enc_structure(
        ENC_CONTEXT_ENCRYPT0,
        &body_protected,
        &msg.external_aad,
    );

    cose_crypto::aead::decrypt(alg, &cek, &nonce, &aad, ciphertext)
}

/// The symmetric key bytes, length-checked against the algorithm.
fn cek_bytes<'a>(key: &'a CoseKey, alg: cose_abstractions::CoseAlgorithm) -> Result<&'a [u8], CoseError> {
    let k = match &key.params {
        KeyParams::Symmetric { k } => k.as_slice(),
        _ => {
            return Err(CoseError::InvalidKey(
                "content encryption requires a symmetric key".to_string(),
            ));
        }
    };
    if let Some(expected) = alg.key_length() {
        if k.len() != expected {
            return Err(CoseError::InvalidKey(format!(
                "key has length {}, expected {expected}",
                k.len()
            )));
        }
    }
    Ok(k)
}
