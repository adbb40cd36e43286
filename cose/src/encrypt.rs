// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Encrypt operations.
//!
//! The CEK is established through the recipient tree; the content layer is
//! a plain AEAD over the `"Encrypt"` context structure.

use cose_abstractions::{
    AlgorithmKind, CoseError, CoseEncrypt, KeyOperation, ENC_CONTEXT_ENCRYPT,
};
use rand_core::CryptoRngCore;

use crate::recipient;

/// Encryption and decryption for messages with recipients.
pub trait CoseEncryptExt {
    /// Establish the CEK via the recipients, then encrypt the staged
    /// plaintext.
    fn encrypt<R: CryptoRngCore>(&mut self, rng: &mut R) -> Result<(), CoseError>;

    /// Recover the CEK via the recipients, then decrypt the embedded
    /// ciphertext.
    fn decrypt(&self) -> Result<Vec<u8>, CoseError>;

    /// Decrypt a detached ciphertext.
    fn decrypt_detached(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CoseError>;
}

impl CoseEncryptExt for CoseEncrypt {
    fn encrypt<R: CryptoRngCore>(&mut self, rng: &mut R) -> Result<(), CoseError> {
        let alg = crate::headers::alg_of(&self.protected, &self.unprotected)?;
        if alg.kind() != AlgorithmKind::Aead {
            return Err(CoseError::InvalidAlgorithm(format!(
                "{} is not a content encryption algorithm",
                alg.name()
            )));
        }
        cose_common::validate_buckets(&self.protected, &self.unprotected)?;

        let plaintext = self.plaintext.clone().ok_or_else(|| {
            CoseError::MalformedMessage("no plaintext staged for encryption".to_string())
        })?;

        let cek = recipient::establish_cek(
            alg,
            KeyOperation::Encrypt,
            &mut self.recipients,
            rng,
        )?;

        let base_iv = recipient::base_iv_of(&self.recipients);
        let nonce = match crate::headers::nonce_from_headers(
            &self.protected,
            &self.unprotected,
            alg,
            base_iv.as_deref(),
        )? {
            Some(nonce) => nonce,
            None => crate::headers::generate_nonce(&mut self.unprotected, alg, rng)?,
        };

        let body_protected = cose_common::freeze_protected(&mut self.protected);
        let aad = cose_common::encode_enc_structure(
            ENC_CONTEXT_ENCRYPT,
            &body_protected,
            &self.external_aad,
        );

        self.ciphertext = Some(cose_crypto::aead::encrypt(
            alg, &cek, &nonce, &aad, &plaintext,
        )?);
        Ok(())
    }

    fn decrypt(&self) -> Result<Vec<u8>, CoseError> {
        let ciphertext = self.ciphertext.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage(
                "detached ciphertext requires external ciphertext bytes".to_string(),
            )
        })?;
        decrypt_impl(self, ciphertext)
    }

    fn decrypt_detached(&self, ciphertext: &[u8]) -> Result<Vec<u8>, CoseError> {
        if self.ciphertext.is_some() {
            return Err(CoseError::MalformedMessage(
                "message carries an embedded ciphertext".to_string(),
            ));
        }
        decrypt_impl(self, ciphertext)
    }
}

fn decrypt_impl(msg: &CoseEncrypt, ciphertext: &[u8]) -> Result<Vec<u8>, CoseError> {
    let alg = crate::headers::alg_of(&msg.protected, &msg.unprotected)?;
    if alg.kind() != AlgorithmKind::Aead {
        return Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a content encryption algorithm",
            alg.name()
        )));
    }

    let cek = recipient::recover_cek(alg, KeyOperation::Decrypt, &msg.recipients)?;

    let base_iv = recipient::base_iv_of(&msg.recipients);
    let nonce = crate::headers::nonce_from_headers(
        &msg.protected,
        &msg.unprotected,
        alg,
        base_iv.as_deref(),
    )?
    .ok_or_else(|| CoseError::InvalidHeader("missing IV".to_string()))?;

    let body_protected = cose_common::protected_bytes(&msg.protected);
    let aad = cose_common::encode_enc_structure(
        ENC_CONTEXT_ENCRYPT,
        &body_protected,
        &msg.external_aad,
    );

    cose_crypto::aead::decrypt(alg, &cek, &nonce, &aad, ciphertext)
}
