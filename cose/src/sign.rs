// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign operations.
//!
//! Each signer entry carries its own bucket pair; the Sig_structure binds
//! the body protected bucket and the signer's protected bucket together
//! under the `"Signature"` context.

use cose_abstractions::{
    AlgorithmKind, CoseError, CoseKey, CoseSign, KeyOperation, SIG_CONTEXT_SIGNATURE,
};
use rand_core::CryptoRngCore;

/// Signing and verification for multi-signer messages.
pub trait CoseSignExt {
    /// Sign the entry at `index` with `key`.
    fn sign_signature<R: CryptoRngCore>(
        &mut self,
        index: usize,
        key: &CoseKey,
        rng: &mut R,
    ) -> Result<(), CoseError>;

    /// Verify the signature of the entry at `index`.
    fn verify_signature(&self, index: usize, key: &CoseKey) -> Result<(), CoseError>;

    /// Verify the entry at `index` of a detached-payload message.
    fn verify_signature_detached(
        &self,
        index: usize,
        key: &CoseKey,
        payload: &[u8],
    ) -> Result<(), CoseError>;
}

impl CoseSignExt for CoseSign {
    fn sign_signature<R: CryptoRngCore>(
        &mut self,
        index: usize,
        key: &CoseKey,
        rng: &mut R,
    ) -> Result<(), CoseError> {
        cose_common::validate_buckets(&self.protected, &self.unprotected)?;
        let body_protected = cose_common::freeze_protected(&mut self.protected);

        let payload = self.payload.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage("payload is required for signing".to_string())
        })?;
        let payload = payload.to_vec();

        let entry = self.signatures.get_mut(index).ok_or_else(|| {
            CoseError::MalformedMessage(format!("no signer at index {index}"))
        })?;

        let alg = crate::headers::alg_of(&entry.protected, &entry.unprotected)?;
        if alg.kind() != AlgorithmKind::Signature {
            return Err(CoseError::InvalidAlgorithm(format!(
                "{} is not a signature algorithm",
                alg.name()
            )));
        }
        key.check(KeyOperation::Sign, alg)?;
        cose_common::validate_buckets(&entry.protected, &entry.unprotected)?;
        let sign_protected = cose_common::freeze_protected(&mut entry.protected);

        let to_be_signed = cose_common::encode_sig_structure(
            SIG_CONTEXT_SIGNATURE,
            &body_protected,
            Some(&sign_protected),
            &self.external_aad,
            &payload,
        );

        entry.signature = cose_crypto::sig::sign(alg, key, &to_be_signed, rng)?;
        Ok(())
    }

    fn verify_signature(&self, index: usize, key: &CoseKey) -> Result<(), CoseError> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage(
                "detached payload requires external payload bytes".to_string(),
            )
        })?;
        verify_impl(self, index, key, payload)
    }

    fn verify_signature_detached(
        &self,
        index: usize,
        key: &CoseKey,
        payload: &[u8],
    ) -> Result<(), CoseError> {
        if self.payload.is_some() {
            return Err(CoseError::MalformedMessage(
                "message carries an embedded payload".to_string(),
            ));
        }
        verify_impl(self, index, key, payload)
    }
}

fn verify_impl(
    msg: &CoseSign,
    index: usize,
    key: &CoseKey,
    payload: &[u8],
) -> Result<(), CoseError> {
    let entry = msg
        .signatures
        .get(index)
        .ok_or_else(|| CoseError::MalformedMessage(format!("no signer at index {index}")))?;

    let alg = crate::headers::alg_of(&entry.protected, &entry.unprotected)?;
    if alg.kind() != AlgorithmKind::Signature {
        return Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a signature algorithm",
            alg.name()
        )));
    }
    key.check(KeyOperation::Verify, alg)?;

    let body_protected = cose_common::protected_bytes(&msg.protected);
    let sign_protected = cose_common::protected_bytes(&entry.protected);
    let to_be_signed = cose_common::encode_sig_structure(
        SIG_CONTEXT_SIGNATURE,
        &body_protected,
        Some(&sign_protected),
        &msg.external_aad,
        payload,
    );

    cose_crypto::sig::verify(alg, key, &to_be_signed, &entry.signature)
}
