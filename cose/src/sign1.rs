// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Sign1 operations.

use cose_abstractions::{
    AlgorithmKind, CoseError, CoseKey, CoseSign1, KeyOperation, SIG_CONTEXT_SIGNATURE1,
};
use rand_core::CryptoRngCore;

/// Signing and verification for single-signer messages.
pub trait CoseSign1Ext {
    /// Sign the payload, freezing the protected bucket.
    ///
    /// The `alg` header must name a signature algorithm. The RNG feeds the
    /// randomized RSA-PSS salt; other algorithms ignore it.
    fn sign<R: CryptoRngCore>(&mut self, key: &CoseKey, rng: &mut R) -> Result<(), CoseError>;

    /// Verify the signature over the embedded payload.
    fn verify(&self, key: &CoseKey) -> Result<(), CoseError>;

    /// Verify the signature of a detached-payload message.
    fn verify_detached(&self, key: &CoseKey, payload: &[u8]) -> Result<(), CoseError>;
}

impl CoseSign1Ext for CoseSign1 {
    fn sign<R: CryptoRngCore>(&mut self, key: &CoseKey, rng: &mut R) -> Result<(), CoseError> {
        let alg = crate::headers::alg_of(&self.protected, &self.unprotected)?;
        if alg.kind() != AlgorithmKind::Signature {
            return Err(CoseError::InvalidAlgorithm(format!(
                "{} is not a signature algorithm",
                alg.name()
            )));
        }
        key.check(KeyOperation::Sign, alg)?;
        cose_common::validate_buckets(&self.protected, &self.unprotected)?;

        let payload = self.payload.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage("payload is required for signing".to_string())
        })?;

        let body_protected = cose_common::freeze_protected(&mut self.protected);
        let to_be_signed = cose_common::encode_sig_structure(
            SIG_CONTEXT_SIGNATURE1,
            &body_protected,
            None,
            &self.external_aad,
            payload,
        );

        self.signature = cose_crypto::sig::sign(alg, key, &to_be_signed, rng)?;
        Ok(())
    }

    fn verify(&self, key: &CoseKey) -> Result<(), CoseError> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage(
                "detached payload requires external payload bytes".to_string(),
            )
        })?;
        verify_impl(self, key, payload)
    }

    fn verify_detached(&self, key: &CoseKey, payload: &[u8]) -> Result<(), CoseError> {
        if self.payload.is_some() {
            return Err(CoseError::MalformedMessage(
                "message carries an embedded payload".to_string(),
            ));
        }
        verify_impl(self, key, payload)
    }
}

fn verify_impl(msg: &CoseSign1, key: &CoseKey, payload: &[u8]) -> Result<(), CoseError> {
    let alg = crate::headers::alg_of(&msg.protected, &msg.unprotected)?;
    if alg.kind() != AlgorithmKind::Signature {
        return Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a signature algorithm",
            alg.name()
        )));
    }
    key.check(KeyOperation::Verify, alg)?;

    let body_protected = cose_common::protected_bytes(&msg.protected);
    let to_be_signed = cose_common::encode_sig_structure(
        SIG_CONTEXT_SIGNATURE1,
        &body_protected,
        None,
        &msg.external_aad,
        payload,
    );

    cose_crypto::sig::verify(alg, key, &to_be_signed, &msg.signature)
}
