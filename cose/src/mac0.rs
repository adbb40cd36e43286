// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Mac0 operations.

use cose_abstractions::{
    AlgorithmKind, CoseError, CoseKey, CoseMac0, KeyOperation, MAC_CONTEXT_MAC0,
};

/// Tag computation and verification for MACed messages without recipients.
pub trait CoseMac0Ext {
    /// Compute the authentication tag, freezing the protected bucket.
    fn compute_tag(&mut self, key: &CoseKey) -> Result<(), CoseError>;

    /// Verify the authentication tag over the embedded payload.
    fn verify_tag(&self, key: &CoseKey) -> Result<(), CoseError>;

    /// Verify the tag of a detached-payload message.
    fn verify_tag_detached(&self, key: &CoseKey, payload: &[u8]) -> Result<(), CoseError>;
}

impl CoseMac0Ext for CoseMac0 {
    fn compute_tag(&mut self, key: &CoseKey) -> Result<(), CoseError> {
        let alg = crate::headers::alg_of(&self.protected, &self.unprotected)?;
        if alg.kind() != AlgorithmKind::Mac {
            return Err(CoseError::InvalidAlgorithm(format!(
                "{} is not a MAC algorithm",
                alg.name()
            )));
        }
        key.check(KeyOperation::MacCreate, alg)?;
        cose_common::validate_buckets(&self.protected, &self.unprotected)?;

        let payload = self.payload.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage("payload is required for tag computation".to_string())
        })?;

        let body_protected = cose_common::freeze_protected(&mut self.protected);
        let structure = cose_common::encode_mac_structure(
            MAC_CONTEXT_MAC0,
            &body_protected,
            &self.external_aad,
            payload,
        );

        self.tag = cose_crypto::mac::tag(alg, key, &structure)?;
        Ok(())
    }

    fn verify_tag(&self, key: &CoseKey) -> Result<(), CoseError> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage(
                "detached payload requires external payload bytes".to_string(),
            )
        })?;
        verify_impl(self, key, payload)
    }

    fn verify_tag_detached(&self, key: &CoseKey, payload: &[u8]) -> Result<(), CoseError> {
        if self.payload.is_some() {
            return Err(CoseError::MalformedMessage(
                "message carries an embedded payload".to_string(),
            ));
        }
        verify_impl(self, key, payload)
    }
}

fn verify_impl(msg: &CoseMac0, key: &CoseKey, payload: &[u8]) -> Result<(), CoseError> {
    let alg = crate::headers::alg_of(&msg.protected, &msg.unprotected)?;
    if alg.kind() != AlgorithmKind::Mac {
        return Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a MAC algorithm",
            alg.name()
        )));
    }
    key.check(KeyOperation::MacVerify, alg)?;

    let body_protected = cose_common::protected_bytes(&msg.protected);
    let structure = cose_common::encode_mac_structure(
        MAC_CONTEXT_MAC0,
        &body_protected,
        &msg.external_aad,
        payload,
    );

    cose_crypto::mac::verify(alg, key, &structure, &msg.tag)
}
