// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE_Mac operations.
//!
//! The CEK for the tag is established through the recipient tree; the MAC
//! itself runs over the `"MAC"` context structure.

use cose_abstractions::{
    AlgorithmKind, CoseError, CoseKey, CoseMac, KeyOperation, MAC_CONTEXT_MAC,
};
use rand_core::CryptoRngCore;

use crate::recipient;

/// Tag computation and verification for MACed messages with recipients.
pub trait CoseMacExt {
    /// Establish the CEK via the recipients, then compute the tag.
    ///
    /// The RNG generates the CEK for key-wrap recipients.
    fn compute_tag<R: CryptoRngCore>(&mut self, rng: &mut R) -> Result<(), CoseError>;

    /// Recover the CEK via the recipients, then verify the tag.
    fn verify_tag(&self) -> Result<(), CoseError>;

    /// Verify the tag of a detached-payload message.
    fn verify_tag_detached(&self, payload: &[u8]) -> Result<(), CoseError>;
}

impl CoseMacExt for CoseMac {
    fn compute_tag<R: CryptoRngCore>(&mut self, rng: &mut R) -> Result<(), CoseError> {
        let alg = crate::headers::alg_of(&self.protected, &self.unprotected)?;
        if alg.kind() != AlgorithmKind::Mac {
            return Err(CoseError::InvalidAlgorithm(format!(
                "{} is not a MAC algorithm",
                alg.name()
            )));
        }
        cose_common::validate_buckets(&self.protected, &self.unprotected)?;

        let payload = self.payload.clone().ok_or_else(|| {
            CoseError::MalformedMessage("payload is required for tag computation".to_string())
        })?;

        let cek = recipient::establish_cek(
            alg,
            KeyOperation::MacCreate,
            &mut self.recipients,
            rng,
        )?;
        let cek_key = CoseKey::symmetric(cek.to_vec())?;

        let body_protected = cose_common::freeze_protected(&mut self.protected);
        let structure = cose_common::encode_mac_structure(
            MAC_CONTEXT_MAC,
            &body_protected,
            &self.external_aad,
            &payload,
        );

        self.tag = cose_crypto::mac::tag(alg, &cek_key, &structure)?;
        Ok(())
    }

    fn verify_tag(&self) -> Result<(), CoseError> {
        let payload = self.payload.as_deref().ok_or_else(|| {
            CoseError::MalformedMessage(
                "detached payload requires external payload bytes".to_string(),
            )
        })?;
        verify_impl(self, payload)
    }

    fn verify_tag_detached(&self, payload: &[u8]) -> Result<(), CoseError> {
        if self.payload.is_some() {
            return Err(CoseError::MalformedMessage(
                "message carries an embedded payload".to_string(),
            ));
        }
        verify_impl(self, payload)
    }
}

fn verify_impl(msg: &CoseMac, payload: &[u8]) -> Result<(), CoseError> {
    let alg = crate::headers::alg_of(&msg.protected, &msg.unprotected)?;
    if alg.kind() != AlgorithmKind::Mac {
        return Err(CoseError::InvalidAlgorithm(format!(
            "{} is not a MAC algorithm",
            alg.name()
        )));
    }

    let cek = recipient::recover_cek(alg, KeyOperation::MacVerify, &msg.recipients)?;
    let cek_key = CoseKey::symmetric(cek.to_vec())?;

    let body_protected = cose_common::protected_bytes(&msg.protected);
    let structure = cose_common::encode_mac_structure(
        MAC_CONTEXT_MAC,
        &body_protected,
        &msg.external_aad,
        payload,
    );

    cose_crypto::mac::verify(alg, &cek_key, &structure, &msg.tag)
}
