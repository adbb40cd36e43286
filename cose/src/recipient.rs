// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Content key distribution across the recipient tree.
//!
//! The recipient's `alg` selects one of four protocols:
//! - **Direct** (and direct+HKDF): the recipient's symmetric key is (or
//!   derives) the CEK; the recipient ciphertext stays empty.
//! - **Direct key agreement**: ECDH + HKDF produce the CEK directly.
//! - **Key wrap / key transport**: a fresh random CEK is generated once per
//!   message and wrapped for every recipient (AES-KW or RSA-OAEP).
//! - **Key agreement with key wrap**: ECDH + HKDF produce a KEK, which then
//!   wraps the CEK.
//!
//! Direct and direct-key-agreement recipients must be the only recipient of
//! a message. Nested recipients carry the key for the layer above and are
//! handled by recursion on the same protocols.

use cose_abstractions::header_params;
use cose_abstractions::{
    AlgorithmKind, CoseAlgorithm, CoseError, CoseKey, CoseRecipient, HeaderKey, HeaderValue,
    KeyOperation, KeyParams,
};
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::headers;

/// The recipient's algorithm, resolved from its buckets.
fn recipient_alg(recipient: &CoseRecipient) -> Result<CoseAlgorithm, CoseError> {
    headers::alg_of(&recipient.protected, &recipient.unprotected)
}

/// The content key distribution protocol for an algorithm.
fn distribution_kind(alg: CoseAlgorithm) -> Result<AlgorithmKind, CoseError> {
    match alg.kind() {
        kind @ (AlgorithmKind::Direct
        | AlgorithmKind::DirectKdf
        | AlgorithmKind::DirectKeyAgreement
        | AlgorithmKind::KeyWrap
        | AlgorithmKind::KeyTransport
        | AlgorithmKind::KeyAgreementWithKeyWrap) => Ok(kind),
        _ => Err(CoseError::UnsupportedRecipient(format!(
            "{} is not a content key distribution algorithm",
            alg.name()
        ))),
    }
}

fn is_direct_like(kind: AlgorithmKind) -> bool {
    matches!(
        kind,
        AlgorithmKind::Direct | AlgorithmKind::DirectKdf | AlgorithmKind::DirectKeyAgreement
    )
}

/// Direct and direct-key-agreement recipients must stand alone.
fn check_mixing(recipients: &[CoseRecipient]) -> Result<(), CoseError> {
    if recipients.len() <= 1 {
        return Ok(());
    }
    for recipient in recipients {
        let kind = distribution_kind(recipient_alg(recipient)?)?;
        if is_direct_like(kind) {
            return Err(CoseError::UnsupportedRecipient(
                "direct recipients must be the only recipient of a message".to_string(),
            ));
        }
    }
    Ok(())
}

fn symmetric_of(key: &CoseKey) -> Result<&[u8], CoseError> {
    match &key.params {
        KeyParams::Symmetric { k } => Ok(k.as_slice()),
        _ => Err(CoseError::InvalidKey(
            "recipient requires a symmetric key".to_string(),
        )),
    }
}

fn require_key(recipient: &CoseRecipient) -> Result<&CoseKey, CoseError> {
    recipient
        .key
        .as_ref()
        .ok_or_else(|| CoseError::InvalidKey("recipient key material is required".to_string()))
}

fn salt_of(recipient: &CoseRecipient) -> Vec<u8> {
    headers::get_attr(
        &recipient.protected,
        &recipient.unprotected,
        header_params::SALT,
    )
    .and_then(HeaderValue::as_bytes)
    .map(<[u8]>::to_vec)
    .unwrap_or_default()
}

/// The serialized COSE_KDF_Context for a derivation targeting `target`.
fn kdf_info(
    recipient: &CoseRecipient,
    target: CoseAlgorithm,
    target_len: usize,
) -> Result<Vec<u8>, CoseError> {
    let protected = cose_common::protected_bytes(&recipient.protected);
    let party = |identity, nonce, other| cose_common::PartyInfo {
        identity: headers::get_attr(&recipient.protected, &recipient.unprotected, identity),
        nonce: headers::get_attr(&recipient.protected, &recipient.unprotected, nonce),
        other: headers::get_attr(&recipient.protected, &recipient.unprotected, other),
    };
    cose_common::encode_kdf_context(
        target.id(),
        party(
            header_params::PARTY_U_IDENTITY,
            header_params::PARTY_U_NONCE,
            header_params::PARTY_U_OTHER,
        ),
        party(
            header_params::PARTY_V_IDENTITY,
            header_params::PARTY_V_NONCE,
            header_params::PARTY_V_OTHER,
        ),
        (target_len * 8) as u64,
        &protected,
    )
}

fn key_length_of(alg: CoseAlgorithm) -> Result<usize, CoseError> {
    alg.key_length().ok_or_else(|| {
        CoseError::InvalidAlgorithm(format!("{} has no fixed key length", alg.name()))
    })
}

/// Which side of the exchange is deriving, for peer key resolution.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Side {
    Sender,
    Receiver,
}

/// ECDH + HKDF shared by direct key agreement and key agreement with key
/// wrap; `target` is the algorithm the derived key will be used with.
fn derive_agreement(
    recipient: &CoseRecipient,
    alg: CoseAlgorithm,
    target: CoseAlgorithm,
    side: Side,
) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let target_len = key_length_of(target)?;
    let local = require_key(recipient)?;
    local.check(KeyOperation::DeriveKey, alg)?;

    let peer = match side {
        Side::Sender => recipient
            .peer_key
            .clone()
            .ok_or_else(|| CoseError::InvalidKey("peer public key is required".to_string()))?,
        Side::Receiver => {
            let label = if alg.is_ephemeral_static() {
                header_params::EPHEMERAL_KEY
            } else {
                header_params::STATIC_KEY
            };
            match headers::get_attr(&recipient.protected, &recipient.unprotected, label) {
                Some(value) => cose_common::key_from_header_value(value)?,
                None => recipient.peer_key.clone().ok_or_else(|| {
                    CoseError::InvalidHeader("missing peer key for key agreement".to_string())
                })?,
            }
        }
    };

    let secret = cose_crypto::ecdh::agree(local, &peer)?;
    let info = kdf_info(recipient, target, target_len)?;
    cose_crypto::kdf::derive(alg, &secret, &salt_of(recipient), &info, target_len)
}

/// Record the sender's ephemeral public key in the unprotected bucket when
/// the caller has not placed one already.
fn publish_ephemeral(recipient: &mut CoseRecipient, alg: CoseAlgorithm) -> Result<(), CoseError> {
    if !alg.is_ephemeral_static() {
        return Ok(());
    }
    if headers::get_attr(
        &recipient.protected,
        &recipient.unprotected,
        header_params::EPHEMERAL_KEY,
    )
    .is_some()
    {
        return Ok(());
    }
    let local = require_key(recipient)?;
    recipient.unprotected.insert(
        HeaderKey::Int(header_params::EPHEMERAL_KEY),
        HeaderValue::Key(headers::public_part(local)),
    );
    Ok(())
}

/// Establish the CEK on the sending side, filling recipient ciphertexts.
///
/// `op` is the content-layer operation (`Encrypt` or `MacCreate`), checked
/// against direct recipients' keys.
pub(crate) fn establish_cek<R: CryptoRngCore>(
    content_alg: CoseAlgorithm,
    op: KeyOperation,
    recipients: &mut [CoseRecipient],
    rng: &mut R,
) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let first = recipients.first().ok_or_else(|| {
        CoseError::UnsupportedRecipient("at least one recipient is required".to_string())
    })?;
    check_mixing(recipients)?;
    let cek_len = key_length_of(content_alg)?;

    let kind = distribution_kind(recipient_alg(first)?)?;
    if is_direct_like(kind) {
        let recipient = &mut recipients[0];
        let alg = recipient_alg(recipient)?;
        cose_common::validate_buckets(&recipient.protected, &recipient.unprotected)?;
        recipient.ciphertext.clear();

        return match kind {
            AlgorithmKind::Direct => {
                let key = require_key(recipient)?;
                key.check(op, content_alg)?;
                let k = symmetric_of(key)?;
                if k.len() != cek_len {
                    return Err(CoseError::InvalidKey(format!(
                        "direct key has length {}, expected {cek_len}",
                        k.len()
                    )));
                }
                Ok(Zeroizing::new(k.to_vec()))
            }
            AlgorithmKind::DirectKdf => {
                let key = require_key(recipient)?;
                key.check(KeyOperation::DeriveKey, alg)?;
                let info = kdf_info(recipient, content_alg, cek_len)?;
                cose_crypto::kdf::derive(
                    alg,
                    symmetric_of(key)?,
                    &salt_of(recipient),
                    &info,
                    cek_len,
                )
            }
            _ => {
                publish_ephemeral(recipient, alg)?;
                derive_agreement(recipient, alg, content_alg, Side::Sender)
            }
        };
    }

    // Key wrap family: one fresh CEK, wrapped for every recipient.
    let cek = Zeroizing::new(cose_crypto::rng::random_bytes(rng, cek_len)?);
    for recipient in recipients.iter_mut() {
        wrap_into(recipient, &cek, rng)?;
    }
    Ok(cek)
}

fn wrap_into<R: CryptoRngCore>(
    recipient: &mut CoseRecipient,
    cek: &[u8],
    rng: &mut R,
) -> Result<(), CoseError> {
    let alg = recipient_alg(recipient)?;
    cose_common::validate_buckets(&recipient.protected, &recipient.unprotected)?;

    match distribution_kind(alg)? {
        AlgorithmKind::KeyWrap => {
            // AES-KW is not authenticated against any context, so the
            // protected bucket of such a recipient must stay empty.
            if !recipient.protected.is_empty() {
                return Err(CoseError::InvalidHeader(
                    "key wrap recipients must carry an empty protected bucket".to_string(),
                ));
            }
            let nested_kek = if recipient.recipients.is_empty() {
                let key = require_key(recipient)?;
                key.check(KeyOperation::WrapKey, alg)?;
                None
            } else {
                Some(establish_cek(
                    alg,
                    KeyOperation::WrapKey,
                    &mut recipient.recipients,
                    rng,
                )?)
            };
            recipient.ciphertext = cose_crypto::keywrap::wrap(
                alg,
                recipient.key.as_ref(),
                nested_kek.as_ref().map(|kek| kek.as_slice()),
                cek,
                rng,
            )?;
        }
        AlgorithmKind::KeyTransport => {
            let key = require_key(recipient)?;
            key.check(KeyOperation::WrapKey, alg)?;
            recipient.ciphertext =
                cose_crypto::keywrap::wrap(alg, Some(key), None, cek, rng)?;
        }
        AlgorithmKind::KeyAgreementWithKeyWrap => {
            let kw_alg = alg
                .key_wrap_alg()
                .ok_or_else(|| CoseError::UnsupportedRecipient(alg.name().to_string()))?;
            publish_ephemeral(recipient, alg)?;
            let kek = derive_agreement(recipient, alg, kw_alg, Side::Sender)?;
            recipient.ciphertext =
                cose_crypto::keywrap::wrap(kw_alg, None, Some(&kek), cek, rng)?;
        }
        _ => {
            return Err(CoseError::UnsupportedRecipient(
                "direct recipients must be the only recipient of a message".to_string(),
            ));
        }
    }
    Ok(())
}

/// Recover the CEK on the receiving side.
///
/// Recipients are tried in order; the first one whose key material yields a
/// CEK wins. `op` is the content-layer operation (`Decrypt` or
/// `MacVerify`).
pub(crate) fn recover_cek(
    content_alg: CoseAlgorithm,
    op: KeyOperation,
    recipients: &[CoseRecipient],
) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    if recipients.is_empty() {
        return Err(CoseError::UnsupportedRecipient(
            "message has no recipients".to_string(),
        ));
    }
    let cek_len = key_length_of(content_alg)?;

    let mut last_err = None;
    for recipient in recipients {
        match try_recover(recipient, content_alg, cek_len, op) {
            Ok(cek) => return Ok(cek),
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err
        .unwrap_or_else(|| CoseError::InvalidKey("no recipient key material available".to_string())))
}

fn try_recover(
    recipient: &CoseRecipient,
    content_alg: CoseAlgorithm,
    cek_len: usize,
    op: KeyOperation,
) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let alg = recipient_alg(recipient)?;
    match distribution_kind(alg)? {
        AlgorithmKind::Direct => {
            let key = require_key(recipient)?;
            key.check(op, content_alg)?;
            let k = symmetric_of(key)?;
            if k.len() != cek_len {
                return Err(CoseError::InvalidKey(format!(
                    "direct key has length {}, expected {cek_len}",
                    k.len()
                )));
            }
            Ok(Zeroizing::new(k.to_vec()))
        }
        AlgorithmKind::DirectKdf => {
            let key = require_key(recipient)?;
            key.check(KeyOperation::DeriveKey, alg)?;
            let info = kdf_info(recipient, content_alg, cek_len)?;
            cose_crypto::kdf::derive(
                alg,
                symmetric_of(key)?,
                &salt_of(recipient),
                &info,
                cek_len,
            )
        }
        AlgorithmKind::DirectKeyAgreement => {
            derive_agreement(recipient, alg, content_alg, Side::Receiver)
        }
        AlgorithmKind::KeyWrap => {
            let nested_kek = if recipient.recipients.is_empty() {
                let key = require_key(recipient)?;
                key.check(KeyOperation::UnwrapKey, alg)?;
                None
            } else {
                Some(recover_cek(
                    alg,
                    KeyOperation::UnwrapKey,
                    &recipient.recipients,
                )?)
            };
            let cek = cose_crypto::keywrap::unwrap(
                alg,
                recipient.key.as_ref(),
                nested_kek.as_ref().map(|kek| kek.as_slice()),
                &recipient.ciphertext,
            )?;
            check_cek_len(&cek, cek_len)?;
            Ok(cek)
        }
        AlgorithmKind::KeyTransport => {
            let key = require_key(recipient)?;
            key.check(KeyOperation::UnwrapKey, alg)?;
            let cek =
                cose_crypto::keywrap::unwrap(alg, Some(key), None, &recipient.ciphertext)?;
            check_cek_len(&cek, cek_len)?;
            Ok(cek)
        }
        AlgorithmKind::KeyAgreementWithKeyWrap => {
            let kw_alg = alg
                .key_wrap_alg()
                .ok_or_else(|| CoseError::UnsupportedRecipient(alg.name().to_string()))?;
            let kek = derive_agreement(recipient, alg, kw_alg, Side::Receiver)?;
            let cek = cose_crypto::keywrap::unwrap(
                kw_alg,
                None,
                Some(&kek),
                &recipient.ciphertext,
            )?;
            check_cek_len(&cek, cek_len)?;
            Ok(cek)
        }
        _ => Err(CoseError::UnsupportedRecipient(format!(
            "{} is not a content key distribution algorithm",
            alg.name()
        ))),
    }
}

fn check_cek_len(cek: &[u8], expected: usize) -> Result<(), CoseError> {
    if cek.len() != expected {
        return Err(CoseError::InvalidKey(format!(
            "unwrapped CEK has length {}, expected {expected}",
            cek.len()
        )));
    }
    Ok(())
}

/// The Base IV a set of recipients contributes for partial-IV nonces, if
/// any recipient key carries one.
pub(crate) fn base_iv_of(recipients: &[CoseRecipient]) -> Option<Vec<u8>> {
    recipients
        .iter()
        .find_map(|r| r.key.as_ref().and_then(|k| k.base_iv.clone()))
}
