// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for COSE_Encrypt0 and COSE_Encrypt.
//!
//! Covers AEAD round trips, nonce derivation (explicit IV, partial IV,
//! generated IV), tamper detection, and recipient-based CEK establishment
//! including ECDH-ES + A128KW.

mod common;

use common::*;
use cose::{
    decode, encode_encrypt, encode_encrypt0, CoseAlgorithm, CoseEncrypt, CoseEncrypt0,
    CoseEncrypt0Ext, CoseEncryptExt, CoseError, CoseKey, CoseMessage, CoseRecipient, HeaderOps,
    HeaderValue,
};
use rand_core::OsRng;

const PLAINTEXT: &[u8] = b"This is the content.";

fn encrypt0_with_iv(alg: CoseAlgorithm, iv: &[u8]) -> CoseEncrypt0 {
    let mut msg = CoseEncrypt0::default();
    let (label, value) = alg_attr(alg);
    msg.set_protected(label, value).unwrap();
    let (label, value) = attr(5, HeaderValue::Bytes(iv.to_vec()));
    msg.set_unprotected(label, value).unwrap();
    msg.plaintext = Some(PLAINTEXT.to_vec());
    msg
}

#[test]
fn encrypt0_gcm_round_trips() {
    let key = CoseKey::symmetric(vec![0x42; 16]).unwrap();

    let mut msg = encrypt0_with_iv(CoseAlgorithm::A128GCM, &[0x24; 12]);
    msg.encrypt(&key, &mut OsRng).unwrap();
    assert_eq!(
        msg.ciphertext.as_ref().unwrap().len(),
        PLAINTEXT.len() + 16
    );

    let bytes = encode_encrypt0(&msg, true);
    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Encrypt0(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    assert_eq!(decoded.decrypt(&key).unwrap(), PLAINTEXT);

    // Round-tripping a decoded message must be byte identical.
    assert_eq!(encode_encrypt0(&decoded, true), bytes);
}

/// AES-CCM-16-64-128 with the RFC 8152 C.4 nonce shape: 13-byte IV, 8-byte
/// tag.
#[test]
fn encrypt0_ccm_uses_the_short_tag() {
    let key = CoseKey::symmetric(hex_bytes("849b5786457c1491be3a76dcea6c4271")).unwrap();
    let iv = hex_bytes("89f52f65a1c580933b5261a78c");

    let mut msg = encrypt0_with_iv(CoseAlgorithm::AES_CCM_16_64_128, &iv);
    msg.encrypt(&key, &mut OsRng).unwrap();
    assert_eq!(msg.ciphertext.as_ref().unwrap().len(), PLAINTEXT.len() + 8);

    let bytes = encode_encrypt0(&msg, true);
    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Encrypt0(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    assert_eq!(decoded.decrypt(&key).unwrap(), PLAINTEXT);
}

#[test]
fn any_flipped_ciphertext_byte_fails_decryption() {
    let key = CoseKey::symmetric(vec![7; 32]).unwrap();

    let mut msg = encrypt0_with_iv(CoseAlgorithm::A256GCM, &[9; 12]);
    msg.encrypt(&key, &mut OsRng).unwrap();

    let ciphertext = msg.ciphertext.clone().unwrap();
    for i in 0..ciphertext.len() {
        let mut tampered = msg.clone();
        tampered.ciphertext.as_mut().unwrap()[i] ^= 0x01;
        assert_eq!(
            tampered.decrypt(&key),
            Err(CoseError::DecryptionFailure),
            "flipped ciphertext byte {i} still decrypts"
        );
    }
}

#[test]
fn external_aad_is_authenticated() {
    let key = CoseKey::symmetric(vec![3; 16]).unwrap();

    let mut msg = encrypt0_with_iv(CoseAlgorithm::A128GCM, &[1; 12]);
    msg.external_aad = b"binding".to_vec();
    msg.encrypt(&key, &mut OsRng).unwrap();

    let bytes = encode_encrypt0(&msg, true);
    let mut decoded = match decode(&bytes).unwrap() {
        CoseMessage::Encrypt0(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    assert_eq!(decoded.decrypt(&key), Err(CoseError::DecryptionFailure));

    decoded.external_aad = b"binding".to_vec();
    assert_eq!(decoded.decrypt(&key).unwrap(), PLAINTEXT);
}

#[test]
fn missing_iv_is_generated_and_recorded() {
    let key = CoseKey::symmetric(vec![5; 16]).unwrap();

    let mut msg = CoseEncrypt0::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128GCM);
    msg.set_protected(label, value).unwrap();
    msg.plaintext = Some(PLAINTEXT.to_vec());
    msg.encrypt(&key, &mut OsRng).unwrap();

    let iv = msg.get_attr(5).and_then(HeaderValue::as_bytes).unwrap();
    assert_eq!(iv.len(), 12);
    assert_eq!(msg.decrypt(&key).unwrap(), PLAINTEXT);
}

#[test]
fn partial_iv_combines_with_the_key_base_iv() {
    let base_iv = hex_bytes("89f52f65a1c580933b526100");
    let key = CoseKey::symmetric(vec![6; 16])
        .unwrap()
        .with_base_iv(base_iv);

    let mut msg = CoseEncrypt0::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128GCM);
    msg.set_protected(label, value).unwrap();
    let (label, value) = attr(6, HeaderValue::Bytes(vec![0x61]));
    msg.set_unprotected(label, value).unwrap();
    msg.plaintext = Some(PLAINTEXT.to_vec());
    msg.encrypt(&key, &mut OsRng).unwrap();

    let bytes = encode_encrypt0(&msg, true);
    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Encrypt0(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    assert_eq!(decoded.decrypt(&key).unwrap(), PLAINTEXT);

    // Without the base IV the nonce cannot be reconstructed.
    let bare = CoseKey::symmetric(vec![6; 16]).unwrap();
    assert!(matches!(
        decoded.decrypt(&bare),
        Err(CoseError::InvalidHeader(_))
    ));
}

#[test]
fn iv_and_partial_iv_together_are_rejected_at_decode() {
    let key = CoseKey::symmetric(vec![8; 16]).unwrap();
    let mut msg = encrypt0_with_iv(CoseAlgorithm::A128GCM, &[2; 12]);
    msg.encrypt(&key, &mut OsRng).unwrap();

    // Smuggle a Partial IV into the unprotected bucket after encryption.
    msg.unprotected.insert(
        cose::HeaderKey::Int(6),
        HeaderValue::Bytes(vec![0x01]),
    );
    let bytes = encode_encrypt0(&msg, true);
    assert!(matches!(
        decode(&bytes),
        Err(CoseError::InvalidHeader(_))
    ));
}

fn key_agreement_recipient(
    alg: CoseAlgorithm,
    ephemeral: CoseKey,
    receiver_public: CoseKey,
) -> CoseRecipient {
    let mut recipient = CoseRecipient::default();
    let (label, value) = alg_attr(alg);
    recipient.set_protected(label, value).unwrap();
    recipient.key = Some(ephemeral);
    recipient.peer_key = Some(receiver_public);
    recipient
}

/// ECDH-ES + A128KW end to end: the recipient recovers the CEK from the
/// ephemeral key in the headers and then decrypts the content.
#[test]
fn encrypt_with_ecdh_es_a128kw_round_trips() {
    let (receiver_private, receiver_public) = p256_keypair();
    let (ephemeral, _) = p256_keypair();

    let mut msg = CoseEncrypt::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128GCM);
    msg.set_protected(label, value).unwrap();
    msg.plaintext = Some(PLAINTEXT.to_vec());
    msg.recipients.push(key_agreement_recipient(
        CoseAlgorithm::ECDH_ES_A128KW,
        ephemeral,
        receiver_public,
    ));
    msg.encrypt(&mut OsRng).unwrap();

    // The ephemeral public key travels in the recipient headers, and the
    // wrapped 16-byte CEK in its ciphertext.
    assert!(msg.recipients[0].get_attr(-1).is_some());
    assert_eq!(msg.recipients[0].ciphertext.len(), 24);

    let bytes = encode_encrypt(&msg, true);
    let mut decoded = match decode(&bytes).unwrap() {
        CoseMessage::Encrypt(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    assert!(matches!(
        decoded.recipients[0].get_attr(-1),
        Some(HeaderValue::Key(_))
    ));

    decoded.recipients[0].key = Some(receiver_private);
    assert_eq!(decoded.decrypt().unwrap(), PLAINTEXT);

    // Round-tripping a decoded message must be byte identical.
    assert_eq!(encode_encrypt(&decoded, true), bytes);
}

#[test]
fn encrypt_with_direct_key_agreement_round_trips() {
    let (receiver_private, receiver_public) = p256_keypair();
    let (ephemeral, _) = p256_keypair();

    let mut msg = CoseEncrypt::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128GCM);
    msg.set_protected(label, value).unwrap();
    msg.plaintext = Some(PLAINTEXT.to_vec());
    msg.recipients.push(key_agreement_recipient(
        CoseAlgorithm::ECDH_ES_HKDF_256,
        ephemeral,
        receiver_public,
    ));
    msg.encrypt(&mut OsRng).unwrap();

    // Direct key agreement transports no wrapped key.
    assert!(msg.recipients[0].ciphertext.is_empty());

    let bytes = encode_encrypt(&msg, true);
    let mut decoded = match decode(&bytes).unwrap() {
        CoseMessage::Encrypt(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    decoded.recipients[0].key = Some(receiver_private);
    assert_eq!(decoded.decrypt().unwrap(), PLAINTEXT);
}

#[test]
fn wrong_receiver_key_fails_key_agreement_unwrap() {
    let (_, receiver_public) = p256_keypair();
    let (other_private, _) = p256_keypair();
    let (ephemeral, _) = p256_keypair();

    let mut msg = CoseEncrypt::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128GCM);
    msg.set_protected(label, value).unwrap();
    msg.plaintext = Some(PLAINTEXT.to_vec());
    msg.recipients.push(key_agreement_recipient(
        CoseAlgorithm::ECDH_ES_A128KW,
        ephemeral,
        receiver_public,
    ));
    msg.encrypt(&mut OsRng).unwrap();

    let bytes = encode_encrypt(&msg, true);
    let mut decoded = match decode(&bytes).unwrap() {
        CoseMessage::Encrypt(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    decoded.recipients[0].key = Some(other_private);
    assert_eq!(decoded.decrypt(), Err(CoseError::DecryptionFailure));
}

#[test]
fn signature_algorithms_are_not_key_distribution_methods() {
    let mut recipient = CoseRecipient::default();
    let (label, value) = alg_attr(CoseAlgorithm::ES256);
    recipient.set_unprotected(label, value).unwrap();

    let mut msg = CoseEncrypt::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128GCM);
    msg.set_protected(label, value).unwrap();
    msg.plaintext = Some(PLAINTEXT.to_vec());
    msg.recipients.push(recipient);

    assert!(matches!(
        msg.encrypt(&mut OsRng),
        Err(CoseError::UnsupportedRecipient(_))
    ));
}
