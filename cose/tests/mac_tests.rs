// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for COSE_Mac0 and COSE_Mac.
//!
//! Covers the RFC 8152 C.6.1 vector, tag determinism, recipient-based CEK
//! establishment (direct and AES key wrap), and the direct-recipient mixing
//! rule.

mod common;

use common::*;
use cose::{
    decode, encode_mac, encode_mac0, CoseAlgorithm, CoseError, CoseKey, CoseMac, CoseMac0,
    CoseMac0Ext, CoseMacExt, CoseMessage, CoseRecipient, HeaderOps,
};
use rand_core::OsRng;

/// COSE_Mac0 example from RFC 8152 appendix C.6.1 (AES-MAC-256/64 under the
/// shared secret).
const RFC8152_C_6_1: &str = "d18443a1010fa054546869732069732074686520636f6e74656e742e4872\
                             6043745027214f";

#[test]
fn rfc8152_c_6_1_tag_verifies() {
    let bytes = hex_bytes(RFC8152_C_6_1);
    let msg = match decode(&bytes).unwrap() {
        CoseMessage::Mac0(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };

    assert_eq!(msg.alg().unwrap(), CoseAlgorithm::AES_MAC_256_64);
    assert_eq!(msg.tag, hex_bytes("726043745027214f"));

    msg.verify_tag(&rfc8152_shared_secret()).unwrap();
}

#[test]
fn rfc8152_c_6_1_recomputes_to_the_same_tag() {
    let mut msg = CoseMac0::default();
    let (key, value) = alg_attr(CoseAlgorithm::AES_MAC_256_64);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"This is the content.".to_vec());
    msg.compute_tag(&rfc8152_shared_secret()).unwrap();

    assert_eq!(msg.tag, hex_bytes("726043745027214f"));
    assert_eq!(encode_mac0(&msg, true), hex_bytes(RFC8152_C_6_1));
}

#[test]
fn hmac_mac0_round_trips_and_is_deterministic() {
    let key = rfc8152_shared_secret();

    let mut msg = CoseMac0::default();
    let (label, value) = alg_attr(CoseAlgorithm::HMAC_256_64);
    msg.set_protected(label, value).unwrap();
    msg.payload = Some(b"This is the content.".to_vec());
    msg.compute_tag(&key).unwrap();
    assert_eq!(msg.tag.len(), 8);

    let first_tag = msg.tag.clone();
    msg.compute_tag(&key).unwrap();
    assert_eq!(msg.tag, first_tag);

    let bytes = encode_mac0(&msg, true);
    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Mac0(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    decoded.verify_tag(&key).unwrap();

    // A flipped tag byte must fail, in constant time.
    let mut tampered = decoded.clone();
    tampered.tag[3] ^= 0x40;
    assert_eq!(
        tampered.verify_tag(&key),
        Err(CoseError::VerificationFailure)
    );
}

#[test]
fn mac0_detached_payload_verifies_against_external_bytes() {
    let key = rfc8152_shared_secret();

    let mut msg = CoseMac0::default();
    let (label, value) = alg_attr(CoseAlgorithm::HMAC_256_256);
    msg.set_protected(label, value).unwrap();
    msg.payload = Some(b"detached".to_vec());
    msg.compute_tag(&key).unwrap();
    msg.payload = None;

    let bytes = encode_mac0(&msg, true);
    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Mac0(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    decoded.verify_tag_detached(&key, b"detached").unwrap();
    assert_eq!(
        decoded.verify_tag_detached(&key, b"attached"),
        Err(CoseError::VerificationFailure)
    );
}

fn direct_recipient(key: CoseKey) -> CoseRecipient {
    let mut recipient = CoseRecipient::default();
    let (label, value) = alg_attr(CoseAlgorithm::Direct);
    recipient.set_unprotected(label, value).unwrap();
    recipient.key = Some(key);
    recipient
}

#[test]
fn mac_with_direct_recipient_round_trips() {
    let secret = rfc8152_shared_secret();

    let mut msg = CoseMac::default();
    let (label, value) = alg_attr(CoseAlgorithm::HMAC_256_256);
    msg.set_protected(label, value).unwrap();
    msg.payload = Some(b"This is the content.".to_vec());
    msg.recipients.push(direct_recipient(secret.clone()));
    msg.compute_tag(&mut OsRng).unwrap();

    // Direct recipients carry no wrapped key.
    assert!(msg.recipients[0].ciphertext.is_empty());

    let bytes = encode_mac(&msg, true);
    let mut decoded = match decode(&bytes).unwrap() {
        CoseMessage::Mac(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };

    // No key material yet: verification cannot proceed.
    assert!(decoded.verify_tag().is_err());

    decoded.recipients[0].key = Some(secret);
    decoded.verify_tag().unwrap();
}

/// CEK recovery through an A128KW recipient (the RFC 8152 C.5.3 shape).
#[test]
fn mac_with_key_wrap_recipient_recovers_the_cek() {
    let kek = CoseKey::symmetric(hex_bytes("000102030405060708090a0b0c0d0e0f")).unwrap();

    let mut recipient = CoseRecipient::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128KW);
    recipient.set_unprotected(label, value).unwrap();
    recipient.key = Some(kek.clone());

    let mut msg = CoseMac::default();
    let (label, value) = alg_attr(CoseAlgorithm::HMAC_256_256);
    msg.set_protected(label, value).unwrap();
    msg.payload = Some(b"This is the content.".to_vec());
    msg.recipients.push(recipient);
    msg.compute_tag(&mut OsRng).unwrap();

    // A 32-byte CEK wraps to 40 bytes under AES-KW.
    assert_eq!(msg.recipients[0].ciphertext.len(), 40);

    let bytes = encode_mac(&msg, true);
    let mut decoded = match decode(&bytes).unwrap() {
        CoseMessage::Mac(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    decoded.recipients[0].key = Some(kek);
    decoded.verify_tag().unwrap();

    // The wrong KEK cannot recover the CEK.
    decoded.recipients[0].key =
        Some(CoseKey::symmetric(vec![0xff; 16]).unwrap());
    assert_eq!(decoded.verify_tag(), Err(CoseError::DecryptionFailure));
}

#[test]
fn direct_recipients_cannot_be_mixed_with_key_wrap() {
    let mut msg = CoseMac::default();
    let (label, value) = alg_attr(CoseAlgorithm::HMAC_256_256);
    msg.set_protected(label, value).unwrap();
    msg.payload = Some(b"payload".to_vec());

    msg.recipients
        .push(direct_recipient(rfc8152_shared_secret()));

    let mut wrap = CoseRecipient::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128KW);
    wrap.set_unprotected(label, value).unwrap();
    wrap.key = Some(CoseKey::symmetric(vec![0u8; 16]).unwrap());
    msg.recipients.push(wrap);

    assert!(matches!(
        msg.compute_tag(&mut OsRng),
        Err(CoseError::UnsupportedRecipient(_))
    ));
}

#[test]
fn key_wrap_recipients_must_keep_protected_empty() {
    let mut recipient = CoseRecipient::default();
    let (label, value) = alg_attr(CoseAlgorithm::A128KW);
    recipient.set_protected(label, value).unwrap();
    recipient.key = Some(CoseKey::symmetric(vec![0u8; 16]).unwrap());

    let mut msg = CoseMac::default();
    let (label, value) = alg_attr(CoseAlgorithm::HMAC_256_256);
    msg.set_protected(label, value).unwrap();
    msg.payload = Some(b"payload".to_vec());
    msg.recipients.push(recipient);

    assert!(matches!(
        msg.compute_tag(&mut OsRng),
        Err(CoseError::InvalidHeader(_))
    ));
}

#[test]
fn direct_key_must_match_the_content_key_length() {
    let short = CoseKey::symmetric(vec![1u8; 16]).unwrap();

    let mut msg = CoseMac::default();
    let (label, value) = alg_attr(CoseAlgorithm::HMAC_256_256);
    msg.set_protected(label, value).unwrap();
    msg.payload = Some(b"payload".to_vec());
    msg.recipients.push(direct_recipient(short));

    assert!(matches!(
        msg.compute_tag(&mut OsRng),
        Err(CoseError::InvalidKey(_))
    ));
}
