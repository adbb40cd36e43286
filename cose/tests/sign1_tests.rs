// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for COSE_Sign1 signing and verification.
//!
//! Covers the RFC 8152 C.2.1 vector, sign/verify round trips, detached
//! payloads, tamper detection, and key compatibility errors.

mod common;

use common::*;
use cose::{
    decode, encode_sign1, CoseAlgorithm, CoseError, CoseKey, CoseMessage, CoseSign1,
    CoseSign1Ext, Curve, HeaderOps, HeaderValue,
};
use rand_core::OsRng;

/// COSE_Sign1 example from RFC 8152 appendix C.2.1 (ES256, kid "11").
const RFC8152_C_2_1: &str = "d28443a10126a10442313154546869732069732074686520636f6e74656e74\
                             2e58408eb33e4ca31d1c465ab05aac34cc6b23d58fef5c083106c4d25a91ae\
                             f0b0117e2af9a291aa32e14ab834dc56ed2a223444547e01f11d3b0916e5a4\
                             c345cacb36";

#[test]
fn rfc8152_c_2_1_signature_verifies() {
    let bytes = hex_bytes(RFC8152_C_2_1);
    let msg = match decode(&bytes).unwrap() {
        CoseMessage::Sign1(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };

    assert_eq!(msg.alg().unwrap(), CoseAlgorithm::ES256);
    assert_eq!(
        msg.get_attr(4),
        Some(&HeaderValue::Bytes(b"11".to_vec()))
    );
    assert_eq!(msg.payload.as_deref(), Some(b"This is the content.".as_slice()));

    msg.verify(&rfc8152_p256_public()).unwrap();
}

/// Any flipped bit in the encoded message must break parsing or
/// verification.
#[test]
fn rfc8152_c_2_1_rejects_any_flipped_byte() {
    let bytes = hex_bytes(RFC8152_C_2_1);
    let key = rfc8152_p256_public();

    for i in 0..bytes.len() {
        let mut tampered = bytes.clone();
        tampered[i] ^= 0x01;

        let ok = match decode(&tampered) {
            Ok(CoseMessage::Sign1(msg)) => msg.verify(&key).is_ok(),
            _ => false,
        };
        assert!(!ok, "flipped byte {i} still verifies");
    }
}

#[test]
fn sign_and_verify_round_trip() {
    let (private, public) = p256_keypair();

    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"This is the content.".to_vec());
    msg.sign(&private, &mut OsRng).unwrap();

    let bytes = encode_sign1(&msg, true);
    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Sign1(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    decoded.verify(&public).unwrap();

    // Round-tripping a decoded message must be byte identical.
    assert_eq!(encode_sign1(&decoded, true), bytes);
}

#[test]
fn external_aad_is_bound_by_the_signature() {
    let (private, public) = p256_keypair();

    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"payload".to_vec());
    msg.external_aad = b"transcript binding".to_vec();
    msg.sign(&private, &mut OsRng).unwrap();

    let bytes = encode_sign1(&msg, true);
    let mut decoded = match decode(&bytes).unwrap() {
        CoseMessage::Sign1(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };

    // Without the AAD the signature must not verify.
    assert_eq!(decoded.verify(&public), Err(CoseError::VerificationFailure));

    decoded.external_aad = b"transcript binding".to_vec();
    decoded.verify(&public).unwrap();
}

#[test]
fn detached_payload_uses_external_bytes() {
    let (private, public) = p256_keypair();

    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"detached content".to_vec());
    msg.sign(&private, &mut OsRng).unwrap();

    // Detach the payload before transport.
    msg.payload = None;
    let bytes = encode_sign1(&msg, true);

    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Sign1(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };
    assert_eq!(decoded.payload, None);

    assert!(matches!(
        decoded.verify(&public),
        Err(CoseError::MalformedMessage(_))
    ));
    decoded
        .verify_detached(&public, b"detached content")
        .unwrap();
    assert_eq!(
        decoded.verify_detached(&public, b"different content"),
        Err(CoseError::VerificationFailure)
    );
}

#[test]
fn signing_without_a_payload_is_an_error() {
    let (private, _) = p256_keypair();
    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    msg.set_protected(key, value).unwrap();
    assert!(matches!(
        msg.sign(&private, &mut OsRng),
        Err(CoseError::MalformedMessage(_))
    ));
}

#[test]
fn key_and_algorithm_compatibility_is_enforced() {
    let (private, _) = p256_keypair();

    // Missing alg header.
    let mut msg = CoseSign1::default();
    msg.payload = Some(b"data".to_vec());
    assert!(matches!(
        msg.sign(&private, &mut OsRng),
        Err(CoseError::InvalidAlgorithm(_))
    ));

    // A MAC algorithm cannot sign.
    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::HMAC_256_256);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"data".to_vec());
    assert!(matches!(
        msg.sign(&private, &mut OsRng),
        Err(CoseError::InvalidAlgorithm(_))
    ));

    // ES384 requires a P-384 key.
    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES384);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"data".to_vec());
    assert!(matches!(
        msg.sign(&private, &mut OsRng),
        Err(CoseError::InvalidKey(_))
    ));

    // key_ops restricted to verification cannot sign.
    let restricted = rfc8152_p256_key().with_key_ops(vec![cose::KeyOperation::Verify]);
    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"data".to_vec());
    assert!(matches!(
        msg.sign(&restricted, &mut OsRng),
        Err(CoseError::InvalidKey(_))
    ));
}

#[test]
fn wrong_key_does_not_verify() {
    let (private, _) = p256_keypair();
    let (_, other_public) = p256_keypair();

    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    msg.set_protected(key, value).unwrap();
    msg.payload = Some(b"payload".to_vec());
    msg.sign(&private, &mut OsRng).unwrap();

    assert_eq!(
        msg.verify(&other_public),
        Err(CoseError::VerificationFailure)
    );
}

#[test]
fn crit_listing_a_present_label_round_trips() {
    let (private, public) = p256_keypair();

    let mut msg = CoseSign1::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    msg.set_protected(key, value).unwrap();
    msg.set_protected(
        cose::HeaderKey::Int(2),
        HeaderValue::Labels(vec![cose::HeaderKey::Int(4)]),
    )
    .unwrap();
    msg.set_protected(
        cose::HeaderKey::Int(4),
        HeaderValue::Bytes(b"kid-1".to_vec()),
    )
    .unwrap();
    msg.payload = Some(b"payload".to_vec());
    msg.sign(&private, &mut OsRng).unwrap();

    let bytes = encode_sign1(&msg, true);
    match decode(&bytes).unwrap() {
        CoseMessage::Sign1(decoded) => decoded.verify(&public).unwrap(),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn ed25519_key_model_is_usable_for_eddsa() {
    // EdDSA requires an OKP key on an Edwards curve.
    let ec2 = CoseKey::ec2(Curve::P256, vec![1; 32], vec![2; 32], None).unwrap();
    assert!(matches!(
        ec2.check(cose::KeyOperation::Sign, CoseAlgorithm::EdDSA),
        Err(CoseError::InvalidKey(_))
    ));

    let okp = CoseKey::okp(Curve::Ed25519, vec![3; 32], Some(vec![4; 32])).unwrap();
    okp.check(cose::KeyOperation::Sign, CoseAlgorithm::EdDSA)
        .unwrap();
}
