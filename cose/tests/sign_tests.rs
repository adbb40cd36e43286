// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for multi-signer COSE_Sign messages.

mod common;

use common::*;
use cose::{
    decode, encode_sign, CoseAlgorithm, CoseError, CoseMessage, CoseSign, CoseSignExt,
    CoseSignature, HeaderOps,
};
use rand_core::OsRng;

fn two_signer_message() -> CoseSign {
    let mut msg = CoseSign::default();
    msg.payload = Some(b"This is the content.".to_vec());

    let mut es256 = CoseSignature::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES256);
    es256.set_protected(key, value).unwrap();
    msg.signatures.push(es256);

    let mut es512 = CoseSignature::default();
    let (key, value) = alg_attr(CoseAlgorithm::ES512);
    es512.set_protected(key, value).unwrap();
    msg.signatures.push(es512);

    msg
}

/// Two signers (ES256 and ES512) over the same body, each independently
/// verifiable.
#[test]
fn two_signers_verify_independently() {
    let (p256_private, p256_public) = p256_keypair();
    let (p521_private, p521_public) = p521_keypair();

    let mut msg = two_signer_message();
    msg.sign_signature(0, &p256_private, &mut OsRng).unwrap();
    msg.sign_signature(1, &p521_private, &mut OsRng).unwrap();

    let bytes = encode_sign(&msg, true);
    let decoded = match decode(&bytes).unwrap() {
        CoseMessage::Sign(msg) => msg,
        other => panic!("unexpected variant: {other:?}"),
    };

    assert_eq!(decoded.signatures.len(), 2);
    decoded.verify_signature(0, &p256_public).unwrap();
    decoded.verify_signature(1, &p521_public).unwrap();

    // Keys are not interchangeable across entries.
    assert!(decoded.verify_signature(0, &p521_public).is_err());
    assert!(decoded.verify_signature(1, &p256_public).is_err());

    // Round-tripping a decoded message must be byte identical.
    assert_eq!(encode_sign(&decoded, true), bytes);
}

#[test]
fn tampering_one_signature_leaves_the_other_valid() {
    let (p256_private, p256_public) = p256_keypair();
    let (p521_private, p521_public) = p521_keypair();

    let mut msg = two_signer_message();
    msg.sign_signature(0, &p256_private, &mut OsRng).unwrap();
    msg.sign_signature(1, &p521_private, &mut OsRng).unwrap();

    msg.signatures[1].signature[0] ^= 0x01;

    msg.verify_signature(0, &p256_public).unwrap();
    assert_eq!(
        msg.verify_signature(1, &p521_public),
        Err(CoseError::VerificationFailure)
    );
}

#[test]
fn signer_buckets_are_bound_into_the_signature() {
    let (private, public) = p256_keypair();

    let mut msg = two_signer_message();
    msg.signatures.truncate(1);
    msg.sign_signature(0, &private, &mut OsRng).unwrap();

    // Mutating the signer's protected bucket invalidates the signature.
    let (key, value) = attr(4, cose::HeaderValue::Bytes(b"other".to_vec()));
    msg.signatures[0].set_protected(key, value).unwrap();
    assert_eq!(
        msg.verify_signature(0, &public),
        Err(CoseError::VerificationFailure)
    );
}

#[test]
fn out_of_range_signer_index_is_reported() {
    let (private, _) = p256_keypair();
    let mut msg = two_signer_message();
    assert!(matches!(
        msg.sign_signature(5, &private, &mut OsRng),
        Err(CoseError::MalformedMessage(_))
    ));
}
