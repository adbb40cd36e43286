// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the COSE key codec and compatibility checks.

mod common;

use common::*;
use cose::{
    decode_key, encode_key, CoseAlgorithm, CoseError, CoseKey, Curve, KeyOperation, KeyParams,
};

#[test]
fn every_key_variant_round_trips() {
    let keys = [
        CoseKey::symmetric(vec![0x11; 32])
            .unwrap()
            .with_kid(b"our-secret".to_vec())
            .with_alg(CoseAlgorithm::HMAC_256_256),
        rfc8152_p256_key().with_alg(CoseAlgorithm::ES256),
        CoseKey::okp(Curve::Ed25519, vec![0x22; 32], Some(vec![0x33; 32]))
            .unwrap()
            .with_alg(CoseAlgorithm::EdDSA),
        CoseKey::okp(Curve::Ed448, vec![0x44; 57], None).unwrap(),
        CoseKey::rsa_private(
            vec![0xc3; 256],
            vec![0x01, 0x00, 0x01],
            vec![0x55; 256],
            vec![0x66; 128],
            vec![0x77; 128],
            Some(vec![0x88; 128]),
            Some(vec![0x99; 128]),
            Some(vec![0xaa; 128]),
        )
        .unwrap(),
        CoseKey::symmetric(vec![0xbb; 16])
            .unwrap()
            .with_base_iv(vec![0xcc; 12])
            .with_key_ops(vec![KeyOperation::Encrypt, KeyOperation::Decrypt]),
    ];

    for key in keys {
        let decoded = decode_key(&encode_key(&key)).unwrap();
        assert_eq!(decoded, key);
    }
}

#[test]
fn p521_coordinates_keep_their_full_width() {
    let (private, _) = p521_keypair();
    match &private.params {
        KeyParams::Ec2 { x, y, d, .. } => {
            assert_eq!(x.len(), 66);
            assert_eq!(y.len(), 66);
            assert_eq!(d.as_ref().unwrap().len(), 66);
        }
        other => panic!("unexpected params: {other:?}"),
    }
    let decoded = decode_key(&encode_key(&private)).unwrap();
    assert_eq!(decoded, private);
}

#[test]
fn malformed_keys_are_rejected() {
    // Missing kty: {2: h'31'}
    assert!(matches!(
        decode_key(&[0xa1, 0x02, 0x41, 0x31]),
        Err(CoseError::InvalidKeyFormat(_))
    ));

    // Curve/key-type mismatch at construction.
    assert!(CoseKey::okp(Curve::P256, vec![0; 32], None).is_err());
    assert!(CoseKey::ec2(Curve::X25519, vec![0; 32], vec![0; 32], None).is_err());

    // Coordinate length must match the curve exactly.
    assert!(CoseKey::okp(Curve::Ed448, vec![0; 56], None).is_err());
}

#[test]
fn key_ops_default_from_the_bound_algorithm() {
    let key = CoseKey::symmetric(vec![1; 16])
        .unwrap()
        .with_alg(CoseAlgorithm::A128KW);
    assert_eq!(
        key.key_ops,
        vec![KeyOperation::WrapKey, KeyOperation::UnwrapKey]
    );

    // Explicit ops are not overridden.
    let key = CoseKey::symmetric(vec![1; 16])
        .unwrap()
        .with_key_ops(vec![KeyOperation::WrapKey])
        .with_alg(CoseAlgorithm::A128KW);
    assert_eq!(key.key_ops, vec![KeyOperation::WrapKey]);
    assert!(matches!(
        key.check(KeyOperation::UnwrapKey, CoseAlgorithm::A128KW),
        Err(CoseError::InvalidKey(_))
    ));
}
