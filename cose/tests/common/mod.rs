// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared helpers for the `cose` integration tests.
//!
//! Key material comes from the RFC 8152 appendix C.7 key set where the
//! tests replay RFC vectors, and from freshly generated curve keys where
//! they only need a valid pair.

#![allow(dead_code)]

use cose::{CoseAlgorithm, CoseKey, Curve, HeaderKey, HeaderValue};
use elliptic_curve::sec1::ToEncodedPoint as _;
use rand_core::OsRng;

pub fn hex_bytes(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap()
}

/// The P-256 key with kid "11" from RFC 8152 C.7.1.
pub fn rfc8152_p256_key() -> CoseKey {
    CoseKey::ec2(
        Curve::P256,
        hex_bytes("bac5b11cad8f99f9c72b05cf4b9e26d244dc189f745228255a219a86d6a09eff"),
        hex_bytes("20138bf82dc1b6d562be0fa54ab7804a3a64b6d72ccfed6b6fb6ed28bbfc117e"),
        Some(hex_bytes(
            "57c92077664146e876760c9520d054aa93c3afb04e306705db6090308507b4d3",
        )),
    )
    .unwrap()
    .with_kid(b"11".to_vec())
}

/// The public half of [`rfc8152_p256_key`].
pub fn rfc8152_p256_public() -> CoseKey {
    let mut key = rfc8152_p256_key();
    match &mut key.params {
        cose::KeyParams::Ec2 { d, .. } => *d = None,
        _ => unreachable!(),
    }
    key
}

/// The 256-bit shared secret with kid "our-secret" from RFC 8152 C.7.3.
pub fn rfc8152_shared_secret() -> CoseKey {
    CoseKey::symmetric(hex_bytes(
        "849b57219dae48de646d07dbb533566e976686457c1491be3a76dcea6c427188",
    ))
    .unwrap()
    .with_kid(b"our-secret".to_vec())
}

/// A freshly generated P-256 key pair as (private, public) COSE keys.
pub fn p256_keypair() -> (CoseKey, CoseKey) {
    let secret = p256::SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);
    let x = point.x().unwrap().to_vec();
    let y = point.y().unwrap().to_vec();
    let d = secret.to_bytes().to_vec();

    let private = CoseKey::ec2(Curve::P256, x.clone(), y.clone(), Some(d)).unwrap();
    let public = CoseKey::ec2(Curve::P256, x, y, None).unwrap();
    (private, public)
}

/// A freshly generated P-521 key pair as (private, public) COSE keys.
pub fn p521_keypair() -> (CoseKey, CoseKey) {
    let secret = p521::SecretKey::random(&mut OsRng);
    let point = secret.public_key().to_encoded_point(false);
    let x = point.x().unwrap().to_vec();
    let y = point.y().unwrap().to_vec();
    let d = secret.to_bytes().to_vec();

    let private = CoseKey::ec2(Curve::P521, x.clone(), y.clone(), Some(d)).unwrap();
    let public = CoseKey::ec2(Curve::P521, x, y, None).unwrap();
    (private, public)
}

/// Shorthand for an integer-labelled attribute pair.
pub fn attr(label: i64, value: HeaderValue) -> (HeaderKey, HeaderValue) {
    (HeaderKey::Int(label), value)
}

/// Shorthand for the `alg` attribute.
pub fn alg_attr(alg: CoseAlgorithm) -> (HeaderKey, HeaderValue) {
    attr(1, HeaderValue::Alg(alg))
}
