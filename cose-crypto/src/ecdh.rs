// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Elliptic curve Diffie-Hellman agreement.
//!
//! Supports P-256, P-384, P-521, and X25519. The shared secret is the raw
//! x-coordinate (NIST curves) or the raw X25519 output, as the COSE HKDF
//! input expects.

use cose_abstractions::{CoseError, CoseKey, Curve};
use elliptic_curve::sec1::FromEncodedPoint as _;
use zeroize::Zeroizing;

use crate::material;

/// Compute the ECDH shared secret between `private` and `public`.
///
/// Both keys must be on the same curve.
pub fn agree(private: &CoseKey, public: &CoseKey) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let private_crv = private.curve().ok_or_else(|| {
        CoseError::InvalidKey("key agreement requires an elliptic curve key".to_string())
    })?;
    let public_crv = public.curve().ok_or_else(|| {
        CoseError::InvalidKey("key agreement requires an elliptic curve key".to_string())
    })?;
    if private_crv != public_crv {
        return Err(CoseError::InvalidKey(format!(
            "curve mismatch: {private_crv:?} vs {public_crv:?}"
        )));
    }

    match private_crv {
        Curve::P256 => agree_p256(private, public),
        Curve::P384 => agree_p384(private, public),
        Curve::P521 => agree_p521(private, public),
        Curve::X25519 => agree_x25519(private, public),
        other => Err(CoseError::InvalidKey(format!(
            "key agreement over {other:?} is not supported by this backend"
        ))),
    }
}

fn agree_p256(private: &CoseKey, public: &CoseKey) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let (_, d) = material::ec2_private(private)?;
    let (_, x, y) = material::ec2_public(public)?;

    let sk = p256::SecretKey::from_slice(d)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-256 private key: {e}")))?;
    let point = p256::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let pk: p256::PublicKey = Option::from(p256::PublicKey::from_encoded_point(&point))
        .ok_or_else(|| CoseError::InvalidKey("P-256 public key is not on the curve".to_string()))?;

    let shared = p256::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

fn agree_p384(private: &CoseKey, public: &CoseKey) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let (_, d) = material::ec2_private(private)?;
    let (_, x, y) = material::ec2_public(public)?;

    let sk = p384::SecretKey::from_slice(d)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-384 private key: {e}")))?;
    let point = p384::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let pk: p384::PublicKey = Option::from(p384::PublicKey::from_encoded_point(&point))
        .ok_or_else(|| CoseError::InvalidKey("P-384 public key is not on the curve".to_string()))?;

    let shared = p384::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

fn agree_p521(private: &CoseKey, public: &CoseKey) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let (_, d) = material::ec2_private(private)?;
    let (_, x, y) = material::ec2_public(public)?;

    let sk = p521::SecretKey::from_slice(d)
        .map_err(|e| CoseError::InvalidKey(format!("bad P-521 private key: {e}")))?;
    let point = p521::EncodedPoint::from_affine_coordinates(x.into(), y.into(), false);
    let pk: p521::PublicKey = Option::from(p521::PublicKey::from_encoded_point(&point))
        .ok_or_else(|| CoseError::InvalidKey("P-521 public key is not on the curve".to_string()))?;

    let shared = p521::ecdh::diffie_hellman(sk.to_nonzero_scalar(), pk.as_affine());
    Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
}

fn agree_x25519(private: &CoseKey, public: &CoseKey) -> Result<Zeroizing<Vec<u8>>, CoseError> {
    let (_, d) = material::okp_private(private)?;
    let (_, x) = material::okp_public(public)?;

    let d: [u8; 32] = d
        .try_into()
        .map_err(|_| CoseError::InvalidKey("bad X25519 private key length".to_string()))?;
    let x: [u8; 32] = x
        .try_into()
        .map_err(|_| CoseError::InvalidKey("bad X25519 public key length".to_string()))?;

    let secret = x25519_dalek::StaticSecret::from(d);
    let peer = x25519_dalek::PublicKey::from(x);
    let shared = secret.diffie_hellman(&peer);
    Ok(Zeroizing::new(shared.as_bytes().to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_core::OsRng;

    fn p256_pair() -> (CoseKey, CoseKey) {
        let sk = p256::SecretKey::random(&mut OsRng);
        let pk = sk.public_key();
        let point = elliptic_curve::sec1::ToEncodedPoint::to_encoded_point(&pk, false);
        let x = point.x().unwrap().to_vec();
        let y = point.y().unwrap().to_vec();
        let d = sk.to_bytes().to_vec();
        let private = CoseKey::ec2(Curve::P256, x.clone(), y.clone(), Some(d)).unwrap();
        let public = CoseKey::ec2(Curve::P256, x, y, None).unwrap();
        (private, public)
    }

    #[test]
    fn p256_agreement_is_symmetric() {
        let (alice_private, alice_public) = p256_pair();
        let (bob_private, bob_public) = p256_pair();

        let ab = agree(&alice_private, &bob_public).unwrap();
        let ba = agree(&bob_private, &alice_public).unwrap();
        assert_eq!(ab.as_slice(), ba.as_slice());
        assert_eq!(ab.len(), 32);
    }

    #[test]
    fn x25519_agreement_is_symmetric() {
        let a = x25519_dalek::StaticSecret::random_from_rng(OsRng);
        let b = x25519_dalek::StaticSecret::random_from_rng(OsRng);
        let a_pub = x25519_dalek::PublicKey::from(&a);
        let b_pub = x25519_dalek::PublicKey::from(&b);

        let a_key = CoseKey::okp(
            Curve::X25519,
            a_pub.as_bytes().to_vec(),
            Some(a.to_bytes().to_vec()),
        )
        .unwrap();
        let b_key = CoseKey::okp(
            Curve::X25519,
            b_pub.as_bytes().to_vec(),
            Some(b.to_bytes().to_vec()),
        )
        .unwrap();

        let ab = agree(&a_key, &b_key).unwrap();
        let ba = agree(&b_key, &a_key).unwrap();
        assert_eq!(ab.as_slice(), ba.as_slice());
    }

    #[test]
    fn mismatched_curves_are_rejected() {
        let (p256_private, _) = p256_pair();
        let okp = CoseKey::okp(Curve::X25519, vec![9u8; 32], None).unwrap();
        assert!(matches!(
            agree(&p256_private, &okp),
            Err(CoseError::InvalidKey(_))
        ));

        // A symmetric key has no curve at all.
        let sym = CoseKey::symmetric(vec![1; 16]).unwrap();
        assert!(matches!(agree(&sym, &okp), Err(CoseError::InvalidKey(_))));
    }
}
