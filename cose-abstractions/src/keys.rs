// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE key model.
//!
//! A [`CoseKey`] is one of four typed variants (symmetric, EC2, OKP, RSA)
//! plus the common attributes shared by all of them. Construction validates
//! the per-variant required parameters; [`CoseKey::check`] enforces the
//! key/algorithm/operation compatibility rules at use time.

use crate::algorithms::{AlgorithmKind, CoseAlgorithm};
use crate::error::CoseError;

/// COSE key types (IANA COSE Key Types registry, label `kty` = 1).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum KeyType {
    /// Octet key pair (Ed25519/Ed448/X25519/X448).
    Okp = 1,
    /// Double-coordinate elliptic curve key.
    Ec2 = 2,
    /// RSA key.
    Rsa = 3,
    /// Symmetric key.
    Symmetric = 4,
}

impl KeyType {
    pub fn from_id(id: i64) -> Result<Self, CoseError> {
        match id {
            1 => Ok(KeyType::Okp),
            2 => Ok(KeyType::Ec2),
            3 => Ok(KeyType::Rsa),
            4 => Ok(KeyType::Symmetric),
            other => Err(CoseError::InvalidKeyFormat(format!(
                "unknown key type: {other}"
            ))),
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }
}

/// COSE elliptic curves (IANA COSE Elliptic Curves registry).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum Curve {
    P256 = 1,
    P384 = 2,
    P521 = 3,
    X25519 = 4,
    X448 = 5,
    Ed25519 = 6,
    Ed448 = 7,
    Secp256k1 = 8,
}

impl Curve {
    pub fn from_id(id: i64) -> Result<Self, CoseError> {
        match id {
            1 => Ok(Curve::P256),
            2 => Ok(Curve::P384),
            3 => Ok(Curve::P521),
            4 => Ok(Curve::X25519),
            5 => Ok(Curve::X448),
            6 => Ok(Curve::Ed25519),
            7 => Ok(Curve::Ed448),
            8 => Ok(Curve::Secp256k1),
            other => Err(CoseError::InvalidKeyFormat(format!(
                "unknown curve: {other}"
            ))),
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }

    /// Fixed field-element length in bytes for coordinates and scalars.
    pub fn coordinate_length(self) -> usize {
        match self {
            Curve::P256 | Curve::Secp256k1 => 32,
            Curve::P384 => 48,
            Curve::P521 => 66,
            Curve::X25519 | Curve::Ed25519 => 32,
            Curve::X448 | Curve::Ed448 => 57,
        }
    }

    /// Whether this curve belongs to the EC2 key type.
    pub fn is_ec2(self) -> bool {
        matches!(
            self,
            Curve::P256 | Curve::P384 | Curve::P521 | Curve::Secp256k1
        )
    }

    /// Whether this curve belongs to the OKP key type.
    pub fn is_okp(self) -> bool {
        !self.is_ec2()
    }
}

/// Permitted key operations (`key_ops`, label 4).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum KeyOperation {
    Sign = 1,
    Verify = 2,
    Encrypt = 3,
    Decrypt = 4,
    WrapKey = 5,
    UnwrapKey = 6,
    DeriveKey = 7,
    DeriveBits = 8,
    MacCreate = 9,
    MacVerify = 10,
}

impl KeyOperation {
    pub fn from_id(id: i64) -> Result<Self, CoseError> {
        match id {
            1 => Ok(KeyOperation::Sign),
            2 => Ok(KeyOperation::Verify),
            3 => Ok(KeyOperation::Encrypt),
            4 => Ok(KeyOperation::Decrypt),
            5 => Ok(KeyOperation::WrapKey),
            6 => Ok(KeyOperation::UnwrapKey),
            7 => Ok(KeyOperation::DeriveKey),
            8 => Ok(KeyOperation::DeriveBits),
            9 => Ok(KeyOperation::MacCreate),
            10 => Ok(KeyOperation::MacVerify),
            other => Err(CoseError::InvalidKeyFormat(format!(
                "unknown key operation: {other}"
            ))),
        }
    }

    pub fn id(self) -> i64 {
        self as i64
    }
}

/// Variant-specific key material.
///
/// Big-integer RSA fields hold minimal-length unsigned big-endian bytes;
/// field-element coordinates hold fixed-length bytes per curve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyParams {
    Symmetric {
        k: Vec<u8>,
    },
    Ec2 {
        crv: Curve,
        x: Vec<u8>,
        y: Vec<u8>,
        d: Option<Vec<u8>>,
    },
    Okp {
        crv: Curve,
        x: Vec<u8>,
        d: Option<Vec<u8>>,
    },
    Rsa {
        n: Vec<u8>,
        e: Vec<u8>,
        d: Option<Vec<u8>>,
        p: Option<Vec<u8>>,
        q: Option<Vec<u8>>,
        dp: Option<Vec<u8>>,
        dq: Option<Vec<u8>>,
        qinv: Option<Vec<u8>>,
    },
}

/// A COSE key: typed parameters plus the common attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoseKey {
    pub params: KeyParams,
    /// Key identifier hint (label 2). Opaque, not cryptographically bound.
    pub kid: Option<Vec<u8>>,
    /// Algorithm this key is restricted to (label 3).
    pub alg: Option<CoseAlgorithm>,
    /// Permitted operations (label 4). Empty means unrestricted.
    pub key_ops: Vec<KeyOperation>,
    /// Base IV for partial-IV nonce construction (label 5).
    pub base_iv: Option<Vec<u8>>,
}

impl CoseKey {
    fn from_params(params: KeyParams) -> Self {
        Self {
            params,
            kid: None,
            alg: None,
            key_ops: Vec::new(),
            base_iv: None,
        }
    }

    /// Build a symmetric key from raw key bytes.
    pub fn symmetric(k: Vec<u8>) -> Result<Self, CoseError> {
        if k.is_empty() {
            return Err(CoseError::InvalidKeyFormat(
                "symmetric key material is empty".to_string(),
            ));
        }
        Ok(Self::from_params(KeyParams::Symmetric { k }))
    }

    /// Build an EC2 key from curve coordinates and an optional private scalar.
    ///
    /// Coordinate and scalar lengths must match the curve's field size
    /// exactly (leading zeros preserved).
    pub fn ec2(crv: Curve, x: Vec<u8>, y: Vec<u8>, d: Option<Vec<u8>>) -> Result<Self, CoseError> {
        if !crv.is_ec2() {
            return Err(CoseError::InvalidKeyFormat(format!(
                "curve {:?} is not valid for EC2 keys",
                crv
            )));
        }
        let len = crv.coordinate_length();
        for (name, field) in [("x", Some(&x)), ("y", Some(&y)), ("d", d.as_ref())] {
            if let Some(bytes) = field {
                if bytes.len() != len {
                    return Err(CoseError::InvalidKeyFormat(format!(
                        "EC2 {name} has length {}, expected {len}",
                        bytes.len()
                    )));
                }
            }
        }
        Ok(Self::from_params(KeyParams::Ec2 { crv, x, y, d }))
    }

    /// Build an OKP key from a public coordinate and an optional private key.
    pub fn okp(crv: Curve, x: Vec<u8>, d: Option<Vec<u8>>) -> Result<Self, CoseError> {
        if !crv.is_okp() {
            return Err(CoseError::InvalidKeyFormat(format!(
                "curve {:?} is not valid for OKP keys",
                crv
            )));
        }
        let len = crv.coordinate_length();
        for (name, field) in [("x", Some(&x)), ("d", d.as_ref())] {
            if let Some(bytes) = field {
                if bytes.len() != len {
                    return Err(CoseError::InvalidKeyFormat(format!(
                        "OKP {name} has length {}, expected {len}",
                        bytes.len()
                    )));
                }
            }
        }
        Ok(Self::from_params(KeyParams::Okp { crv, x, d }))
    }

    /// Build an RSA public key from modulus and exponent.
    pub fn rsa(n: Vec<u8>, e: Vec<u8>) -> Result<Self, CoseError> {
        if n.is_empty() || e.is_empty() {
            return Err(CoseError::InvalidKeyFormat(
                "RSA modulus and exponent are required".to_string(),
            ));
        }
        Ok(Self::from_params(KeyParams::Rsa {
            n,
            e,
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qinv: None,
        }))
    }

    /// Build an RSA private key with CRT components.
    #[allow(clippy::too_many_arguments)]
    pub fn rsa_private(
        n: Vec<u8>,
        e: Vec<u8>,
        d: Vec<u8>,
        p: Vec<u8>,
        q: Vec<u8>,
        dp: Option<Vec<u8>>,
        dq: Option<Vec<u8>>,
        qinv: Option<Vec<u8>>,
    ) -> Result<Self, CoseError> {
        if n.is_empty() || e.is_empty() || d.is_empty() || p.is_empty() || q.is_empty() {
            return Err(CoseError::InvalidKeyFormat(
                "RSA private key requires n, e, d, p, and q".to_string(),
            ));
        }
        Ok(Self::from_params(KeyParams::Rsa {
            n,
            e,
            d: Some(d),
            p: Some(p),
            q: Some(q),
            dp,
            dq,
            qinv,
        }))
    }

    /// Set the key identifier.
    pub fn with_kid(mut self, kid: Vec<u8>) -> Self {
        self.kid = Some(kid);
        self
    }

    /// Bind the key to an algorithm.
    ///
    /// When no explicit `key_ops` are set, the algorithm's natural operation
    /// set is filled in.
    pub fn with_alg(mut self, alg: CoseAlgorithm) -> Self {
        self.alg = Some(alg);
        if self.key_ops.is_empty() {
            self.key_ops = alg.default_key_ops().to_vec();
        }
        self
    }

    /// Restrict the key to an explicit operation set.
    pub fn with_key_ops(mut self, ops: Vec<KeyOperation>) -> Self {
        self.key_ops = ops;
        self
    }

    /// Set the base IV used for partial-IV nonce construction.
    pub fn with_base_iv(mut self, base_iv: Vec<u8>) -> Self {
        self.base_iv = Some(base_iv);
        self
    }

    /// The key type of this key's variant.
    pub fn kty(&self) -> KeyType {
        match self.params {
            KeyParams::Symmetric { .. } => KeyType::Symmetric,
            KeyParams::Ec2 { .. } => KeyType::Ec2,
            KeyParams::Okp { .. } => KeyType::Okp,
            KeyParams::Rsa { .. } => KeyType::Rsa,
        }
    }

    /// The curve for EC2/OKP keys.
    pub fn curve(&self) -> Option<Curve> {
        match self.params {
            KeyParams::Ec2 { crv, .. } | KeyParams::Okp { crv, .. } => Some(crv),
            _ => None,
        }
    }

    /// Check that this key may be used for `op` under algorithm `alg`.
    ///
    /// Succeeds iff:
    /// - `key_ops` is empty or contains `op`,
    /// - the key type matches the algorithm's required key type,
    /// - the key's `alg` binding (if any) equals `alg`,
    /// - for curve-constrained algorithms, the key's curve matches.
    pub fn check(&self, op: KeyOperation, alg: CoseAlgorithm) -> Result<(), CoseError> {
        if !self.key_ops.is_empty() && !self.key_ops.contains(&op) {
            return Err(CoseError::InvalidKey(format!(
                "key does not permit operation {:?}",
                op
            )));
        }

        if let Some(required) = alg.key_type() {
            if self.kty() != required {
                return Err(CoseError::InvalidKey(format!(
                    "algorithm {} requires a {:?} key, got {:?}",
                    alg.name(),
                    required,
                    self.kty()
                )));
            }
        }

        if let Some(bound) = self.alg {
            if bound != alg {
                return Err(CoseError::InvalidKey(format!(
                    "key is bound to algorithm {}, not {}",
                    bound.name(),
                    alg.name()
                )));
            }
        }

        if let Some(required_crv) = alg.curve() {
            match self.curve() {
                Some(crv) if crv == required_crv => {}
                other => {
                    return Err(CoseError::InvalidKey(format!(
                        "algorithm {} requires curve {:?}, got {:?}",
                        alg.name(),
                        required_crv,
                        other
                    )));
                }
            }
        }

        // EdDSA accepts either Edwards curve; agreement algorithms accept any
        // ECDH-capable curve. Both are narrowed further by the primitive
        // adapters, which know which curves the backend implements.
        if alg == CoseAlgorithm::EdDSA {
            match self.curve() {
                Some(Curve::Ed25519) | Some(Curve::Ed448) => {}
                other => {
                    return Err(CoseError::InvalidKey(format!(
                        "EdDSA requires Ed25519 or Ed448, got {:?}",
                        other
                    )));
                }
            }
        }
        if matches!(
            alg.kind(),
            AlgorithmKind::DirectKeyAgreement | AlgorithmKind::KeyAgreementWithKeyWrap
        ) {
            match self.curve() {
                Some(crv) if !matches!(crv, Curve::Ed25519 | Curve::Ed448) => {}
                other => {
                    return Err(CoseError::InvalidKey(format!(
                        "algorithm {} requires a key agreement curve, got {:?}",
                        alg.name(),
                        other
                    )));
                }
            }
        }

        Ok(())
    }
}
