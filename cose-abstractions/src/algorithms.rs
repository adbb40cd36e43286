// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE algorithm registry (IANA COSE Algorithms registry).
//!
//! The registry is closed: identifiers resolve through [`CoseAlgorithm::from_id`]
//! or [`CoseAlgorithm::from_name`] and unknown values fail. Each algorithm
//! carries a small descriptor surface (kind, key/nonce/tag lengths, curve
//! constraint) consumed by the codec and the primitive adapters.

use crate::error::CoseError;
use crate::keys::{Curve, KeyOperation, KeyType};

/// What an algorithm does, which determines how it is dispatched.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AlgorithmKind {
    /// Digital signature over a Sig_structure.
    Signature,
    /// Message authentication code over a MAC_structure.
    Mac,
    /// Authenticated encryption over an Enc_structure.
    Aead,
    /// AES key wrap of a content encryption key.
    KeyWrap,
    /// RSA-OAEP key transport of a content encryption key.
    KeyTransport,
    /// The recipient's symmetric key is the CEK.
    Direct,
    /// The CEK is derived from the recipient's symmetric key with HKDF.
    DirectKdf,
    /// The CEK is derived from an ECDH shared secret with HKDF.
    DirectKeyAgreement,
    /// A key-encryption key is derived from ECDH + HKDF, then wraps the CEK.
    KeyAgreementWithKeyWrap,
}

/// Supported COSE algorithms.
///
/// Discriminants are the IANA registry values; variant names follow the
/// registry spelling.
#[allow(non_camel_case_types)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(i64)]
pub enum CoseAlgorithm {
    // Signatures.
    /// ECDSA w/ SHA-256 over P-256.
    ES256 = -7,
    /// ECDSA w/ SHA-384 over P-384.
    ES384 = -35,
    /// ECDSA w/ SHA-512 over P-521.
    ES512 = -36,
    /// ECDSA w/ SHA-256 over secp256k1.
    ES256K = -47,
    /// EdDSA (Ed25519/Ed448, pure mode).
    EdDSA = -8,
    /// RSASSA-PSS w/ SHA-256.
    PS256 = -37,
    /// RSASSA-PSS w/ SHA-384.
    PS384 = -38,
    /// RSASSA-PSS w/ SHA-512.
    PS512 = -39,
    /// RSASSA-PKCS1-v1_5 w/ SHA-1 (legacy).
    RS1 = -65535,
    /// RSASSA-PKCS1-v1_5 w/ SHA-256.
    RS256 = -257,
    /// RSASSA-PKCS1-v1_5 w/ SHA-384.
    RS384 = -258,
    /// RSASSA-PKCS1-v1_5 w/ SHA-512.
    RS512 = -259,

    // MACs.
    /// HMAC-SHA-256 truncated to 64 bits.
    HMAC_256_64 = 4,
    /// HMAC-SHA-256.
    HMAC_256_256 = 5,
    /// HMAC-SHA-384.
    HMAC_384_384 = 6,
    /// HMAC-SHA-512.
    HMAC_512_512 = 7,
    /// AES-CBC-MAC, 128-bit key, 64-bit tag.
    AES_MAC_128_64 = 14,
    /// AES-CBC-MAC, 256-bit key, 64-bit tag.
    AES_MAC_256_64 = 15,
    /// AES-CBC-MAC, 128-bit key, 128-bit tag.
    AES_MAC_128_128 = 25,
    /// AES-CBC-MAC, 256-bit key, 128-bit tag.
    AES_MAC_256_128 = 26,

    // AEADs.
    /// AES-GCM, 128-bit key.
    A128GCM = 1,
    /// AES-GCM, 192-bit key.
    A192GCM = 2,
    /// AES-GCM, 256-bit key.
    A256GCM = 3,
    /// ChaCha20-Poly1305.
    ChaCha20Poly1305 = 24,
    /// AES-CCM, 13-byte nonce, 64-bit tag, 128-bit key.
    AES_CCM_16_64_128 = 10,
    /// AES-CCM, 13-byte nonce, 64-bit tag, 256-bit key.
    AES_CCM_16_64_256 = 11,
    /// AES-CCM, 7-byte nonce, 64-bit tag, 128-bit key.
    AES_CCM_64_64_128 = 12,
    /// AES-CCM, 7-byte nonce, 64-bit tag, 256-bit key.
    AES_CCM_64_64_256 = 13,
    /// AES-CCM, 13-byte nonce, 128-bit tag, 128-bit key.
    AES_CCM_16_128_128 = 30,
    /// AES-CCM, 13-byte nonce, 128-bit tag, 256-bit key.
    AES_CCM_16_128_256 = 31,
    /// AES-CCM, 7-byte nonce, 128-bit tag, 128-bit key.
    AES_CCM_64_128_128 = 32,
    /// AES-CCM, 7-byte nonce, 128-bit tag, 256-bit key.
    AES_CCM_64_128_256 = 33,

    // Content key distribution.
    /// Direct use of the shared symmetric key as the CEK.
    Direct = -6,
    /// CEK derived from the shared key with HKDF-SHA-256.
    Direct_HKDF_SHA_256 = -10,
    /// CEK derived from the shared key with HKDF-SHA-512.
    Direct_HKDF_SHA_512 = -11,
    /// AES key wrap, 128-bit KEK.
    A128KW = -3,
    /// AES key wrap, 192-bit KEK.
    A192KW = -4,
    /// AES key wrap, 256-bit KEK.
    A256KW = -5,
    /// RSAES-OAEP w/ RFC 8017 default parameters (SHA-1).
    RSAES_OAEP_SHA_1 = -40,
    /// RSAES-OAEP w/ SHA-256.
    RSAES_OAEP_SHA_256 = -41,
    /// RSAES-OAEP w/ SHA-512.
    RSAES_OAEP_SHA_512 = -42,
    /// Ephemeral-static ECDH + HKDF-SHA-256, direct CEK.
    ECDH_ES_HKDF_256 = -25,
    /// Ephemeral-static ECDH + HKDF-SHA-512, direct CEK.
    ECDH_ES_HKDF_512 = -26,
    /// Static-static ECDH + HKDF-SHA-256, direct CEK.
    ECDH_SS_HKDF_256 = -27,
    /// Static-static ECDH + HKDF-SHA-512, direct CEK.
    ECDH_SS_HKDF_512 = -28,
    /// Ephemeral-static ECDH + HKDF, then A128KW.
    ECDH_ES_A128KW = -29,
    /// Ephemeral-static ECDH + HKDF, then A192KW.
    ECDH_ES_A192KW = -30,
    /// Ephemeral-static ECDH + HKDF, then A256KW.
    ECDH_ES_A256KW = -31,
    /// Static-static ECDH + HKDF, then A128KW.
    ECDH_SS_A128KW = -32,
    /// Static-static ECDH + HKDF, then A192KW.
    ECDH_SS_A192KW = -33,
    /// Static-static ECDH + HKDF, then A256KW.
    ECDH_SS_A256KW = -34,
}

/// Every registered algorithm, used by the lookup functions.
const ALL: &[CoseAlgorithm] = &[
    CoseAlgorithm::ES256,
    CoseAlgorithm::ES384,
    CoseAlgorithm::ES512,
    CoseAlgorithm::ES256K,
    CoseAlgorithm::EdDSA,
    CoseAlgorithm::PS256,
    CoseAlgorithm::PS384,
    CoseAlgorithm::PS512,
    CoseAlgorithm::RS1,
    CoseAlgorithm::RS256,
    CoseAlgorithm::RS384,
    CoseAlgorithm::RS512,
    CoseAlgorithm::HMAC_256_64,
    CoseAlgorithm::HMAC_256_256,
    CoseAlgorithm::HMAC_384_384,
    CoseAlgorithm::HMAC_512_512,
    CoseAlgorithm::AES_MAC_128_64,
    CoseAlgorithm::AES_MAC_256_64,
    CoseAlgorithm::AES_MAC_128_128,
    CoseAlgorithm::AES_MAC_256_128,
    CoseAlgorithm::A128GCM,
    CoseAlgorithm::A192GCM,
    CoseAlgorithm::A256GCM,
    CoseAlgorithm::ChaCha20Poly1305,
    CoseAlgorithm::AES_CCM_16_64_128,
    CoseAlgorithm::AES_CCM_16_64_256,
    CoseAlgorithm::AES_CCM_64_64_128,
    CoseAlgorithm::AES_CCM_64_64_256,
    CoseAlgorithm::AES_CCM_16_128_128,
    CoseAlgorithm::AES_CCM_16_128_256,
    CoseAlgorithm::AES_CCM_64_128_128,
    CoseAlgorithm::AES_CCM_64_128_256,
    CoseAlgorithm::Direct,
    CoseAlgorithm::Direct_HKDF_SHA_256,
    CoseAlgorithm::Direct_HKDF_SHA_512,
    CoseAlgorithm::A128KW,
    CoseAlgorithm::A192KW,
    CoseAlgorithm::A256KW,
    CoseAlgorithm::RSAES_OAEP_SHA_1,
    CoseAlgorithm::RSAES_OAEP_SHA_256,
    CoseAlgorithm::RSAES_OAEP_SHA_512,
    CoseAlgorithm::ECDH_ES_HKDF_256,
    CoseAlgorithm::ECDH_ES_HKDF_512,
    CoseAlgorithm::ECDH_SS_HKDF_256,
    CoseAlgorithm::ECDH_SS_HKDF_512,
    CoseAlgorithm::ECDH_ES_A128KW,
    CoseAlgorithm::ECDH_ES_A192KW,
    CoseAlgorithm::ECDH_ES_A256KW,
    CoseAlgorithm::ECDH_SS_A128KW,
    CoseAlgorithm::ECDH_SS_A192KW,
    CoseAlgorithm::ECDH_SS_A256KW,
];

impl CoseAlgorithm {
    /// Resolve an integer identifier against the registry.
    pub fn from_id(id: i64) -> Result<Self, CoseError> {
        ALL.iter()
            .copied()
            .find(|a| a.id() == id)
            .ok_or(CoseError::UnknownAlgorithm(id))
    }

    /// Resolve a registry name (e.g. `"ES256"`, `"ECDH-ES + A128KW"`).
    pub fn from_name(name: &str) -> Result<Self, CoseError> {
        ALL.iter()
            .copied()
            .find(|a| a.name() == name)
            .ok_or_else(|| CoseError::InvalidAlgorithm(format!("unknown algorithm name: {name}")))
    }

    /// The IANA registry value.
    pub fn id(self) -> i64 {
        self as i64
    }

    /// The IANA registry name.
    pub fn name(self) -> &'static str {
        match self {
            CoseAlgorithm::ES256 => "ES256",
            CoseAlgorithm::ES384 => "ES384",
            CoseAlgorithm::ES512 => "ES512",
            CoseAlgorithm::ES256K => "ES256K",
            CoseAlgorithm::EdDSA => "EdDSA",
            CoseAlgorithm::PS256 => "PS256",
            CoseAlgorithm::PS384 => "PS384",
            CoseAlgorithm::PS512 => "PS512",
            CoseAlgorithm::RS1 => "RS1",
            CoseAlgorithm::RS256 => "RS256",
            CoseAlgorithm::RS384 => "RS384",
            CoseAlgorithm::RS512 => "RS512",
            CoseAlgorithm::HMAC_256_64 => "HMAC 256/64",
            CoseAlgorithm::HMAC_256_256 => "HMAC 256/256",
            CoseAlgorithm::HMAC_384_384 => "HMAC 384/384",
            CoseAlgorithm::HMAC_512_512 => "HMAC 512/512",
            CoseAlgorithm::AES_MAC_128_64 => "AES-MAC 128/64",
            CoseAlgorithm::AES_MAC_256_64 => "AES-MAC 256/64",
            CoseAlgorithm::AES_MAC_128_128 => "AES-MAC 128/128",
            CoseAlgorithm::AES_MAC_256_128 => "AES-MAC 256/128",
            CoseAlgorithm::A128GCM => "A128GCM",
            CoseAlgorithm::A192GCM => "A192GCM",
            CoseAlgorithm::A256GCM => "A256GCM",
            CoseAlgorithm::ChaCha20Poly1305 => "ChaCha20/Poly1305",
            CoseAlgorithm::AES_CCM_16_64_128 => "AES-CCM-16-64-128",
            CoseAlgorithm::AES_CCM_16_64_256 => "AES-CCM-16-64-256",
            CoseAlgorithm::AES_CCM_64_64_128 => "AES-CCM-64-64-128",
            CoseAlgorithm::AES_CCM_64_64_256 => "AES-CCM-64-64-256",
            CoseAlgorithm::AES_CCM_16_128_128 => "AES-CCM-16-128-128",
            CoseAlgorithm::AES_CCM_16_128_256 => "AES-CCM-16-128-256",
            CoseAlgorithm::AES_CCM_64_128_128 => "AES-CCM-64-128-128",
            CoseAlgorithm::AES_CCM_64_128_256 => "AES-CCM-64-128-256",
            CoseAlgorithm::Direct => "direct",
            CoseAlgorithm::Direct_HKDF_SHA_256 => "direct+HKDF-SHA-256",
            CoseAlgorithm::Direct_HKDF_SHA_512 => "direct+HKDF-SHA-512",
            CoseAlgorithm::A128KW => "A128KW",
            CoseAlgorithm::A192KW => "A192KW",
            CoseAlgorithm::A256KW => "A256KW",
            CoseAlgorithm::RSAES_OAEP_SHA_1 => "RSAES-OAEP w/ RFC 8017 default parameters",
            CoseAlgorithm::RSAES_OAEP_SHA_256 => "RSAES-OAEP w/ SHA-256",
            CoseAlgorithm::RSAES_OAEP_SHA_512 => "RSAES-OAEP w/ SHA-512",
            CoseAlgorithm::ECDH_ES_HKDF_256 => "ECDH-ES + HKDF-256",
            CoseAlgorithm::ECDH_ES_HKDF_512 => "ECDH-ES + HKDF-512",
            CoseAlgorithm::ECDH_SS_HKDF_256 => "ECDH-SS + HKDF-256",
            CoseAlgorithm::ECDH_SS_HKDF_512 => "ECDH-SS + HKDF-512",
            CoseAlgorithm::ECDH_ES_A128KW => "ECDH-ES + A128KW",
            CoseAlgorithm::ECDH_ES_A192KW => "ECDH-ES + A192KW",
            CoseAlgorithm::ECDH_ES_A256KW => "ECDH-ES + A256KW",
            CoseAlgorithm::ECDH_SS_A128KW => "ECDH-SS + A128KW",
            CoseAlgorithm::ECDH_SS_A192KW => "ECDH-SS + A192KW",
            CoseAlgorithm::ECDH_SS_A256KW => "ECDH-SS + A256KW",
        }
    }

    /// How this algorithm is dispatched.
    pub fn kind(self) -> AlgorithmKind {
        use CoseAlgorithm::*;
        match self {
            ES256 | ES384 | ES512 | ES256K | EdDSA | PS256 | PS384 | PS512 | RS1 | RS256
            | RS384 | RS512 => AlgorithmKind::Signature,
            HMAC_256_64 | HMAC_256_256 | HMAC_384_384 | HMAC_512_512 | AES_MAC_128_64
            | AES_MAC_256_64 | AES_MAC_128_128 | AES_MAC_256_128 => AlgorithmKind::Mac,
            A128GCM | A192GCM | A256GCM | ChaCha20Poly1305 | AES_CCM_16_64_128
            | AES_CCM_16_64_256 | AES_CCM_64_64_128 | AES_CCM_64_64_256 | AES_CCM_16_128_128
            | AES_CCM_16_128_256 | AES_CCM_64_128_128 | AES_CCM_64_128_256 => AlgorithmKind::Aead,
            A128KW | A192KW | A256KW => AlgorithmKind::KeyWrap,
            RSAES_OAEP_SHA_1 | RSAES_OAEP_SHA_256 | RSAES_OAEP_SHA_512 => {
                AlgorithmKind::KeyTransport
            }
            Direct => AlgorithmKind::Direct,
            Direct_HKDF_SHA_256 | Direct_HKDF_SHA_512 => AlgorithmKind::DirectKdf,
            ECDH_ES_HKDF_256 | ECDH_ES_HKDF_512 | ECDH_SS_HKDF_256 | ECDH_SS_HKDF_512 => {
                AlgorithmKind::DirectKeyAgreement
            }
            ECDH_ES_A128KW | ECDH_ES_A192KW | ECDH_ES_A256KW | ECDH_SS_A128KW | ECDH_SS_A192KW
            | ECDH_SS_A256KW => AlgorithmKind::KeyAgreementWithKeyWrap,
        }
    }

    /// Symmetric key length in bytes, where the algorithm fixes one.
    pub fn key_length(self) -> Option<usize> {
        use CoseAlgorithm::*;
        match self {
            A128GCM | AES_CCM_16_64_128 | AES_CCM_64_64_128 | AES_CCM_16_128_128
            | AES_CCM_64_128_128 | AES_MAC_128_64 | AES_MAC_128_128 | A128KW => Some(16),
            A192GCM | A192KW => Some(24),
            A256GCM | ChaCha20Poly1305 | AES_CCM_16_64_256 | AES_CCM_64_64_256
            | AES_CCM_16_128_256 | AES_CCM_64_128_256 | AES_MAC_256_64 | AES_MAC_256_128
            | A256KW => Some(32),
            HMAC_256_64 | HMAC_256_256 => Some(32),
            HMAC_384_384 => Some(48),
            HMAC_512_512 => Some(64),
            _ => None,
        }
    }

    /// AEAD nonce length in bytes.
    pub fn nonce_length(self) -> Option<usize> {
        use CoseAlgorithm::*;
        match self {
            A128GCM | A192GCM | A256GCM | ChaCha20Poly1305 => Some(12),
            AES_CCM_16_64_128 | AES_CCM_16_64_256 | AES_CCM_16_128_128 | AES_CCM_16_128_256 => {
                Some(13)
            }
            AES_CCM_64_64_128 | AES_CCM_64_64_256 | AES_CCM_64_128_128 | AES_CCM_64_128_256 => {
                Some(7)
            }
            _ => None,
        }
    }

    /// Authentication tag length in bytes (AEAD tag or truncated MAC).
    pub fn tag_length(self) -> Option<usize> {
        use CoseAlgorithm::*;
        match self {
            A128GCM | A192GCM | A256GCM | ChaCha20Poly1305 | AES_CCM_16_128_128
            | AES_CCM_16_128_256 | AES_CCM_64_128_128 | AES_CCM_64_128_256 | AES_MAC_128_128
            | AES_MAC_256_128 => Some(16),
            AES_CCM_16_64_128 | AES_CCM_16_64_256 | AES_CCM_64_64_128 | AES_CCM_64_64_256
            | HMAC_256_64 | AES_MAC_128_64 | AES_MAC_256_64 => Some(8),
            HMAC_256_256 => Some(32),
            HMAC_384_384 => Some(48),
            HMAC_512_512 => Some(64),
            _ => None,
        }
    }

    /// The single curve this algorithm is defined over, if fixed.
    pub fn curve(self) -> Option<Curve> {
        match self {
            CoseAlgorithm::ES256 => Some(Curve::P256),
            CoseAlgorithm::ES384 => Some(Curve::P384),
            CoseAlgorithm::ES512 => Some(Curve::P521),
            CoseAlgorithm::ES256K => Some(Curve::Secp256k1),
            _ => None,
        }
    }

    /// The key type this algorithm requires, if a single one.
    pub fn key_type(self) -> Option<KeyType> {
        use CoseAlgorithm::*;
        match self.kind() {
            AlgorithmKind::Mac | AlgorithmKind::Aead | AlgorithmKind::KeyWrap => {
                Some(KeyType::Symmetric)
            }
            AlgorithmKind::Direct | AlgorithmKind::DirectKdf => Some(KeyType::Symmetric),
            AlgorithmKind::KeyTransport => Some(KeyType::Rsa),
            AlgorithmKind::Signature => match self {
                ES256 | ES384 | ES512 | ES256K => Some(KeyType::Ec2),
                EdDSA => Some(KeyType::Okp),
                _ => Some(KeyType::Rsa),
            },
            // EC2 or OKP, depending on the curve.
            AlgorithmKind::DirectKeyAgreement | AlgorithmKind::KeyAgreementWithKeyWrap => None,
        }
    }

    /// Whether this key agreement algorithm uses an ephemeral sender key.
    pub fn is_ephemeral_static(self) -> bool {
        use CoseAlgorithm::*;
        matches!(
            self,
            ECDH_ES_HKDF_256 | ECDH_ES_HKDF_512 | ECDH_ES_A128KW | ECDH_ES_A192KW
                | ECDH_ES_A256KW
        )
    }

    /// The key wrap algorithm nested inside an ECDH + key wrap algorithm.
    pub fn key_wrap_alg(self) -> Option<CoseAlgorithm> {
        use CoseAlgorithm::*;
        match self {
            ECDH_ES_A128KW | ECDH_SS_A128KW => Some(A128KW),
            ECDH_ES_A192KW | ECDH_SS_A192KW => Some(A192KW),
            ECDH_ES_A256KW | ECDH_SS_A256KW => Some(A256KW),
            _ => None,
        }
    }

    /// The operations a key bound to this algorithm naturally performs.
    pub fn default_key_ops(self) -> &'static [KeyOperation] {
        match self.kind() {
            AlgorithmKind::Signature => &[KeyOperation::Sign, KeyOperation::Verify],
            AlgorithmKind::Mac => &[KeyOperation::MacCreate, KeyOperation::MacVerify],
            AlgorithmKind::Aead | AlgorithmKind::Direct => {
                &[KeyOperation::Encrypt, KeyOperation::Decrypt]
            }
            AlgorithmKind::KeyWrap | AlgorithmKind::KeyTransport => {
                &[KeyOperation::WrapKey, KeyOperation::UnwrapKey]
            }
            AlgorithmKind::DirectKdf
            | AlgorithmKind::DirectKeyAgreement
            | AlgorithmKind::KeyAgreementWithKeyWrap => {
                &[KeyOperation::DeriveKey, KeyOperation::DeriveBits]
            }
        }
    }
}
