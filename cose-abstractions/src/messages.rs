// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE message structures.
//!
//! The six message variants share the same layered shape: a protected header
//! bucket (serialized as a bstr), an unprotected header bucket (an inline
//! map), a payload or ciphertext, and variant-specific trailing fields.
//! `external_aad`, plaintext, and key material never appear on the wire.

use crate::header_map::CoseHeaderMap;
use crate::keys::CoseKey;

/// Standard CBOR tag numbers for the COSE message family.
pub const COSE_ENCRYPT0_TAG: u64 = 16;
pub const COSE_MAC0_TAG: u64 = 17;
pub const COSE_SIGN1_TAG: u64 = 18;
pub const COSE_ENCRYPT_TAG: u64 = 96;
pub const COSE_MAC_TAG: u64 = 97;
pub const COSE_SIGN_TAG: u64 = 98;

/// Context strings for Sig_structure.
pub const SIG_CONTEXT_SIGNATURE: &str = "Signature";
pub const SIG_CONTEXT_SIGNATURE1: &str = "Signature1";

/// Context strings for MAC_structure.
pub const MAC_CONTEXT_MAC: &str = "MAC";
pub const MAC_CONTEXT_MAC0: &str = "MAC0";

/// Context strings for Enc_structure.
pub const ENC_CONTEXT_ENCRYPT: &str = "Encrypt";
pub const ENC_CONTEXT_ENCRYPT0: &str = "Encrypt0";
pub const ENC_CONTEXT_ENC_RECIPIENT: &str = "Enc_Recipient";
pub const ENC_CONTEXT_MAC_RECIPIENT: &str = "Mac_Recipient";
pub const ENC_CONTEXT_REC_RECIPIENT: &str = "Rec_Recipient";

/// A single-signer signed message.
///
/// Wire form: `[ protected : bstr, unprotected : map,
/// payload : bstr / null, signature : bstr ]`, tag 18.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseSign1 {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    /// Embedded payload; `None` represents detached content (`null`).
    pub payload: Option<Vec<u8>>,
    /// Externally supplied AAD, bound by the signature but not transported.
    pub external_aad: Vec<u8>,
    pub signature: Vec<u8>,
}

/// One signer entry of a [`CoseSign`] message.
///
/// Wire form: `[ protected : bstr, unprotected : map, signature : bstr ]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseSignature {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    pub signature: Vec<u8>,
}

/// A multi-signer signed message.
///
/// Wire form: `[ protected, unprotected, payload, [+ COSE_Signature] ]`,
/// tag 98.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseSign {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    pub payload: Option<Vec<u8>>,
    pub external_aad: Vec<u8>,
    pub signatures: Vec<CoseSignature>,
}

/// A MACed message without recipient structure.
///
/// Wire form: `[ protected, unprotected, payload, tag : bstr ]`, tag 17.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseMac0 {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    pub payload: Option<Vec<u8>>,
    pub external_aad: Vec<u8>,
    pub tag: Vec<u8>,
}

/// A MACed message with recipients.
///
/// Wire form: `[ protected, unprotected, payload, tag, [+ COSE_recipient] ]`,
/// tag 97.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseMac {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    pub payload: Option<Vec<u8>>,
    pub external_aad: Vec<u8>,
    pub tag: Vec<u8>,
    pub recipients: Vec<CoseRecipient>,
}

/// An encrypted message without recipient structure.
///
/// Wire form: `[ protected, unprotected, ciphertext : bstr / null ]`, tag 16.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseEncrypt0 {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    /// Plaintext staged for encryption; never serialized.
    pub plaintext: Option<Vec<u8>>,
    /// Ciphertext with the AEAD tag appended; `None` means detached.
    pub ciphertext: Option<Vec<u8>>,
    pub external_aad: Vec<u8>,
}

/// An encrypted message with recipients.
///
/// Wire form: `[ protected, unprotected, ciphertext, [+ COSE_recipient] ]`,
/// tag 96.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseEncrypt {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    pub plaintext: Option<Vec<u8>>,
    pub ciphertext: Option<Vec<u8>>,
    pub external_aad: Vec<u8>,
    pub recipients: Vec<CoseRecipient>,
}

/// One node of the recipient tree.
///
/// Wire form: `[ protected, unprotected, ciphertext : bstr,
/// ? [+ COSE_recipient] ]`. The `key`/`peer_key` fields hold caller-supplied
/// key material for the CEK protocols and never appear on the wire.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoseRecipient {
    pub protected: CoseHeaderMap,
    pub unprotected: CoseHeaderMap,
    /// Encrypted (wrapped) key material; empty for direct methods.
    pub ciphertext: Vec<u8>,
    /// Nested recipients carrying this node's key encryption key.
    pub recipients: Vec<CoseRecipient>,
    /// This party's key: the shared secret, KEK, or ECDH private key.
    pub key: Option<CoseKey>,
    /// The other party's public key for key agreement.
    pub peer_key: Option<CoseKey>,
}

/// The COSE message family, as produced by tag dispatch on decode.
#[derive(Debug, Clone, PartialEq)]
pub enum CoseMessage {
    Sign1(CoseSign1),
    Sign(CoseSign),
    Mac0(CoseMac0),
    Mac(CoseMac),
    Encrypt0(CoseEncrypt0),
    Encrypt(CoseEncrypt),
}

/// Discriminant for [`CoseMessage`], used as the decode hint for untagged
/// input.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Sign1,
    Sign,
    Mac0,
    Mac,
    Encrypt0,
    Encrypt,
}

impl MessageKind {
    /// The CBOR tag assigned to this variant.
    pub fn tag(self) -> u64 {
        match self {
            MessageKind::Encrypt0 => COSE_ENCRYPT0_TAG,
            MessageKind::Mac0 => COSE_MAC0_TAG,
            MessageKind::Sign1 => COSE_SIGN1_TAG,
            MessageKind::Encrypt => COSE_ENCRYPT_TAG,
            MessageKind::Mac => COSE_MAC_TAG,
            MessageKind::Sign => COSE_SIGN_TAG,
        }
    }

    /// The top-level array length for this variant.
    pub fn array_len(self) -> u64 {
        match self {
            MessageKind::Encrypt0 => 3,
            MessageKind::Sign1 | MessageKind::Mac0 | MessageKind::Encrypt | MessageKind::Sign => 4,
            MessageKind::Mac => 5,
        }
    }
}

impl CoseMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            CoseMessage::Sign1(_) => MessageKind::Sign1,
            CoseMessage::Sign(_) => MessageKind::Sign,
            CoseMessage::Mac0(_) => MessageKind::Mac0,
            CoseMessage::Mac(_) => MessageKind::Mac,
            CoseMessage::Encrypt0(_) => MessageKind::Encrypt0,
            CoseMessage::Encrypt(_) => MessageKind::Encrypt,
        }
    }
}
