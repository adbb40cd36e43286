// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE header parameter registry (IANA COSE Header Parameters registry).
//!
//! Integer labels for the parameters this implementation understands, plus
//! the value shape the codec enforces for each. Unknown labels are carried
//! opaquely and round-trip unchanged.

use crate::header_map::HeaderKey;

/// Algorithm identifier.
pub const ALG: i64 = 1;
/// Critical headers list.
pub const CRIT: i64 = 2;
/// Content type of the payload.
pub const CONTENT_TYPE: i64 = 3;
/// Key identifier.
pub const KID: i64 = 4;
/// Full initialization vector.
pub const IV: i64 = 5;
/// Partial initialization vector.
pub const PARTIAL_IV: i64 = 6;
/// Counter signature (carried opaquely).
pub const COUNTER_SIGNATURE: i64 = 7;
/// X.509 certificate chain (carried opaquely).
pub const X5CHAIN: i64 = 33;

// Key agreement parameters (RFC 8152 table 15, negative label space).
/// Sender's ephemeral public key.
pub const EPHEMERAL_KEY: i64 = -1;
/// Sender's static public key.
pub const STATIC_KEY: i64 = -2;
/// Identifier of the sender's static public key.
pub const STATIC_KEY_ID: i64 = -3;

// HKDF context parameters (RFC 8152 table 13).
pub const SALT: i64 = -20;
pub const PARTY_U_IDENTITY: i64 = -21;
pub const PARTY_U_NONCE: i64 = -22;
pub const PARTY_U_OTHER: i64 = -23;
pub const PARTY_V_IDENTITY: i64 = -24;
pub const PARTY_V_NONCE: i64 = -25;
pub const PARTY_V_OTHER: i64 = -26;

/// The value shape the codec enforces for a known label.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AttrKind {
    /// Must resolve against the algorithm registry.
    Alg,
    /// Must be a non-empty array of labels.
    Labels,
    /// Must be a byte string.
    Bytes,
    /// Byte string, text string, or integer (party info / content type).
    BytesTextOrInt,
    /// Must decode as a COSE key map.
    Key,
    /// Any CBOR value, carried opaquely.
    Raw,
}

/// The expected value shape for an integer label, or `None` if the label is
/// not in the registry.
pub fn expected(label: i64) -> Option<AttrKind> {
    match label {
        ALG => Some(AttrKind::Alg),
        CRIT => Some(AttrKind::Labels),
        CONTENT_TYPE => Some(AttrKind::BytesTextOrInt),
        KID | IV | PARTIAL_IV | SALT => Some(AttrKind::Bytes),
        PARTY_U_IDENTITY | PARTY_U_NONCE | PARTY_U_OTHER | PARTY_V_IDENTITY | PARTY_V_NONCE
        | PARTY_V_OTHER => Some(AttrKind::BytesTextOrInt),
        EPHEMERAL_KEY | STATIC_KEY => Some(AttrKind::Key),
        STATIC_KEY_ID => Some(AttrKind::Bytes),
        COUNTER_SIGNATURE | X5CHAIN => Some(AttrKind::Raw),
        _ => None,
    }
}

/// The registry name for an integer label, if known.
pub fn label_name(label: i64) -> Option<&'static str> {
    match label {
        ALG => Some("alg"),
        CRIT => Some("crit"),
        CONTENT_TYPE => Some("content type"),
        KID => Some("kid"),
        IV => Some("IV"),
        PARTIAL_IV => Some("Partial IV"),
        COUNTER_SIGNATURE => Some("counter signature"),
        X5CHAIN => Some("x5chain"),
        EPHEMERAL_KEY => Some("ephemeral key"),
        STATIC_KEY => Some("static key"),
        STATIC_KEY_ID => Some("static key id"),
        SALT => Some("salt"),
        PARTY_U_IDENTITY => Some("PartyU identity"),
        PARTY_U_NONCE => Some("PartyU nonce"),
        PARTY_U_OTHER => Some("PartyU other"),
        PARTY_V_IDENTITY => Some("PartyV identity"),
        PARTY_V_NONCE => Some("PartyV nonce"),
        PARTY_V_OTHER => Some("PartyV other"),
        _ => None,
    }
}

/// Whether a label listed in `crit` is understood by this implementation.
pub fn is_understood(key: &HeaderKey) -> bool {
    match key {
        HeaderKey::Int(label) => expected(*label).is_some(),
        HeaderKey::Text(_) => false,
    }
}
