// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error taxonomy for the COSE engine.
//!
//! Every fallible operation across the workspace returns one of these kinds.
//! Structural failures carry a specific lowercase message; cryptographic
//! verification failures deliberately carry none.

/// Failures that can occur while building, encoding, decoding, or
/// cryptographically processing COSE messages and keys.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CoseError {
    /// The `alg` header is missing, malformed, or unsupported for the
    /// attempted operation.
    #[error("invalid algorithm: {0}")]
    InvalidAlgorithm(String),

    /// An integer algorithm identifier is not in the registry.
    #[error("unknown algorithm identifier: {0}")]
    UnknownAlgorithm(i64),

    /// The key's type, curve, algorithm binding, or permitted operations are
    /// incompatible with the attempted use.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A key failed structural validation (missing field, bad length).
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),

    /// A header bucket violated an invariant (duplicate across buckets,
    /// IV and partial IV both present, wrong value type for a known label).
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// The `crit` header lists an attribute that is absent from the
    /// protected bucket or not understood by this implementation.
    #[error("invalid critical value: {0}")]
    InvalidCriticalValue(String),

    /// The CBOR shape of a message is wrong (array length, tag, item types).
    #[error("malformed message: {0}")]
    MalformedMessage(String),

    /// A recipient's algorithm does not resolve to a known content key
    /// distribution method, or the recipient set mixes incompatible methods.
    #[error("unsupported recipient: {0}")]
    UnsupportedRecipient(String),

    /// AEAD authentication or key unwrap failed.
    #[error("decryption failed")]
    DecryptionFailure,

    /// A signature or MAC tag did not verify.
    #[error("verification failed")]
    VerificationFailure,

    /// An underlying cryptographic primitive or the random source failed.
    #[error("crypto backend error: {0}")]
    CryptoBackend(String),

    /// An unknown header attribute was encountered while strict decoding
    /// was requested.
    #[error("unknown attribute: {0}")]
    UnknownAttribute(String),
}
