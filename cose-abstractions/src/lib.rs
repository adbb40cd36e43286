// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared datatypes for the COSE engine crates.
//!
//! This crate exists to prevent circular dependencies across:
//! - the CBOR codec layer (`cose-common`)
//! - the primitive adapters (`cose-crypto`)
//! - the high-level facade (`cose`)
//!
//! It is intentionally free of CBOR and cryptography: errors, the header
//! map model, the algorithm and header-parameter registries, the key model,
//! and the message structures live here.

pub mod algorithms;
pub mod error;
pub mod header_map;
pub mod header_params;
pub mod keys;
pub mod messages;

pub use algorithms::{AlgorithmKind, CoseAlgorithm};
pub use error::CoseError;
pub use header_map::{CoseHeaderMap, HeaderKey, HeaderValue};
pub use keys::{CoseKey, Curve, KeyOperation, KeyParams, KeyType};
pub use messages::{
    CoseEncrypt, CoseEncrypt0, CoseMac, CoseMac0, CoseMessage, CoseRecipient, CoseSign,
    CoseSign1, CoseSignature, MessageKind, COSE_ENCRYPT0_TAG, COSE_ENCRYPT_TAG, COSE_MAC0_TAG,
    COSE_MAC_TAG, COSE_SIGN1_TAG, COSE_SIGN_TAG, ENC_CONTEXT_ENCRYPT, ENC_CONTEXT_ENCRYPT0,
    ENC_CONTEXT_ENC_RECIPIENT, ENC_CONTEXT_MAC_RECIPIENT, ENC_CONTEXT_REC_RECIPIENT,
    MAC_CONTEXT_MAC, MAC_CONTEXT_MAC0, SIG_CONTEXT_SIGNATURE, SIG_CONTEXT_SIGNATURE1,
};
