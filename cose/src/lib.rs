// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! CBOR Object Signing and Encryption (RFC 8152).
//!
//! This crate is the high-level entry point for the COSE engine:
//! - Build a message, set headers, attach a payload and keys.
//! - Run the operation (`sign`, `verify`, `compute_tag`, `verify_tag`,
//!   `encrypt`, `decrypt`) via the per-variant extension traits.
//! - Serialize with [`encode`]/[`encode_sign1`]/... and parse with
//!   [`decode`], which dispatches on the COSE CBOR tags.
//!
//! Protected header buckets are serialized exactly once: decoding retains
//! the received bytes, and the first cryptographic operation freezes the
//! canonical encoding, so crypto structures and re-encodings always agree.
//!
//! ```no_run
//! use cose::{CoseSign1, CoseSign1Ext, HeaderOps};
//! use cose::{CoseAlgorithm, CoseKey, HeaderKey, HeaderValue};
//!
//! # fn demo(key: CoseKey, mut rng: impl rand_core::CryptoRngCore) -> Result<(), cose::CoseError> {
//! let mut msg = CoseSign1::default();
//! msg.set_protected(
//!     HeaderKey::Int(1),
//!     HeaderValue::Alg(CoseAlgorithm::ES256),
//! )?;
//! msg.payload = Some(b"This is the content.".to_vec());
//! msg.sign(&key, &mut rng)?;
//! let bytes = cose::encode_sign1(&msg, true);
//! # Ok(())
//! # }
//! ```

mod encrypt;
mod encrypt0;
mod headers;
mod mac;
mod mac0;
mod recipient;
mod sign;
mod sign1;

pub use cose_abstractions::{
    header_params, AlgorithmKind, CoseAlgorithm, CoseEncrypt, CoseEncrypt0, CoseError,
    CoseHeaderMap, CoseKey, CoseMac, CoseMac0, CoseMessage, CoseRecipient, CoseSign, CoseSign1,
    CoseSignature, Curve, HeaderKey, HeaderValue, KeyOperation, KeyParams, KeyType, MessageKind,
};

pub use cose_common::{
    decode, decode_key, decode_with_options, encode, encode_encrypt, encode_encrypt0,
    encode_key, encode_mac, encode_mac0, encode_sign, encode_sign1, DecodeOptions,
};

pub use encrypt::CoseEncryptExt;
pub use encrypt0::CoseEncrypt0Ext;
pub use mac::CoseMacExt;
pub use mac0::CoseMac0Ext;
pub use sign::CoseSignExt;
pub use sign1::CoseSign1Ext;

pub use headers::{alg_of, get_attr};

/// Header bucket accessors shared by every layered COSE structure.
pub trait HeaderOps {
    /// Insert an attribute into the protected bucket.
    ///
    /// Fails if the label already lives in the unprotected bucket.
    fn set_protected(&mut self, key: HeaderKey, value: HeaderValue) -> Result<(), CoseError>;

    /// Insert an attribute into the unprotected bucket.
    ///
    /// Fails if the label already lives in the protected bucket.
    fn set_unprotected(&mut self, key: HeaderKey, value: HeaderValue) -> Result<(), CoseError>;

    /// Look up an attribute, protected bucket first.
    fn get_attr(&self, label: i64) -> Option<&HeaderValue>;

    /// The algorithm this layer is bound to.
    fn alg(&self) -> Result<CoseAlgorithm, CoseError>;
}

headers::impl_header_ops!(
    CoseSign1,
    CoseSign,
    CoseSignature,
    CoseMac0,
    CoseMac,
    CoseEncrypt0,
    CoseEncrypt,
    CoseRecipient,
);
