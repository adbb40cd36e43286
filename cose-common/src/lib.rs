// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! CBOR parsing and encoding for COSE.
//!
//! This crate is shared by the higher-level message operations. It
//! intentionally exposes only a small surface area:
//! - Parse COSE messages into their structured form, strictly.
//! - Decode and canonically encode COSE header maps and keys.
//! - Encode the Sig/MAC/Enc structures and the HKDF context that the
//!   cryptographic primitives consume.

pub mod codec;
pub mod header_map;
pub mod key_codec;
pub mod structures;

pub use codec::{
    decode, decode_with_options, encode, encode_encrypt, encode_encrypt0, encode_mac,
    encode_mac0, encode_sign, encode_sign1, DecodeOptions,
};
pub use header_map::{
    encode_header_map, freeze_protected, protected_bytes, validate_buckets,
};
pub use key_codec::{decode_key, encode_key, key_from_header_value};
pub use structures::{
    encode_enc_structure, encode_kdf_context, encode_mac_structure, encode_sig_structure,
    PartyInfo,
};
