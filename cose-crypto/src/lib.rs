// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cryptographic primitive adapters for the COSE engine.
//!
//! Each module exposes a narrow function surface over the underlying
//! primitive, dispatched on the COSE algorithm:
//! - `sig`: ECDSA, EdDSA, RSASSA-PSS, RSASSA-PKCS1-v1_5
//! - `mac`: HMAC-SHA-2, AES-CBC-MAC (constant-time verification)
//! - `aead`: AES-GCM, AES-CCM, ChaCha20-Poly1305
//! - `keywrap`: AES-KW, RSAES-OAEP
//! - `kdf`: HKDF-SHA-256/512
//! - `ecdh`: P-256/P-384/P-521/X25519 agreement
//! - `rng`: the injected random byte source
//!
//! Adapters consume COSE_Key material directly and report failures through
//! the shared error taxonomy; primitive-internal errors surface as
//! `CryptoBackend`.

pub mod aead;
pub mod ecdh;
pub mod kdf;
pub mod keywrap;
pub mod mac;
mod material;
pub mod rng;
pub mod sig;
