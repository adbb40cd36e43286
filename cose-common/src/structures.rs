// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Byte-string builders for the COSE crypto structures.
//!
//! These produce the exact canonical CBOR arrays handed to the underlying
//! primitives:
//! - `Sig_structure` for COSE_Sign / COSE_Sign1,
//! - `MAC_structure` for COSE_Mac / COSE_Mac0,
//! - `Enc_structure` for COSE_Encrypt / COSE_Encrypt0 and recipient layers,
//! - `COSE_KDF_Context` for HKDF-based content key distribution.
//!
//! Absent optional AAD fields are zero-length bstrs; absent PartyInfo
//! elements are CBOR null, matching RFC 8152 section 11.

use cose_abstractions::{CoseError, HeaderValue};
use minicbor::Encoder;

/// Encode the Sig_structure for a signature computation.
///
/// `sign_protected` is present for COSE_Sign signer entries (context
/// `"Signature"`) and absent for COSE_Sign1 (context `"Signature1"`).
pub fn encode_sig_structure(
    context: &str,
    body_protected: &[u8],
    sign_protected: Option<&[u8]>,
    external_aad: &[u8],
    payload: &[u8],
) -> Vec<u8> {
    let len = if sign_protected.is_some() { 5 } else { 4 };
    let mut out = Vec::with_capacity(32 + body_protected.len() + payload.len());
    let mut enc = Encoder::new(&mut out);
    enc.array(len).ok();
    enc.str(context).ok();
    enc.bytes(body_protected).ok();
    if let Some(sign_protected) = sign_protected {
        enc.bytes(sign_protected).ok();
    }
    enc.bytes(external_aad).ok();
    enc.bytes(payload).ok();
    out
}

/// Encode the MAC_structure for a tag computation.
pub fn encode_mac_structure(
    context: &str,
    body_protected: &[u8],
    external_aad: &[u8],
    payload: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + body_protected.len() + payload.len());
    let mut enc = Encoder::new(&mut out);
    enc.array(4).ok();
    enc.str(context).ok();
    enc.bytes(body_protected).ok();
    enc.bytes(external_aad).ok();
    enc.bytes(payload).ok();
    out
}

/// Encode the Enc_structure used as AEAD additional authenticated data.
pub fn encode_enc_structure(context: &str, protected: &[u8], external_aad: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + protected.len() + external_aad.len());
    let mut enc = Encoder::new(&mut out);
    enc.array(3).ok();
    enc.str(context).ok();
    enc.bytes(protected).ok();
    enc.bytes(external_aad).ok();
    out
}

/// One PartyInfo triple of the KDF context.
///
/// Elements come straight from the recipient's header attributes and may be
/// byte strings, text strings, or integers; absent elements encode as null.
#[derive(Debug, Clone, Copy, Default)]
pub struct PartyInfo<'a> {
    pub identity: Option<&'a HeaderValue>,
    pub nonce: Option<&'a HeaderValue>,
    pub other: Option<&'a HeaderValue>,
}

fn encode_party_element(
    enc: &mut Encoder<&mut Vec<u8>>,
    element: Option<&HeaderValue>,
) -> Result<(), CoseError> {
    match element {
        None | Some(HeaderValue::Null) => {
            enc.null().ok();
        }
        Some(HeaderValue::Bytes(b)) => {
            enc.bytes(b).ok();
        }
        Some(HeaderValue::Text(t)) => {
            enc.str(t).ok();
        }
        Some(HeaderValue::Int(i)) => {
            enc.i64(*i).ok();
        }
        Some(other) => {
            return Err(CoseError::InvalidHeader(format!(
                "party info elements must be byte strings, text, or integers, got {other:?}"
            )));
        }
    }
    Ok(())
}

/// Encode the COSE_KDF_Context info structure for HKDF.
///
/// `algorithm_id` identifies the algorithm the derived key will be used
/// with, and `key_data_length_bits` is that algorithm's key size.
/// `protected` is the serialized protected bucket of the recipient layer
/// performing the derivation.
pub fn encode_kdf_context(
    algorithm_id: i64,
    party_u: PartyInfo<'_>,
    party_v: PartyInfo<'_>,
    key_data_length_bits: u64,
    protected: &[u8],
) -> Result<Vec<u8>, CoseError> {
    let mut out = Vec::with_capacity(64 + protected.len());
    let mut enc = Encoder::new(&mut out);

    enc.array(4).ok();
    enc.i64(algorithm_id).ok();

    for party in [party_u, party_v] {
        enc.array(3).ok();
        encode_party_element(&mut enc, party.identity)?;
        encode_party_element(&mut enc, party.nonce)?;
        encode_party_element(&mut enc, party.other)?;
    }

    // SuppPubInfo: [keyDataLength, protected]; SuppPrivInfo is not used.
    enc.array(2).ok();
    enc.u64(key_data_length_bits).ok();
    enc.bytes(protected).ok();

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sig_structure for COSE_Sign1 with {alg: ES256} protected headers and
    /// the RFC 8152 C.2.1 payload.
    #[test]
    fn signature1_structure_matches_rfc_8152_c_2_1() {
        let structure = encode_sig_structure(
            "Signature1",
            &[0xa1, 0x01, 0x26],
            None,
            &[],
            b"This is the content.",
        );
        let expected = hex::decode(
            "846a5369676e61747572653143a101264054546869732069732074686520636f6e74656e742e",
        )
        .unwrap();
        assert_eq!(structure, expected);
    }

    #[test]
    fn mac0_structure_uses_four_elements() {
        let structure = encode_mac_structure("MAC0", &[0xa1, 0x01, 0x05], &[], b"hi");
        // ["MAC0", h'a10105', h'', h'6869']
        assert_eq!(structure[0], 0x84);
        assert_eq!(&structure[1..6], b"\x64MAC0");
    }

    #[test]
    fn enc_structure_has_no_payload_element() {
        let structure = encode_enc_structure("Encrypt0", &[0xa1, 0x01, 0x01], b"aad");
        assert_eq!(structure[0], 0x83);
    }

    #[test]
    fn kdf_context_encodes_absent_party_info_as_null() {
        // A128GCM (1), no party info, 128-bit key, empty protected bucket:
        // [1, [null, null, null], [null, null, null], [128, h'']]
        let context =
            encode_kdf_context(1, PartyInfo::default(), PartyInfo::default(), 128, &[]).unwrap();
        assert_eq!(context, hex::decode("840183f6f6f683f6f6f682188040").unwrap());
    }

    #[test]
    fn kdf_context_carries_party_identities() {
        let identity = HeaderValue::Bytes(b"Alice".to_vec());
        let party_u = PartyInfo {
            identity: Some(&identity),
            nonce: None,
            other: None,
        };
        let context =
            encode_kdf_context(-3, party_u, PartyInfo::default(), 128, &[0xa1, 0x01, 0x26])
                .unwrap();
        assert_eq!(context[0], 0x84);
        assert_eq!(context[1], 0x22); // -3
        assert_eq!(&context[2..9], &[0x83, 0x45, b'A', b'l', b'i', b'c', b'e']);
    }
}
