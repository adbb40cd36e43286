// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! COSE message parsing and encoding.
//!
//! Parsing is deliberately strict:
//! - Accepts an optional variant tag, but rejects any other tag.
//! - Requires the exact top-level array length for the variant.
//! - Rejects indefinite-length arrays/maps.
//! - Rejects trailing bytes.
//! - Enforces the header bucket invariants while both buckets are in hand.
//!
//! Untagged input requires the caller to name the expected variant via
//! [`DecodeOptions`]. Encoding reuses the retained protected-bucket bytes of
//! decoded messages, so a decode/encode round trip is byte-identical.

use cose_abstractions::{
    CoseEncrypt, CoseEncrypt0, CoseError, CoseHeaderMap, CoseMac, CoseMac0, CoseMessage,
    CoseRecipient, CoseSign, CoseSign1, CoseSignature, MessageKind, COSE_ENCRYPT0_TAG,
    COSE_ENCRYPT_TAG, COSE_MAC0_TAG, COSE_MAC_TAG, COSE_SIGN1_TAG, COSE_SIGN_TAG,
};
use minicbor::data::{Tag, Type};
use minicbor::{Decoder, Encoder};

use crate::header_map::{
    decode_header_map_from_cbor, decode_header_map_from_decoder, encode_map_canonical,
    parse_attributes, protected_bytes, validate_buckets,
};

/// Recipient trees deeper than this are rejected as malformed.
const MAX_RECIPIENT_DEPTH: usize = 8;

/// Options controlling message decoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// The variant to decode when the input carries no tag. Tagged input is
    /// checked against this when set.
    pub expected: Option<MessageKind>,

    /// Reject header attributes outside the registry with
    /// `UnknownAttribute` instead of carrying them opaquely.
    pub reject_unknown_attributes: bool,
}

/// Decode a tagged COSE message.
pub fn decode(input: &[u8]) -> Result<CoseMessage, CoseError> {
    decode_with_options(input, &DecodeOptions::default())
}

/// Decode a COSE message with explicit options.
pub fn decode_with_options(
    input: &[u8],
    options: &DecodeOptions,
) -> Result<CoseMessage, CoseError> {
    if input.is_empty() {
        return Err(CoseError::MalformedMessage("empty input".to_string()));
    }

    let mut dec = Decoder::new(input);

    let kind = if matches!(datatype(&mut dec)?, Type::Tag) {
        let tag = dec
            .tag()
            .map_err(|e| CoseError::MalformedMessage(format!("failed to read CBOR tag: {e}")))?;
        let kind = kind_for_tag(tag).ok_or_else(|| {
            CoseError::MalformedMessage("unexpected CBOR tag (not a COSE message tag)".to_string())
        })?;
        if let Some(expected) = options.expected {
            if expected != kind {
                return Err(CoseError::MalformedMessage(format!(
                    "expected a {expected:?} message, found tag for {kind:?}"
                )));
            }
        }
        kind
    } else {
        options.expected.ok_or_else(|| {
            CoseError::MalformedMessage(
                "untagged input requires an expected message variant".to_string(),
            )
        })?
    };

    let msg = decode_body(&mut dec, kind, options)?;

    if dec.position() != input.len() {
        return Err(CoseError::MalformedMessage(
            "trailing bytes after COSE message".to_string(),
        ));
    }

    Ok(msg)
}

fn kind_for_tag(tag: Tag) -> Option<MessageKind> {
    if tag == Tag::new(COSE_ENCRYPT0_TAG) {
        Some(MessageKind::Encrypt0)
    } else if tag == Tag::new(COSE_MAC0_TAG) {
        Some(MessageKind::Mac0)
    } else if tag == Tag::new(COSE_SIGN1_TAG) {
        Some(MessageKind::Sign1)
    } else if tag == Tag::new(COSE_ENCRYPT_TAG) {
        Some(MessageKind::Encrypt)
    } else if tag == Tag::new(COSE_MAC_TAG) {
        Some(MessageKind::Mac)
    } else if tag == Tag::new(COSE_SIGN_TAG) {
        Some(MessageKind::Sign)
    } else {
        None
    }
}

fn decode_body(
    dec: &mut Decoder<'_>,
    kind: MessageKind,
    options: &DecodeOptions,
) -> Result<CoseMessage, CoseError> {
    let len = decode_array(dec, "message")?;
    if len != kind.array_len() {
        return Err(CoseError::MalformedMessage(format!(
            "{kind:?} array length is {len}, expected {}",
            kind.array_len()
        )));
    }

    let (protected, unprotected) = decode_buckets(dec, options)?;

    Ok(match kind {
        MessageKind::Sign1 => {
            let payload = decode_payload(dec)?;
            let signature = decode_bstr(dec, "signature")?;
            CoseMessage::Sign1(CoseSign1 {
                protected,
                unprotected,
                payload,
                external_aad: Vec::new(),
                signature,
            })
        }
        MessageKind::Sign => {
            let payload = decode_payload(dec)?;
            let count = decode_array(dec, "signatures")?;
            if count == 0 {
                return Err(CoseError::MalformedMessage(
                    "COSE_Sign requires at least one signature".to_string(),
                ));
            }
            let mut signatures = Vec::with_capacity(count as usize);
            for _ in 0..count {
                signatures.push(decode_signature_entry(dec, options)?);
            }
            CoseMessage::Sign(CoseSign {
                protected,
                unprotected,
                payload,
                external_aad: Vec::new(),
                signatures,
            })
        }
        MessageKind::Mac0 => {
            let payload = decode_payload(dec)?;
            let tag = decode_bstr(dec, "tag")?;
            CoseMessage::Mac0(CoseMac0 {
                protected,
                unprotected,
                payload,
                external_aad: Vec::new(),
                tag,
            })
        }
        MessageKind::Mac => {
            let payload = decode_payload(dec)?;
            let tag = decode_bstr(dec, "tag")?;
            let recipients = decode_recipients(dec, options, 0)?;
            CoseMessage::Mac(CoseMac {
                protected,
                unprotected,
                payload,
                external_aad: Vec::new(),
                tag,
                recipients,
            })
        }
        MessageKind::Encrypt0 => {
            let ciphertext = decode_payload(dec)?;
            CoseMessage::Encrypt0(CoseEncrypt0 {
                protected,
                unprotected,
                plaintext: None,
                ciphertext,
                external_aad: Vec::new(),
            })
        }
        MessageKind::Encrypt => {
            let ciphertext = decode_payload(dec)?;
            let recipients = decode_recipients(dec, options, 0)?;
            CoseMessage::Encrypt(CoseEncrypt {
                protected,
                unprotected,
                plaintext: None,
                ciphertext,
                external_aad: Vec::new(),
                recipients,
            })
        }
    })
}

/// Decode the protected bstr + unprotected map pair opening every layer.
fn decode_buckets(
    dec: &mut Decoder<'_>,
    options: &DecodeOptions,
) -> Result<(CoseHeaderMap, CoseHeaderMap), CoseError> {
    let protected_bstr = decode_bstr(dec, "protected headers")?;
    let protected_map = parse_attributes(
        decode_header_map_from_cbor(&protected_bstr)?,
        options.reject_unknown_attributes,
    )?;

    if !matches!(datatype(dec)?, Type::Map) {
        return Err(CoseError::MalformedMessage(
            "unprotected headers are not a map".to_string(),
        ));
    }
    let unprotected_map = parse_attributes(
        decode_header_map_from_decoder(dec)?,
        options.reject_unknown_attributes,
    )?;

    let protected = CoseHeaderMap::from_parts(Some(protected_bstr), protected_map);
    let unprotected = CoseHeaderMap::from_parts(None, unprotected_map);
    validate_buckets(&protected, &unprotected)?;

    Ok((protected, unprotected))
}

fn decode_signature_entry(
    dec: &mut Decoder<'_>,
    options: &DecodeOptions,
) -> Result<CoseSignature, CoseError> {
    let len = decode_array(dec, "signature entry")?;
    if len != 3 {
        return Err(CoseError::MalformedMessage(format!(
            "signature entry array length is {len}, expected 3"
        )));
    }
    let (protected, unprotected) = decode_buckets(dec, options)?;
    let signature = decode_bstr(dec, "signature")?;
    Ok(CoseSignature {
        protected,
        unprotected,
        signature,
    })
}

fn decode_recipients(
    dec: &mut Decoder<'_>,
    options: &DecodeOptions,
    depth: usize,
) -> Result<Vec<CoseRecipient>, CoseError> {
    if depth >= MAX_RECIPIENT_DEPTH {
        return Err(CoseError::MalformedMessage(
            "recipient nesting too deep".to_string(),
        ));
    }

    let count = decode_array(dec, "recipients")?;
    if count == 0 {
        return Err(CoseError::MalformedMessage(
            "recipient list must not be empty".to_string(),
        ));
    }
    let mut recipients = Vec::with_capacity(count as usize);
    for _ in 0..count {
        recipients.push(decode_recipient(dec, options, depth)?);
    }
    Ok(recipients)
}

fn decode_recipient(
    dec: &mut Decoder<'_>,
    options: &DecodeOptions,
    depth: usize,
) -> Result<CoseRecipient, CoseError> {
    let len = decode_array(dec, "recipient")?;
    if len != 3 && len != 4 {
        return Err(CoseError::MalformedMessage(format!(
            "recipient array length is {len}, expected 3 or 4"
        )));
    }
    let (protected, unprotected) = decode_buckets(dec, options)?;
    let ciphertext = decode_bstr(dec, "recipient ciphertext")?;
    let recipients = if len == 4 {
        decode_recipients(dec, options, depth + 1)?
    } else {
        Vec::new()
    };
    Ok(CoseRecipient {
        protected,
        unprotected,
        ciphertext,
        recipients,
        key: None,
        peer_key: None,
    })
}

fn datatype(dec: &mut Decoder<'_>) -> Result<Type, CoseError> {
    dec.datatype()
        .map_err(|e| CoseError::MalformedMessage(e.to_string()))
}

fn decode_array(dec: &mut Decoder<'_>, what: &str) -> Result<u64, CoseError> {
    dec.array()
        .map_err(|e| CoseError::MalformedMessage(format!("{what} is not an array: {e}")))?
        .ok_or_else(|| {
            CoseError::MalformedMessage("indefinite-length arrays are not supported".to_string())
        })
}

fn decode_bstr(dec: &mut Decoder<'_>, what: &str) -> Result<Vec<u8>, CoseError> {
    match datatype(dec)? {
        Type::Bytes => Ok(dec
            .bytes()
            .map_err(|e| CoseError::MalformedMessage(format!("failed to read {what}: {e}")))?
            .to_vec()),
        other => Err(CoseError::MalformedMessage(format!(
            "{what} must be a byte string, got {other:?}"
        ))),
    }
}

/// Payload and ciphertext positions hold a bstr or null (detached).
fn decode_payload(dec: &mut Decoder<'_>) -> Result<Option<Vec<u8>>, CoseError> {
    match datatype(dec)? {
        Type::Null => {
            dec.null()
                .map_err(|e| CoseError::MalformedMessage(e.to_string()))?;
            Ok(None)
        }
        Type::Bytes => Ok(Some(
            dec.bytes()
                .map_err(|e| {
                    CoseError::MalformedMessage(format!("failed to read payload: {e}"))
                })?
                .to_vec(),
        )),
        other => Err(CoseError::MalformedMessage(format!(
            "payload must be a byte string or null, got {other:?}"
        ))),
    }
}

/// Encode a COSE message, optionally wrapped in its variant tag.
pub fn encode(msg: &CoseMessage, attach_tag: bool) -> Vec<u8> {
    match msg {
        CoseMessage::Sign1(m) => encode_sign1(m, attach_tag),
        CoseMessage::Sign(m) => encode_sign(m, attach_tag),
        CoseMessage::Mac0(m) => encode_mac0(m, attach_tag),
        CoseMessage::Mac(m) => encode_mac(m, attach_tag),
        CoseMessage::Encrypt0(m) => encode_encrypt0(m, attach_tag),
        CoseMessage::Encrypt(m) => encode_encrypt(m, attach_tag),
    }
}

fn start(out: &mut Vec<u8>, attach_tag: bool, tag: u64, array_len: u64) -> Encoder<&mut Vec<u8>> {
    let mut enc = Encoder::new(out);
    if attach_tag {
        enc.tag(Tag::new(tag)).ok();
    }
    enc.array(array_len).ok();
    enc
}

fn encode_buckets(enc: &mut Encoder<&mut Vec<u8>>, protected: &CoseHeaderMap, unprotected: &CoseHeaderMap) {
    enc.bytes(&protected_bytes(protected)).ok();
    encode_map_canonical(enc, unprotected.map());
}

fn encode_payload(enc: &mut Encoder<&mut Vec<u8>>, payload: Option<&[u8]>) {
    match payload {
        Some(bytes) => enc.bytes(bytes).ok(),
        None => enc.null().ok(),
    };
}

/// Encode a COSE_Sign1 message.
pub fn encode_sign1(msg: &CoseSign1, attach_tag: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = start(&mut out, attach_tag, COSE_SIGN1_TAG, 4);
    encode_buckets(&mut enc, &msg.protected, &msg.unprotected);
    encode_payload(&mut enc, msg.payload.as_deref());
    enc.bytes(&msg.signature).ok();
    out
}

/// Encode a COSE_Sign message.
pub fn encode_sign(msg: &CoseSign, attach_tag: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = start(&mut out, attach_tag, COSE_SIGN_TAG, 4);
    encode_buckets(&mut enc, &msg.protected, &msg.unprotected);
    encode_payload(&mut enc, msg.payload.as_deref());
    enc.array(msg.signatures.len() as u64).ok();
    for entry in &msg.signatures {
        enc.array(3).ok();
        encode_buckets(&mut enc, &entry.protected, &entry.unprotected);
        enc.bytes(&entry.signature).ok();
    }
    out
}

/// Encode a COSE_Mac0 message.
pub fn encode_mac0(msg: &CoseMac0, attach_tag: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = start(&mut out, attach_tag, COSE_MAC0_TAG, 4);
    encode_buckets(&mut enc, &msg.protected, &msg.unprotected);
    encode_payload(&mut enc, msg.payload.as_deref());
    enc.bytes(&msg.tag).ok();
    out
}

/// Encode a COSE_Mac message.
pub fn encode_mac(msg: &CoseMac, attach_tag: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = start(&mut out, attach_tag, COSE_MAC_TAG, 5);
    encode_buckets(&mut enc, &msg.protected, &msg.unprotected);
    encode_payload(&mut enc, msg.payload.as_deref());
    enc.bytes(&msg.tag).ok();
    encode_recipients(&mut enc, &msg.recipients);
    out
}

/// Encode a COSE_Encrypt0 message.
pub fn encode_encrypt0(msg: &CoseEncrypt0, attach_tag: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = start(&mut out, attach_tag, COSE_ENCRYPT0_TAG, 3);
    encode_buckets(&mut enc, &msg.protected, &msg.unprotected);
    encode_payload(&mut enc, msg.ciphertext.as_deref());
    out
}

/// Encode a COSE_Encrypt message.
pub fn encode_encrypt(msg: &CoseEncrypt, attach_tag: bool) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = start(&mut out, attach_tag, COSE_ENCRYPT_TAG, 4);
    encode_buckets(&mut enc, &msg.protected, &msg.unprotected);
    encode_payload(&mut enc, msg.ciphertext.as_deref());
    encode_recipients(&mut enc, &msg.recipients);
    out
}

fn encode_recipients(enc: &mut Encoder<&mut Vec<u8>>, recipients: &[CoseRecipient]) {
    enc.array(recipients.len() as u64).ok();
    for recipient in recipients {
        let array_len = if recipient.recipients.is_empty() { 3 } else { 4 };
        enc.array(array_len).ok();
        encode_buckets(enc, &recipient.protected, &recipient.unprotected);
        enc.bytes(&recipient.ciphertext).ok();
        if !recipient.recipients.is_empty() {
            encode_recipients(enc, &recipient.recipients);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cose_abstractions::{CoseAlgorithm, HeaderKey, HeaderValue};

    fn sign1_fixture() -> CoseSign1 {
        let mut msg = CoseSign1::default();
        msg.protected
            .insert(HeaderKey::Int(1), HeaderValue::Alg(CoseAlgorithm::ES256));
        msg.unprotected
            .insert(HeaderKey::Int(4), HeaderValue::Bytes(vec![0x11]));
        msg.payload = Some(b"This is the content.".to_vec());
        msg.signature = vec![0u8; 64];
        msg
    }

    #[test]
    fn tagged_sign1_round_trips() {
        let msg = sign1_fixture();
        let bytes = encode_sign1(&msg, true);
        let decoded = match decode(&bytes).unwrap() {
            CoseMessage::Sign1(m) => m,
            other => panic!("unexpected variant: {other:?}"),
        };
        assert_eq!(decoded.payload, msg.payload);
        assert_eq!(decoded.signature, msg.signature);
        assert_eq!(decoded.protected.alg(), Some(CoseAlgorithm::ES256));

        // A second encode must reproduce the same bytes, reusing the
        // retained protected bucket.
        assert_eq!(encode_sign1(&decoded, true), bytes);
    }

    #[test]
    fn untagged_input_requires_a_hint() {
        let msg = sign1_fixture();
        let bytes = encode_sign1(&msg, false);

        assert!(matches!(
            decode(&bytes),
            Err(CoseError::MalformedMessage(_))
        ));

        let options = DecodeOptions {
            expected: Some(MessageKind::Sign1),
            ..Default::default()
        };
        assert!(decode_with_options(&bytes, &options).is_ok());
    }

    #[test]
    fn tag_and_hint_must_agree() {
        let msg = sign1_fixture();
        let bytes = encode_sign1(&msg, true);
        let options = DecodeOptions {
            expected: Some(MessageKind::Mac0),
            ..Default::default()
        };
        let err = decode_with_options(&bytes, &options).unwrap_err();
        assert!(matches!(err, CoseError::MalformedMessage(_)));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let mut bytes = encode_sign1(&sign1_fixture(), true);
        bytes.push(0x00);
        assert!(matches!(
            decode(&bytes),
            Err(CoseError::MalformedMessage(_))
        ));
    }

    #[test]
    fn unknown_tags_are_rejected() {
        let mut out = Vec::new();
        let mut enc = Encoder::new(&mut out);
        enc.tag(Tag::new(19)).ok();
        enc.array(4).ok();
        enc.bytes(&[]).ok();
        enc.map(0).ok();
        enc.bytes(b"hi").ok();
        enc.bytes(&[0u8; 64]).ok();
        assert!(matches!(decode(&out), Err(CoseError::MalformedMessage(_))));
    }

    #[test]
    fn detached_payload_round_trips_as_null() {
        let mut msg = sign1_fixture();
        msg.payload = None;
        let bytes = encode_sign1(&msg, true);
        let decoded = match decode(&bytes).unwrap() {
            CoseMessage::Sign1(m) => m,
            other => panic!("unexpected variant: {other:?}"),
        };
        assert_eq!(decoded.payload, None);
    }

    #[test]
    fn mac_with_nested_recipient_round_trips() {
        let mut recipient = CoseRecipient::default();
        recipient
            .unprotected
            .insert(HeaderKey::Int(1), HeaderValue::Alg(CoseAlgorithm::A128KW));
        recipient.ciphertext = vec![0xab; 24];

        let mut inner = CoseRecipient::default();
        inner
            .unprotected
            .insert(HeaderKey::Int(1), HeaderValue::Alg(CoseAlgorithm::Direct));
        recipient.recipients.push(inner);

        let mut msg = CoseMac::default();
        msg.protected.insert(
            HeaderKey::Int(1),
            HeaderValue::Alg(CoseAlgorithm::HMAC_256_256),
        );
        msg.payload = Some(b"payload".to_vec());
        msg.tag = vec![0u8; 32];
        msg.recipients.push(recipient);

        let bytes = encode_mac(&msg, true);
        let decoded = match decode(&bytes).unwrap() {
            CoseMessage::Mac(m) => m,
            other => panic!("unexpected variant: {other:?}"),
        };
        assert_eq!(decoded.recipients.len(), 1);
        assert_eq!(decoded.recipients[0].recipients.len(), 1);
        assert_eq!(
            decoded.recipients[0].unprotected.alg(),
            Some(CoseAlgorithm::A128KW)
        );
        assert_eq!(encode_mac(&decoded, true), bytes);
    }

    #[test]
    fn non_canonical_protected_bytes_survive_reencoding() {
        // Protected map {4: h'11', 1: -7} in a deliberately non-canonical
        // order; the received bytes must be retained verbatim.
        let protected: Vec<u8> = vec![0xa2, 0x04, 0x41, 0x11, 0x01, 0x26];
        let mut out = Vec::new();
        let mut enc = Encoder::new(&mut out);
        enc.tag(Tag::new(COSE_SIGN1_TAG)).ok();
        enc.array(4).ok();
        enc.bytes(&protected).ok();
        enc.map(0).ok();
        enc.bytes(b"hi").ok();
        enc.bytes(&[0u8; 64]).ok();

        let decoded = match decode(&out).unwrap() {
            CoseMessage::Sign1(m) => m,
            other => panic!("unexpected variant: {other:?}"),
        };
        assert_eq!(decoded.protected.encoded(), Some(protected.as_slice()));
        assert_eq!(encode_sign1(&decoded, true), out);
    }

    #[test]
    fn wrong_array_length_is_rejected() {
        let mut out = Vec::new();
        let mut enc = Encoder::new(&mut out);
        enc.tag(Tag::new(COSE_SIGN1_TAG)).ok();
        enc.array(3).ok();
        enc.bytes(&[]).ok();
        enc.map(0).ok();
        enc.bytes(b"hi").ok();
        assert!(matches!(decode(&out), Err(CoseError::MalformedMessage(_))));
    }
}
