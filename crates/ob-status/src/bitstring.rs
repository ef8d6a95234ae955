//! # Bitstring Status List Encoding
//!
//! A list is published as a bitstring of `capacity * statusSize` bits,
//! index 0 being the left-most (most significant) bit of the first byte.
//! The bitstring is GZIP-compressed and multibase-encoded as base64url
//! (`u` prefix).
//!
//! The encoded list is always regenerated from the stored entries. Nothing
//! mutates a published bitstring in place.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use ob_core::{Timestamp, VC_V2_CONTEXT};
use ob_crypto::{decode_base64url, encode_base64url};
use ob_vc::Credential;
use serde_json::{json, Value};

use crate::error::StatusError;
use crate::model::{StatusList, StatusListEntry};

/// `type` of the published list credential.
pub const STATUS_LIST_CREDENTIAL_TYPE: &str = "BitstringStatusListCredential";

/// `type` of its `credentialSubject`.
pub const STATUS_LIST_SUBJECT_TYPE: &str = "BitstringStatusList";

/// Build the encoded list for `list` from `entries`.
///
/// Entries of other lists, or past the list's capacity, are ignored.
pub fn encode_bitstring(list: &StatusList, entries: &[StatusListEntry]) -> Result<String, StatusError> {
    let size = u64::from(list.status_size.max(1));
    let total_bits = list
        .capacity
        .checked_mul(size)
        .ok_or_else(|| StatusError::Encoding("list size overflows".into()))?;
    let byte_len = usize::try_from(total_bits.div_ceil(8))
        .map_err(|_| StatusError::Encoding("list too large for this platform".into()))?;
    let mut bits = vec![0u8; byte_len];

    for entry in entries
        .iter()
        .filter(|e| e.status_list_id == list.id && e.status_list_index < list.capacity)
    {
        let start = entry.status_list_index * size;
        for i in 0..size {
            let shift = size - 1 - i;
            if shift < 8 && (entry.current_status >> shift) & 1 == 1 {
                set_bit(&mut bits, start + i);
            }
        }
    }

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&bits)
        .map_err(|e| StatusError::Encoding(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| StatusError::Encoding(e.to_string()))?;
    Ok(encode_base64url(&compressed))
}

/// Reverse [`encode_bitstring`]: the raw, uncompressed bitstring.
pub fn decode_bitstring(encoded: &str) -> Result<Vec<u8>, StatusError> {
    let compressed = decode_base64url(encoded).map_err(|e| StatusError::Encoding(e.to_string()))?;
    let mut bits = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut bits)
        .map_err(|e| StatusError::Encoding(format!("gzip: {e}")))?;
    Ok(bits)
}

/// Read the `status_size`-bit value at `index`. `None` past the end.
pub fn bit_at(bits: &[u8], index: u64, status_size: u8) -> Option<u8> {
    let size = u64::from(status_size.clamp(1, 8));
    let start = index.checked_mul(size)?;
    let mut value = 0u8;
    for i in 0..size {
        let pos = start + i;
        let byte = *bits.get(usize::try_from(pos / 8).ok()?)?;
        let bit = (byte >> (7 - (pos % 8))) & 1;
        value = (value << 1) | bit;
    }
    Some(value)
}

fn set_bit(bits: &mut [u8], pos: u64) {
    if let Some(byte) = usize::try_from(pos / 8).ok().and_then(|i| bits.get_mut(i)) {
        *byte |= 0x80 >> (pos % 8);
    }
}

/// Wrap the encoded list in a `BitstringStatusListCredential`.
///
/// The result is unsigned; signing it is the issuer's concern.
pub fn status_list_credential(
    list: &StatusList,
    entries: &[StatusListEntry],
    list_url: &str,
    issuer: &str,
    valid_from: Timestamp,
) -> Result<Credential, StatusError> {
    let encoded = encode_bitstring(list, entries)?;
    let mut subject = json!({
        "id": format!("{list_url}#list"),
        "type": STATUS_LIST_SUBJECT_TYPE,
        "statusPurpose": list.purpose.as_str(),
        "encodedList": encoded,
    });
    if list.status_size > 1 {
        subject["statusSize"] = Value::from(list.status_size);
    }

    let doc = json!({
        "@context": [VC_V2_CONTEXT],
        "id": list_url,
        "type": ["VerifiableCredential", STATUS_LIST_CREDENTIAL_TYPE],
        "issuer": issuer,
        "validFrom": valid_from,
        "credentialSubject": subject,
    });
    Credential::from_value(doc).map_err(|e| StatusError::Encoding(e.to_string()))
}
