//! # PNG Codec
//!
//! A PNG is an 8-byte signature followed by chunks of
//! `length (u32 BE) || type (4) || data || crc (u32 BE)`, where the CRC-32
//! covers `type || data`. The image is parsed into typed [`Chunk`] records,
//! edited as a list, and only turned back into bytes at the boundary.
//!
//! Baking inserts one `iTXt` chunk:
//!
//! ```text
//! "openbadges" 0x00 | compression flag 0 | method 0 | "" 0x00 | "" 0x00 | UTF-8 JSON
//! ```
//!
//! immediately before `IEND`. Every other chunk is re-emitted with its
//! original bytes, CRC included. An earlier `openbadges` text chunk is
//! dropped so an image never carries two payloads.
//!
//! Extraction also accepts a zlib-compressed `iTXt` payload and a legacy
//! `tEXt` chunk, both of which other bakers produce.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::error::BakeError;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

/// Keyword of the Open Badges text chunk.
pub const OPENBADGES_KEYWORD: &[u8] = b"openbadges";

const ITXT: [u8; 4] = *b"iTXt";
const TEXT: [u8; 4] = *b"tEXt";
const IEND: [u8; 4] = *b"IEND";

/// Largest chunk length the format allows (2^31 - 1).
const MAX_CHUNK_LEN: u32 = 0x7fff_ffff;

/// One PNG chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Four-letter chunk type.
    pub chunk_type: [u8; 4],
    /// Chunk payload.
    pub data: Vec<u8>,
    /// CRC-32 over `chunk_type || data`.
    pub crc: u32,
}

impl Chunk {
    /// Build a chunk, computing its CRC.
    pub fn new(chunk_type: [u8; 4], data: Vec<u8>) -> Self {
        let crc = chunk_crc(&chunk_type, &data);
        Self { chunk_type, data, crc }
    }

    /// The chunk type as text (`IHDR`, `iTXt`, ...).
    pub fn type_str(&self) -> String {
        String::from_utf8_lossy(&self.chunk_type).into_owned()
    }

    /// `iTXt` or `tEXt` carrying the `openbadges` keyword.
    pub fn is_openbadges(&self) -> bool {
        (self.chunk_type == ITXT || self.chunk_type == TEXT)
            && keyword(&self.data) == Some(OPENBADGES_KEYWORD)
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        // Parsed chunk lengths are bounded by MAX_CHUNK_LEN, and a payload
        // over 2 GiB is not a badge.
        let len = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&self.chunk_type);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.crc.to_be_bytes());
    }
}

/// CRC-32 (ISO 3309) over a chunk's type and data.
pub fn chunk_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

/// A parsed PNG: its chunks through `IEND`, plus any bytes after `IEND`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngImage {
    /// Chunks in file order, ending with `IEND`.
    pub chunks: Vec<Chunk>,
    trailing: Vec<u8>,
}

impl PngImage {
    /// Parse and validate a PNG byte stream.
    ///
    /// # Errors
    ///
    /// - [`BakeError::InvalidPngSignature`] if the signature is wrong.
    /// - [`BakeError::MalformedPng`] on truncation, a bad CRC, or no `IEND`.
    pub fn parse(bytes: &[u8]) -> Result<Self, BakeError> {
        if !bytes.starts_with(&PNG_SIGNATURE) {
            return Err(BakeError::InvalidPngSignature);
        }

        let mut chunks = Vec::new();
        let mut pos = PNG_SIGNATURE.len();
        loop {
            let header = bytes.get(pos..pos + 8).ok_or_else(|| {
                BakeError::MalformedPng(format!("truncated chunk header at offset {pos}"))
            })?;
            let len = u32::from_be_bytes([header[0], header[1], header[2], header[3]]);
            if len > MAX_CHUNK_LEN {
                return Err(BakeError::MalformedPng(format!(
                    "chunk length {len} at offset {pos} exceeds 2^31-1"
                )));
            }
            let chunk_type = [header[4], header[5], header[6], header[7]];
            let data_start = pos + 8;
            let data_end = data_start + len as usize;
            let data = bytes.get(data_start..data_end).ok_or_else(|| {
                BakeError::MalformedPng(format!(
                    "chunk {} at offset {pos} is truncated",
                    String::from_utf8_lossy(&chunk_type)
                ))
            })?;
            let crc_bytes = bytes.get(data_end..data_end + 4).ok_or_else(|| {
                BakeError::MalformedPng(format!("missing CRC for chunk at offset {pos}"))
            })?;
            let crc = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
            let expected = chunk_crc(&chunk_type, data);
            if crc != expected {
                return Err(BakeError::MalformedPng(format!(
                    "CRC mismatch in {} chunk at offset {pos}: stored {crc:08x}, computed {expected:08x}",
                    String::from_utf8_lossy(&chunk_type)
                )));
            }

            chunks.push(Chunk {
                chunk_type,
                data: data.to_vec(),
                crc,
            });
            pos = data_end + 4;

            if chunk_type == IEND {
                break;
            }
            if pos == bytes.len() {
                return Err(BakeError::MalformedPng("missing IEND chunk".into()));
            }
        }

        Ok(Self {
            chunks,
            trailing: bytes[pos..].to_vec(),
        })
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = PNG_SIGNATURE.len()
            + self.chunks.iter().map(|c| c.data.len() + 12).sum::<usize>()
            + self.trailing.len();
        let mut out = Vec::with_capacity(size);
        out.extend_from_slice(&PNG_SIGNATURE);
        for chunk in &self.chunks {
            chunk.write_to(&mut out);
        }
        out.extend_from_slice(&self.trailing);
        out
    }

    /// Insert `chunk` immediately before `IEND`.
    pub fn insert_before_iend(&mut self, chunk: Chunk) {
        let at = self
            .chunks
            .iter()
            .position(|c| c.chunk_type == IEND)
            .unwrap_or(self.chunks.len());
        self.chunks.insert(at, chunk);
    }

    /// Remove every `openbadges` text chunk, returning how many were removed.
    pub fn remove_openbadges(&mut self) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|c| !c.is_openbadges());
        before - self.chunks.len()
    }
}

/// Build the uncompressed `iTXt` chunk for a payload.
pub fn openbadges_itxt(text: &str) -> Chunk {
    let mut data = Vec::with_capacity(OPENBADGES_KEYWORD.len() + 5 + text.len());
    data.extend_from_slice(OPENBADGES_KEYWORD);
    data.push(0); // keyword terminator
    data.push(0); // compression flag
    data.push(0); // compression method
    data.push(0); // empty language tag
    data.push(0); // empty translated keyword
    data.extend_from_slice(text.as_bytes());
    Chunk::new(ITXT, data)
}

/// Embed `text` in `png`, replacing any existing payload.
pub fn bake(png: &[u8], text: &str) -> Result<Vec<u8>, BakeError> {
    let mut image = PngImage::parse(png)?;
    let replaced = image.remove_openbadges();
    image.insert_before_iend(openbadges_itxt(text));
    tracing::debug!(
        chunks = image.chunks.len(),
        replaced,
        payload_bytes = text.len(),
        "baked PNG"
    );
    Ok(image.to_bytes())
}

/// Extract the raw `openbadges` text, if any.
pub fn extract(png: &[u8]) -> Result<Option<String>, BakeError> {
    let image = PngImage::parse(png)?;
    let Some(chunk) = image.chunks.iter().find(|c| c.is_openbadges()) else {
        return Ok(None);
    };
    let text = if chunk.chunk_type == ITXT {
        itxt_text(&chunk.data)?
    } else {
        text_chunk_text(&chunk.data)
    };
    tracing::debug!(chunk = %chunk.type_str(), payload_bytes = text.len(), "found PNG payload");
    Ok(Some(text))
}

fn keyword(data: &[u8]) -> Option<&[u8]> {
    data.iter().position(|&b| b == 0).map(|nul| &data[..nul])
}

fn itxt_text(data: &[u8]) -> Result<String, BakeError> {
    let malformed = |what: &str| BakeError::InvalidCredentialPayload(format!("iTXt {what}"));

    let kw_end = data.iter().position(|&b| b == 0).ok_or_else(|| malformed("keyword unterminated"))?;
    let rest = &data[kw_end + 1..];
    let (&flag, rest) = rest.split_first().ok_or_else(|| malformed("missing compression flag"))?;
    let (&method, rest) = rest.split_first().ok_or_else(|| malformed("missing compression method"))?;
    let lang_end = rest.iter().position(|&b| b == 0).ok_or_else(|| malformed("language tag unterminated"))?;
    let rest = &rest[lang_end + 1..];
    let tkw_end = rest
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| malformed("translated keyword unterminated"))?;
    let text = &rest[tkw_end + 1..];

    let bytes = match (flag, method) {
        (0, _) => text.to_vec(),
        (1, 0) => {
            let mut out = Vec::new();
            ZlibDecoder::new(text)
                .read_to_end(&mut out)
                .map_err(|e| BakeError::InvalidCredentialPayload(format!("iTXt inflate failed: {e}")))?;
            out
        }
        (1, m) => return Err(malformed(&format!("unknown compression method {m}"))),
        (f, _) => return Err(malformed(&format!("invalid compression flag {f}"))),
    };
    String::from_utf8(bytes).map_err(|e| BakeError::InvalidCredentialPayload(format!("iTXt text is not UTF-8: {e}")))
}

/// `tEXt` is Latin-1.
fn text_chunk_text(data: &[u8]) -> String {
    let start = keyword(data).map_or(data.len(), |kw| kw.len() + 1);
    data[start..].iter().map(|&b| char::from(b)).collect()
}
