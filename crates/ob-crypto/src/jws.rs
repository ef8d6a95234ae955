//! # Detached JWS (RFC 7515 + RFC 7797)
//!
//! `JsonWebSignature2020` proofs carry a compact JWS with the payload
//! segment left empty: `BASE64URL(header) || ".." || BASE64URL(signature)`.
//!
//! The payload was signed *unencoded* (`"b64": false`), so the signing input
//! is `BASE64URL(header) || "." || canonical_document`, with the canonical
//! JSON string appended as-is. Re-encoding the payload as base64url before
//! verifying would check a different byte string and reject every genuine
//! signature.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ob_core::CanonicalBytes;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// JWS algorithms this engine can verify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JwsAlgorithm {
    /// Ed25519 (RFC 8037).
    EdDSA,
    /// ECDSA over P-256 with SHA-256, raw `r || s` signature.
    ES256,
}

impl JwsAlgorithm {
    /// The registered `alg` header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EdDSA => "EdDSA",
            Self::ES256 => "ES256",
        }
    }

    /// Parse an `alg` header value.
    pub fn parse(alg: &str) -> Result<Self, CryptoError> {
        match alg {
            "EdDSA" => Ok(Self::EdDSA),
            "ES256" => Ok(Self::ES256),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

impl std::fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protected JWS header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// Signature algorithm.
    pub alg: String,
    /// `false` when the payload is signed unencoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b64: Option<bool>,
    /// Critical header parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crit: Option<Vec<String>>,
    /// Key identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl JwsHeader {
    /// Header for an unencoded detached payload.
    pub fn detached(alg: JwsAlgorithm) -> Self {
        Self {
            alg: alg.as_str().to_string(),
            b64: Some(false),
            crit: Some(vec!["b64".to_string()]),
            kid: None,
        }
    }

    /// Serialize and base64url-encode the header.
    pub fn encode(&self) -> Result<String, CryptoError> {
        let json = serde_json::to_vec(self).map_err(|e| CryptoError::Jws(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }
}

/// The exact bytes a detached JWS signature covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwsSigningInput(Vec<u8>);

impl JwsSigningInput {
    /// `encoded_header || "." || payload`, payload unencoded.
    pub fn new(encoded_header: &str, payload: &CanonicalBytes) -> Self {
        let mut buf = Vec::with_capacity(encoded_header.len() + 1 + payload.len());
        buf.extend_from_slice(encoded_header.as_bytes());
        buf.push(b'.');
        buf.extend_from_slice(payload.as_bytes());
        Self(buf)
    }

    /// Access the signing input.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A parsed detached compact JWS.
#[derive(Debug, Clone)]
pub struct DetachedJws {
    header: JwsHeader,
    encoded_header: String,
    signature: Vec<u8>,
}

impl DetachedJws {
    /// Parse `header..signature`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Jws` if the value does not have exactly the
    /// detached shape, or a segment is not valid base64url / JSON.
    pub fn parse(value: &str) -> Result<Self, CryptoError> {
        let (encoded_header, encoded_sig) = value
            .split_once("..")
            .ok_or_else(|| CryptoError::Jws("expected detached form header..signature".into()))?;
        if encoded_header.is_empty() || encoded_sig.is_empty() {
            return Err(CryptoError::Jws("empty header or signature segment".into()));
        }
        if encoded_header.contains('.') || encoded_sig.contains('.') {
            return Err(CryptoError::Jws("unexpected extra segment".into()));
        }

        let header_bytes = URL_SAFE_NO_PAD
            .decode(encoded_header)
            .map_err(|e| CryptoError::Jws(format!("header is not base64url: {e}")))?;
        let header: JwsHeader = serde_json::from_slice(&header_bytes)
            .map_err(|e| CryptoError::Jws(format!("header is not a JSON object: {e}")))?;
        let signature = URL_SAFE_NO_PAD
            .decode(encoded_sig)
            .map_err(|e| CryptoError::Jws(format!("signature is not base64url: {e}")))?;

        Ok(Self {
            header,
            encoded_header: encoded_header.to_string(),
            signature,
        })
    }

    /// Assemble a detached JWS from an encoded header and raw signature.
    pub fn compose(encoded_header: &str, signature: &[u8]) -> String {
        format!("{encoded_header}..{}", URL_SAFE_NO_PAD.encode(signature))
    }

    /// The decoded protected header.
    pub fn header(&self) -> &JwsHeader {
        &self.header
    }

    /// The header's algorithm, if supported.
    pub fn algorithm(&self) -> Result<JwsAlgorithm, CryptoError> {
        JwsAlgorithm::parse(&self.header.alg)
    }

    /// Raw signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Signing input for this JWS over the given canonical payload.
    pub fn signing_input(&self, payload: &CanonicalBytes) -> JwsSigningInput {
        JwsSigningInput::new(&self.encoded_header, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detached_header_shape() {
        let encoded = JwsHeader::detached(JwsAlgorithm::EdDSA).encode().unwrap();
        let decoded = URL_SAFE_NO_PAD.decode(&encoded).unwrap();
        let header: serde_json::Value = serde_json::from_slice(&decoded).unwrap();
        assert_eq!(header, json!({"alg": "EdDSA", "b64": false, "crit": ["b64"]}));
    }

    #[test]
    fn test_parse_compose() {
        let h = JwsHeader::detached(JwsAlgorithm::ES256).encode().unwrap();
        let jws = DetachedJws::compose(&h, &[9u8; 64]);
        let parsed = DetachedJws::parse(&jws).unwrap();
        assert_eq!(parsed.algorithm().unwrap(), JwsAlgorithm::ES256);
        assert_eq!(parsed.signature(), &[9u8; 64]);
    }

    #[test]
    fn test_signing_input_is_unencoded_payload() {
        let payload = CanonicalBytes::new(&json!({"b": 1, "a": 2})).unwrap();
        let input = JwsSigningInput::new("eyJhbGciOiJFZERTQSJ9", &payload);
        assert_eq!(input.as_bytes(), br#"eyJhbGciOiJFZERTQSJ9.{"a":2,"b":1}"#);
    }

    #[test]
    fn test_rejects_attached_and_malformed_forms() {
        assert!(DetachedJws::parse("a.b.c").is_err());
        assert!(DetachedJws::parse("..sig").is_err());
        assert!(DetachedJws::parse("hdr..").is_err());
        assert!(DetachedJws::parse("a..b..c").is_err());
        assert!(DetachedJws::parse("!!!..AAAA").is_err());
    }

    #[test]
    fn test_unknown_algorithm() {
        let h = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let parsed = DetachedJws::parse(&format!("{h}..AAAA")).unwrap();
        assert!(matches!(parsed.algorithm(), Err(CryptoError::UnsupportedAlgorithm(_))));
    }
}
