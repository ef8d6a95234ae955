//! # Integration Tests for ob-api
//!
//! Drives the router with `tower::ServiceExt::oneshot`: health probes,
//! verification (including revocation), bearer token checks on the
//! status-changing routes, baking round trips, status list publication, and
//! error bodies.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http_body_util::BodyExt;
use ob_bake::png::{chunk_crc, PNG_SIGNATURE};
use ob_core::Timestamp;
use ob_crypto::Ed25519KeyPair;
use ob_status::{bit_at, decode_bitstring};
use ob_vc::{sign_credential, Credential, ProofSuite};
use serde_json::{json, Value};
use tower::ServiceExt;

use ob_api::{AppConfig, AppState};

const BASE_URL: &str = "https://badges.example/v1/status-lists";
const TOKEN: &str = "integration-test-token";

fn test_state() -> AppState {
    AppState::with_config(AppConfig {
        status_list_base_url: BASE_URL.to_string(),
        status_list_issuer: "did:web:badges.example".to_string(),
        status_list_capacity: 64,
        auth_token: Some(TOKEN.to_string()),
        ..AppConfig::default()
    })
}

fn test_app() -> axum::Router {
    ob_api::app(test_state())
}

fn keypair() -> Ed25519KeyPair {
    Ed25519KeyPair::from_seed(&[9u8; 32])
}

fn public_key_pem() -> String {
    keypair().public_key().to_pem().unwrap()
}

fn unsigned_badge(id: &str) -> Value {
    json!({
        "@context": ob_core::OB3_CONTEXTS,
        "id": id,
        "type": ob_core::OB3_CREDENTIAL_TYPES,
        "issuer": {"id": "did:web:badges.example", "type": ["Profile"], "name": "Example Academy"},
        "validFrom": "2026-01-15T12:00:00Z",
        "credentialSubject": {
            "type": ["AchievementSubject"],
            "achievement": {"id": "https://badges.example/achievements/rust", "type": ["Achievement"], "name": "Rust"}
        }
    })
}

fn sign(doc: Value) -> Value {
    let credential = Credential::from_value(doc).unwrap();
    sign_credential(
        &credential,
        &keypair(),
        "did:web:badges.example#key-1",
        ProofSuite::DataIntegrityProof,
        Timestamp::from_epoch_secs(1_768_478_400).unwrap(),
    )
    .unwrap()
    .into_value()
}

fn png_chunk(out: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type);
    out.extend_from_slice(data);
    out.extend_from_slice(&chunk_crc(chunk_type, data).to_be_bytes());
}

fn tiny_png() -> Vec<u8> {
    let mut png = PNG_SIGNATURE.to_vec();
    png_chunk(&mut png, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 0, 0, 0, 0]);
    png_chunk(&mut png, b"IDAT", &[0x78, 0x9c, 0x63, 0x60, 0x00, 0x00, 0x00, 0x02, 0x00, 0x01]);
    png_chunk(&mut png, b"IEND", &[]);
    png
}

const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"><circle r="4"/></svg>"#;

async fn send(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_auth(app, method, uri, body, None).await
}

/// Send as the operator holding the configured bearer token.
async fn admin(app: axum::Router, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_with_auth(app, "POST", uri, body, Some(&format!("Bearer {TOKEN}"))).await
}

async fn send_with_auth(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    authorization: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
    };
    (status, value)
}

// ============================================================================
// Health Probes
// ============================================================================

#[tokio::test]
async fn test_liveness_probe() {
    let (status, body) = send(test_app(), "GET", "/health/liveness", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".into()));
}

#[tokio::test]
async fn test_readiness_probe() {
    let (status, body) = send(test_app(), "GET", "/health/readiness", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ready".into()));
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn test_verify_valid_credential() {
    let credential = sign(unsigned_badge("urn:uuid:a1"));
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/credentials/verify",
        Some(json!({"credential": credential, "publicKeyPem": public_key_pem()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
    assert_eq!(body["proof"]["type"], "DataIntegrityProof");
    assert_eq!(body["proof"]["verificationMethod"], "did:web:badges.example#key-1");
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_verify_tampered_credential_is_invalid() {
    let mut credential = sign(unsigned_badge("urn:uuid:a2"));
    credential["credentialSubject"]["achievement"]["name"] = json!("Forged");
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/credentials/verify",
        Some(json!({"credential": credential, "publicKeyPem": public_key_pem()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "signature verification failed");
}

#[tokio::test]
async fn test_verify_unsigned_credential() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/credentials/verify",
        Some(json!({"credential": unsigned_badge("urn:uuid:a3"), "publicKeyPem": public_key_pem()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], false);
    assert_eq!(body["error"], "credential has no proof");
}

#[tokio::test]
async fn test_verify_requires_public_key() {
    let credential = sign(unsigned_badge("urn:uuid:a4"));
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/credentials/verify",
        Some(json!({"credential": credential})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_verify_unsupported_proof_type() {
    let mut credential = sign(unsigned_badge("urn:uuid:a5"));
    credential["proof"]["type"] = json!("RsaSignature2018");
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/credentials/verify",
        Some(json!({"credential": credential, "publicKeyPem": public_key_pem()})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["message"].as_str().unwrap().contains("RsaSignature2018"));
}

#[tokio::test]
async fn test_verify_malformed_json_is_bad_request() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/credentials/verify")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = test_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Status and Revocation
// ============================================================================

#[tokio::test]
async fn test_revocation_is_reflected_in_verification() {
    let state = test_state();
    let app = ob_api::app(state);

    let (status, with_status) = admin(
        app.clone(),
        "/v1/credentials/status",
        Some(json!({"credential": unsigned_badge("urn:uuid:r1")})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(with_status["credentialStatus"]["type"], "BitstringStatusListEntry");
    assert!(with_status["credentialStatus"]["statusListCredential"]
        .as_str()
        .unwrap()
        .starts_with(BASE_URL));

    let signed = sign(with_status);
    let verify_body = json!({"credential": signed, "publicKeyPem": public_key_pem()});

    let (_, before) = send(app.clone(), "POST", "/v1/credentials/verify", Some(verify_body.clone())).await;
    assert_eq!(before["valid"], true);

    let (status, entry) = admin(app.clone(), "/v1/credentials/urn:uuid:r1/revoke", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["currentStatus"], 1);

    let (status, after) = send(app, "POST", "/v1/credentials/verify", Some(verify_body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(after["valid"], false);
    assert_eq!(after["error"], "credential revoked");
    assert_eq!(after["proof"]["type"], "DataIntegrityProof");
}

#[tokio::test]
async fn test_attach_status_requires_id() {
    let mut badge = unsigned_badge("urn:uuid:x");
    badge.as_object_mut().unwrap().remove("id");
    let (status, _) = admin(test_app(), "/v1/credentials/status", Some(json!({"credential": badge}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_revoke_unknown_credential_is_not_found() {
    let (status, body) = admin(test_app(), "/v1/credentials/urn:uuid:nobody/revoke", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_status_list_publication() {
    let app = test_app();
    for id in ["urn:uuid:s0", "urn:uuid:s1", "urn:uuid:s2"] {
        let (status, _) = admin(app.clone(), "/v1/credentials/status", Some(json!({"credential": unsigned_badge(id)}))).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (_, entry) = admin(app.clone(), "/v1/credentials/urn:uuid:s1/revoke", None).await;
    let list_id = entry["statusListId"].as_str().unwrap().to_string();
    let index = entry["statusListIndex"].as_u64().unwrap();

    let (status, list) = send(app, "GET", &format!("/v1/status-lists/{list_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["type"][1], "BitstringStatusListCredential");
    assert_eq!(list["id"], format!("{BASE_URL}/{list_id}"));
    assert_eq!(list["issuer"], "did:web:badges.example");

    let bits = decode_bitstring(list["credentialSubject"]["encodedList"].as_str().unwrap()).unwrap();
    assert_eq!(bits.len(), 8);
    assert_eq!(bit_at(&bits, index, 1), Some(1));
    assert_eq!(bit_at(&bits, (index + 1) % 3, 1), Some(0));
}

#[tokio::test]
async fn test_status_routes_reject_missing_or_wrong_token() {
    let app = test_app();
    let (status, _) = admin(app.clone(), "/v1/credentials/status", Some(json!({"credential": unsigned_badge("urn:uuid:t1")}))).await;
    assert_eq!(status, StatusCode::OK);

    for authorization in [None, Some("Bearer wrong-token"), Some(TOKEN)] {
        let (status, body) = send_with_auth(
            app.clone(),
            "POST",
            "/v1/credentials/urn:uuid:t1/revoke",
            None,
            authorization,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization:?}");
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, _) = send_with_auth(
            app.clone(),
            "POST",
            "/v1/credentials/status",
            Some(json!({"credential": unsigned_badge("urn:uuid:t2")})),
            authorization,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{authorization:?}");
    }

    // Rejected attempts left the entry untouched.
    let (status, entry) = admin(app, "/v1/credentials/urn:uuid:t1/revoke", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["currentStatus"], 1);
}

#[tokio::test]
async fn test_status_routes_fail_closed_without_configured_token() {
    let app = ob_api::app(AppState::with_config(AppConfig {
        status_list_base_url: BASE_URL.to_string(),
        ..AppConfig::default()
    }));

    let (status, body) = admin(app.clone(), "/v1/credentials/status", Some(json!({"credential": unsigned_badge("urn:uuid:t3")}))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    // Public routes are unaffected.
    let credential = sign(unsigned_badge("urn:uuid:t4"));
    let (status, body) = send(
        app,
        "POST",
        "/v1/credentials/verify",
        Some(json!({"credential": credential, "publicKeyPem": public_key_pem()})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["valid"], true);
}

#[tokio::test]
async fn test_unknown_status_list_is_not_found() {
    let (status, _) = send(test_app(), "GET", "/v1/status-lists/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(
        test_app(),
        "GET",
        "/v1/status-lists/00000000-0000-4000-8000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Baking
// ============================================================================

#[tokio::test]
async fn test_bake_and_unbake_png() {
    let app = test_app();
    let credential = sign(unsigned_badge("urn:uuid:b1"));

    let (status, baked) = send(
        app.clone(),
        "POST",
        "/v1/bake",
        Some(json!({"image": STANDARD.encode(tiny_png()), "credential": credential})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(baked["format"], "png");
    assert_eq!(baked["mimeType"], "image/png");
    let image = STANDARD.decode(baked["image"].as_str().unwrap()).unwrap();
    assert_eq!(baked["size"].as_u64().unwrap() as usize, image.len());

    let (status, unbaked) = send(app, "POST", "/v1/unbake", Some(json!({"image": baked["image"]}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unbaked["found"], true);
    assert_eq!(unbaked["sourceFormat"], "png");
    assert_eq!(unbaked["credential"], credential);
}

#[tokio::test]
async fn test_bake_and_unbake_svg() {
    let app = test_app();
    let credential = sign(unsigned_badge("urn:uuid:b2"));

    let (status, baked) = send(
        app.clone(),
        "POST",
        "/v1/bake",
        Some(json!({"image": STANDARD.encode(SVG), "credential": credential})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(baked["mimeType"], "image/svg+xml");

    let (_, unbaked) = send(app, "POST", "/v1/unbake", Some(json!({"image": baked["image"]}))).await;
    assert_eq!(unbaked["found"], true);
    assert_eq!(unbaked["sourceFormat"], "svg");
    assert_eq!(unbaked["credential"], credential);
}

#[tokio::test]
async fn test_unbake_plain_image_not_found() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/unbake",
        Some(json!({"image": STANDARD.encode(tiny_png())})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["found"], false);
    assert!(body.get("credential").is_none());
}

#[tokio::test]
async fn test_bake_unsupported_format() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/bake",
        Some(json!({"image": STANDARD.encode(b"GIF89a......"), "credential": unsigned_badge("urn:uuid:b3")})),
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["error"]["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn test_bake_rejects_bad_input() {
    let (status, _) = send(
        test_app(),
        "POST",
        "/v1/bake",
        Some(json!({"image": "!!!", "credential": unsigned_badge("urn:uuid:b4")})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        test_app(),
        "POST",
        "/v1/bake",
        Some(json!({"image": STANDARD.encode(SVG), "credential": [1, 2, 3]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bake_malformed_svg_is_unprocessable() {
    let (status, body) = send(
        test_app(),
        "POST",
        "/v1/bake",
        Some(json!({"image": STANDARD.encode("<svg><g></svg>"), "credential": unsigned_badge("urn:uuid:b5")})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}
