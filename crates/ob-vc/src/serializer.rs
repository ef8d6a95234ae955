//! # Credential Serializer
//!
//! Shapes raw issuer, achievement and assertion records into either wire
//! form:
//!
//! - **OB2**: a flat `Assertion` with an embedded `BadgeClass` and issuer
//!   `Profile`, a single-string `@context`, and a `verification` object.
//! - **OB3**: an `OpenBadgeCredential` whose `@context` is exactly
//!   [`OB3_CONTEXTS`] in that order, with the achievement nested under
//!   `credentialSubject`.
//!
//! Recipient identities can be published salted and hashed
//! (`sha256$<hex>` of `identity || salt`), as both versions allow.

use ob_core::{OpenBadgesVersion, Timestamp, OB2_CONTEXT, OB3_CONTEXTS, OB3_CREDENTIAL_TYPES};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};

use crate::credential::Credential;

/// The issuing organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerRecord {
    /// Issuer profile URL or DID.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Homepage.
    #[serde(default)]
    pub url: Option<String>,
    /// Contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// Logo URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// The badge definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementRecord {
    /// BadgeClass / Achievement URL.
    pub id: String,
    /// Badge name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Human-readable criteria.
    #[serde(default)]
    pub criteria_narrative: Option<String>,
    /// Criteria page.
    #[serde(default)]
    pub criteria_url: Option<String>,
    /// Badge image URL.
    #[serde(default)]
    pub image: Option<String>,
    /// OB3 `achievementType` (e.g. `Badge`, `Certificate`).
    #[serde(default)]
    pub achievement_type: Option<String>,
}

/// How the recipient is identified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientRecord {
    /// Email address, URL or DID.
    pub identity: String,
    /// Publish a salted hash instead of the plain identity.
    #[serde(default)]
    pub hashed: bool,
    /// Salt for hashing.
    #[serde(default)]
    pub salt: Option<String>,
}

impl RecipientRecord {
    fn identity_type(&self) -> &'static str {
        if self.identity.starts_with("did:") {
            "did"
        } else if self.identity.starts_with("http://") || self.identity.starts_with("https://") {
            "url"
        } else {
            "email"
        }
    }

    fn published_identity(&self) -> String {
        if self.hashed {
            hash_identity(&self.identity, self.salt.as_deref())
        } else {
            self.identity.clone()
        }
    }
}

/// One award of a badge to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionRecord {
    /// Assertion / credential id (URL or `urn:uuid:`).
    pub id: String,
    /// Recipient.
    pub recipient: RecipientRecord,
    /// Award time.
    pub issued_on: Timestamp,
    /// Expiry.
    #[serde(default)]
    pub expires: Option<Timestamp>,
    /// Evidence URL.
    #[serde(default)]
    pub evidence: Option<String>,
    /// OB2 signed verification: the public key URL. `None` means hosted.
    #[serde(default)]
    pub verification_key: Option<String>,
}

/// `sha256$` followed by the lowercase hex SHA-256 of `identity || salt`.
pub fn hash_identity(identity: &str, salt: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_bytes());
    if let Some(salt) = salt {
        hasher.update(salt.as_bytes());
    }
    let hex: String = hasher.finalize().iter().map(|b| format!("{b:02x}")).collect();
    format!("sha256${hex}")
}

/// Build the wire document for `version`.
pub fn serialize_credential(
    version: OpenBadgesVersion,
    issuer: &IssuerRecord,
    achievement: &AchievementRecord,
    assertion: &AssertionRecord,
) -> Credential {
    let doc = match version {
        OpenBadgesVersion::V2 => ob2_assertion(issuer, achievement, assertion),
        OpenBadgesVersion::V3 => ob3_credential(issuer, achievement, assertion),
    };
    Credential::from_map(doc)
}

fn ob2_assertion(issuer: &IssuerRecord, achievement: &AchievementRecord, assertion: &AssertionRecord) -> Map<String, Value> {
    let mut profile = Map::new();
    profile.insert("type".into(), json!("Issuer"));
    profile.insert("id".into(), json!(issuer.id));
    profile.insert("name".into(), json!(issuer.name));
    insert_opt(&mut profile, "url", issuer.url.as_deref());
    insert_opt(&mut profile, "email", issuer.email.as_deref());
    insert_opt(&mut profile, "image", issuer.image.as_deref());

    let mut criteria = Map::new();
    insert_opt(&mut criteria, "id", achievement.criteria_url.as_deref());
    insert_opt(&mut criteria, "narrative", achievement.criteria_narrative.as_deref());

    let mut badge = Map::new();
    badge.insert("type".into(), json!("BadgeClass"));
    badge.insert("id".into(), json!(achievement.id));
    badge.insert("name".into(), json!(achievement.name));
    badge.insert("description".into(), json!(achievement.description));
    insert_opt(&mut badge, "image", achievement.image.as_deref());
    badge.insert("criteria".into(), Value::Object(criteria));
    badge.insert("issuer".into(), Value::Object(profile));

    let recipient = &assertion.recipient;
    let mut recipient_obj = Map::new();
    recipient_obj.insert("type".into(), json!(recipient.identity_type()));
    recipient_obj.insert("hashed".into(), json!(recipient.hashed));
    if recipient.hashed {
        insert_opt(&mut recipient_obj, "salt", recipient.salt.as_deref());
    }
    recipient_obj.insert("identity".into(), json!(recipient.published_identity()));

    let verification = match &assertion.verification_key {
        Some(key) => json!({"type": "signed", "creator": key}),
        None => json!({"type": "hosted"}),
    };

    let mut doc = Map::new();
    doc.insert("@context".into(), json!(OB2_CONTEXT));
    doc.insert("type".into(), json!("Assertion"));
    doc.insert("id".into(), json!(assertion.id));
    doc.insert("recipient".into(), Value::Object(recipient_obj));
    doc.insert("badge".into(), Value::Object(badge));
    doc.insert("issuedOn".into(), json!(assertion.issued_on.to_iso8601()));
    if let Some(expires) = &assertion.expires {
        doc.insert("expires".into(), json!(expires.to_iso8601()));
    }
    insert_opt(&mut doc, "evidence", assertion.evidence.as_deref());
    doc.insert("verification".into(), verification);
    doc
}

fn ob3_credential(issuer: &IssuerRecord, achievement: &AchievementRecord, assertion: &AssertionRecord) -> Map<String, Value> {
    let mut profile = Map::new();
    profile.insert("id".into(), json!(issuer.id));
    profile.insert("type".into(), json!(["Profile"]));
    profile.insert("name".into(), json!(issuer.name));
    insert_opt(&mut profile, "url", issuer.url.as_deref());
    insert_opt(&mut profile, "email", issuer.email.as_deref());
    if let Some(image) = &issuer.image {
        profile.insert("image".into(), json!({"id": image, "type": "Image"}));
    }

    let mut criteria = Map::new();
    insert_opt(&mut criteria, "id", achievement.criteria_url.as_deref());
    insert_opt(&mut criteria, "narrative", achievement.criteria_narrative.as_deref());

    let mut ach = Map::new();
    ach.insert("id".into(), json!(achievement.id));
    ach.insert("type".into(), json!(["Achievement"]));
    ach.insert("name".into(), json!(achievement.name));
    ach.insert("description".into(), json!(achievement.description));
    ach.insert("criteria".into(), Value::Object(criteria));
    if let Some(image) = &achievement.image {
        ach.insert("image".into(), json!({"id": image, "type": "Image"}));
    }
    insert_opt(&mut ach, "achievementType", achievement.achievement_type.as_deref());

    let recipient = &assertion.recipient;
    let mut subject = Map::new();
    if recipient.identity_type() == "did" && !recipient.hashed {
        subject.insert("id".into(), json!(recipient.identity));
    }
    subject.insert("type".into(), json!(["AchievementSubject"]));
    if !subject.contains_key("id") {
        let identity_type = match recipient.identity_type() {
            "email" => "emailAddress",
            "url" => "url",
            _ => "did",
        };
        let mut identifier = Map::new();
        identifier.insert("type".into(), json!("IdentityObject"));
        identifier.insert("identityHash".into(), json!(recipient.published_identity()));
        identifier.insert("identityType".into(), json!(identity_type));
        identifier.insert("hashed".into(), json!(recipient.hashed));
        if recipient.hashed {
            insert_opt(&mut identifier, "salt", recipient.salt.as_deref());
        }
        subject.insert("identifier".into(), json!([identifier]));
    }
    subject.insert("achievement".into(), Value::Object(ach));

    let mut doc = Map::new();
    doc.insert("@context".into(), json!(OB3_CONTEXTS));
    doc.insert("id".into(), json!(assertion.id));
    doc.insert("type".into(), json!(OB3_CREDENTIAL_TYPES));
    doc.insert("name".into(), json!(achievement.name));
    doc.insert("issuer".into(), Value::Object(profile));
    doc.insert("validFrom".into(), json!(assertion.issued_on.to_iso8601()));
    if let Some(expires) = &assertion.expires {
        doc.insert("validUntil".into(), json!(expires.to_iso8601()));
    }
    doc.insert("credentialSubject".into(), Value::Object(subject));
    if let Some(evidence) = &assertion.evidence {
        doc.insert("evidence".into(), json!([{"id": evidence, "type": ["Evidence"]}]));
    }
    doc
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(v) = value {
        map.insert(key.to_string(), json!(v));
    }
}
