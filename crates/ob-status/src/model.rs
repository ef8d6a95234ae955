//! # Status List Records
//!
//! A [`StatusList`] is a fixed-capacity run of indices for one purpose.
//! Every credential that carries a status owns exactly one
//! [`StatusListEntry`] per purpose. Indices are handed out densely from
//! `nextIndex` and never reused.

use ob_core::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default list capacity: 131 072 entries, the 16 KiB minimum of the W3C
/// Bitstring Status List (which gives holders herd privacy).
pub const DEFAULT_CAPACITY: u64 = 131_072;

/// Default bits per entry.
pub const DEFAULT_STATUS_SIZE: u8 = 1;

/// What a set bit means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusPurpose {
    /// Permanent. Once set the credential never becomes valid again.
    Revocation,
    /// Reversible hold.
    Suspension,
}

impl StatusPurpose {
    /// Wire name used in `statusPurpose`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revocation => "revocation",
            Self::Suspension => "suspension",
        }
    }

    /// Parse a wire name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "revocation" => Some(Self::Revocation),
            "suspension" => Some(Self::Suspension),
            _ => None,
        }
    }
}

impl std::fmt::Display for StatusPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StatusPurpose {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown status purpose: {s}"))
    }
}

/// One status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusList {
    pub id: Uuid,
    pub purpose: StatusPurpose,
    /// Bits per entry.
    pub status_size: u8,
    /// Number of entries the list can hold.
    pub capacity: u64,
    /// Next index to hand out.
    pub next_index: u64,
    pub created_at: Timestamp,
}

impl StatusList {
    /// A fresh, empty list.
    pub fn new(purpose: StatusPurpose, status_size: u8, capacity: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            purpose,
            status_size,
            capacity,
            next_index: 0,
            created_at: Timestamp::now(),
        }
    }

    /// Whether an index is still free.
    pub fn is_open(&self) -> bool {
        self.next_index < self.capacity
    }

    /// Largest value an entry can hold.
    pub fn max_status(&self) -> u8 {
        match self.status_size {
            0 => 0,
            s if s >= 8 => u8::MAX,
            s => (1u8 << s) - 1,
        }
    }
}

/// A credential's slot in a status list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusListEntry {
    pub credential_id: String,
    pub status_list_id: Uuid,
    pub status_list_index: u64,
    pub status_size: u8,
    pub purpose: StatusPurpose,
    /// Zero is "not revoked / not suspended".
    pub current_status: u8,
    pub created_at: Timestamp,
}

impl StatusListEntry {
    /// Whether the status bit is set.
    pub fn is_set(&self) -> bool {
        self.current_status != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purpose_wire_names() {
        assert_eq!(StatusPurpose::Revocation.as_str(), "revocation");
        assert_eq!(
            "suspension".parse::<StatusPurpose>().unwrap(),
            StatusPurpose::Suspension
        );
        assert!("refresh".parse::<StatusPurpose>().is_err());
        assert_eq!(
            serde_json::to_string(&StatusPurpose::Revocation).unwrap(),
            "\"revocation\""
        );
    }

    #[test]
    fn new_list_is_open_and_empty() {
        let list = StatusList::new(StatusPurpose::Revocation, 1, 2);
        assert!(list.is_open());
        assert_eq!(list.next_index, 0);
        assert_eq!(list.max_status(), 1);

        let full = StatusList { next_index: 2, ..list };
        assert!(!full.is_open());
    }

    #[test]
    fn max_status_follows_status_size() {
        let mut list = StatusList::new(StatusPurpose::Suspension, 2, 8);
        assert_eq!(list.max_status(), 3);
        list.status_size = 8;
        assert_eq!(list.max_status(), 255);
    }

    #[test]
    fn entry_serializes_camel_case() {
        let entry = StatusListEntry {
            credential_id: "urn:uuid:1".into(),
            status_list_id: Uuid::nil(),
            status_list_index: 7,
            status_size: 1,
            purpose: StatusPurpose::Revocation,
            current_status: 0,
            created_at: Timestamp::from_epoch_secs(0).unwrap(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["statusListIndex"], 7);
        assert_eq!(json["currentStatus"], 0);
        assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
        assert!(!entry.is_set());
    }
}
