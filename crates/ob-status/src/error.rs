//! Status list errors.

use thiserror::Error;
use uuid::Uuid;

/// Errors from status list allocation, storage and encoding.
#[derive(Error, Debug)]
pub enum StatusError {
    /// The list has no free index left.
    #[error("status list {list_id} is full")]
    ListFull {
        /// The exhausted list.
        list_id: Uuid,
    },

    /// Another writer claimed the index first, or the credential already
    /// holds an entry for this purpose.
    #[error("status list {list_id} changed concurrently: {reason}")]
    Conflict {
        /// The contended list.
        list_id: Uuid,
        /// What moved.
        reason: String,
    },

    /// No list or entry matches.
    #[error("not found: {0}")]
    NotFound(String),

    /// A status value does not fit in the list's `statusSize` bits.
    #[error("status {status} does not fit in {status_size} bit(s)")]
    InvalidStatus {
        /// Requested value.
        status: u8,
        /// Bits per entry.
        status_size: u8,
    },

    /// The backing store failed.
    #[error("status store error: {0}")]
    Store(String),

    /// The encoded list could not be built or read.
    #[error("status list encoding error: {0}")]
    Encoding(String),
}
