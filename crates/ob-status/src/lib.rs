//! # ob-status: Bitstring Status Lists
//!
//! Revocation and suspension for issued credentials, following the W3C
//! Bitstring Status List model:
//!
//! - [`StatusAllocator`] gives each credential a unique slot at issuance
//!   and flips its status afterwards.
//! - [`StatusStore`] is the persistence contract. [`MemoryStatusStore`]
//!   ships here; the Postgres store lives with the API service.
//! - [`encode_bitstring`] and [`status_list_credential`] publish a list.
//!
//! ## Invariant
//!
//! No two credentials ever receive the same `(statusListId,
//! statusListIndex)`, however many allocators race on the same store.

pub mod allocator;
pub mod bitstring;
pub mod error;
pub mod model;
pub mod store;

pub use allocator::{
    credential_status_for, issue_with_status, list_id_from_url, status_list_url, StatusAllocator,
    DEFAULT_MAX_RETRIES, STATUS_ENTRY_TYPE,
};
pub use bitstring::{
    bit_at, decode_bitstring, encode_bitstring, status_list_credential,
    STATUS_LIST_CREDENTIAL_TYPE, STATUS_LIST_SUBJECT_TYPE,
};
pub use error::StatusError;
pub use model::{StatusList, StatusListEntry, StatusPurpose, DEFAULT_CAPACITY, DEFAULT_STATUS_SIZE};
pub use store::{check_status_fits, MemoryStatusStore, StatusStore};
