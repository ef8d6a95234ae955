//! # Status Store Contract
//!
//! [`StatusStore`] is the persistence seam of the allocator. The allocator
//! itself holds no state: the cursor of every list lives behind the store's
//! transactional boundary, and [`StatusStore::claim_index`] is the only
//! operation that moves it.
//!
//! `claim_index` is a compare-and-swap. The caller passes the cursor it
//! observed; the store inserts the entry and advances the cursor only if the
//! cursor is still there, and reports [`StatusError::Conflict`] otherwise.
//! Two writers can therefore never receive the same
//! `(statusListId, statusListIndex)`.
//!
//! [`MemoryStatusStore`] serializes claims with a `parking_lot::Mutex`.
//! The Postgres store in `ob-api` uses a row lock and a unique constraint.

use std::collections::HashMap;

use async_trait::async_trait;
use ob_core::Timestamp;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::error::StatusError;
use crate::model::{StatusList, StatusListEntry, StatusPurpose};

/// Persistence for status lists and their entries.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// The oldest list for `purpose` that still has a free index.
    async fn open_list(&self, purpose: StatusPurpose) -> Result<Option<StatusList>, StatusError>;

    /// Create an empty list.
    async fn create_list(
        &self,
        purpose: StatusPurpose,
        status_size: u8,
        capacity: u64,
    ) -> Result<StatusList, StatusError>;

    /// Atomically claim `expected_index` in `list_id` for `credential_id`.
    ///
    /// The entry takes the list's purpose and starts at status 0.
    ///
    /// # Errors
    ///
    /// - [`StatusError::NotFound`] if the list does not exist.
    /// - [`StatusError::ListFull`] if the list is exhausted.
    /// - [`StatusError::Conflict`] if the cursor is no longer at
    ///   `expected_index`, or the credential already holds an entry for the
    ///   list's purpose.
    async fn claim_index(
        &self,
        list_id: Uuid,
        expected_index: u64,
        credential_id: &str,
    ) -> Result<StatusListEntry, StatusError>;

    /// The entry of `credential_id` for `purpose`.
    async fn entry_for(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
    ) -> Result<Option<StatusListEntry>, StatusError>;

    /// The entry at `index` of `list_id`.
    async fn entry_at(&self, list_id: Uuid, index: u64) -> Result<Option<StatusListEntry>, StatusError>;

    /// Every entry of `list_id`, ordered by index.
    async fn entries_for_list(&self, list_id: Uuid) -> Result<Vec<StatusListEntry>, StatusError>;

    /// Set `currentStatus` of the credential's entry for `purpose`.
    ///
    /// # Errors
    ///
    /// - [`StatusError::NotFound`] if the credential has no such entry.
    /// - [`StatusError::InvalidStatus`] if `status` exceeds `statusSize` bits.
    async fn update_status(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
        status: u8,
    ) -> Result<StatusListEntry, StatusError>;

    /// A list by id.
    async fn get_list(&self, list_id: Uuid) -> Result<Option<StatusList>, StatusError>;
}

#[derive(Debug, Default)]
struct Inner {
    /// Creation order.
    lists: Vec<StatusList>,
    entries: HashMap<(String, StatusPurpose), StatusListEntry>,
    slots: HashMap<(Uuid, u64), (String, StatusPurpose)>,
}

impl Inner {
    fn list_mut(&mut self, list_id: Uuid) -> Option<&mut StatusList> {
        self.lists.iter_mut().find(|l| l.id == list_id)
    }
}

/// In-process [`StatusStore`].
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    inner: Mutex<Inner>,
}

impl MemoryStatusStore {
    /// Empty store with no lists.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lists created so far.
    pub fn list_count(&self) -> usize {
        self.inner.lock().lists.len()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn open_list(&self, purpose: StatusPurpose) -> Result<Option<StatusList>, StatusError> {
        let inner = self.inner.lock();
        Ok(inner
            .lists
            .iter()
            .find(|l| l.purpose == purpose && l.is_open())
            .cloned())
    }

    async fn create_list(
        &self,
        purpose: StatusPurpose,
        status_size: u8,
        capacity: u64,
    ) -> Result<StatusList, StatusError> {
        let list = StatusList::new(purpose, status_size, capacity);
        self.inner.lock().lists.push(list.clone());
        Ok(list)
    }

    async fn claim_index(
        &self,
        list_id: Uuid,
        expected_index: u64,
        credential_id: &str,
    ) -> Result<StatusListEntry, StatusError> {
        let mut inner = self.inner.lock();
        let list = inner
            .list_mut(list_id)
            .ok_or_else(|| StatusError::NotFound(format!("status list {list_id}")))?
            .clone();

        if !list.is_open() {
            return Err(StatusError::ListFull { list_id });
        }
        if list.next_index != expected_index {
            return Err(StatusError::Conflict {
                list_id,
                reason: format!("cursor at {}, expected {expected_index}", list.next_index),
            });
        }
        let key = (credential_id.to_string(), list.purpose);
        if inner.entries.contains_key(&key) {
            return Err(StatusError::Conflict {
                list_id,
                reason: format!("{credential_id} already has a {} entry", list.purpose),
            });
        }

        let entry = StatusListEntry {
            credential_id: credential_id.to_string(),
            status_list_id: list_id,
            status_list_index: expected_index,
            status_size: list.status_size,
            purpose: list.purpose,
            current_status: 0,
            created_at: Timestamp::now(),
        };
        inner.slots.insert((list_id, expected_index), key.clone());
        inner.entries.insert(key, entry.clone());
        if let Some(l) = inner.list_mut(list_id) {
            l.next_index += 1;
        }
        Ok(entry)
    }

    async fn entry_for(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
    ) -> Result<Option<StatusListEntry>, StatusError> {
        let inner = self.inner.lock();
        Ok(inner.entries.get(&(credential_id.to_string(), purpose)).cloned())
    }

    async fn entry_at(&self, list_id: Uuid, index: u64) -> Result<Option<StatusListEntry>, StatusError> {
        let inner = self.inner.lock();
        Ok(inner
            .slots
            .get(&(list_id, index))
            .and_then(|key| inner.entries.get(key))
            .cloned())
    }

    async fn entries_for_list(&self, list_id: Uuid) -> Result<Vec<StatusListEntry>, StatusError> {
        let inner = self.inner.lock();
        let mut entries: Vec<StatusListEntry> = inner
            .entries
            .values()
            .filter(|e| e.status_list_id == list_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| e.status_list_index);
        Ok(entries)
    }

    async fn update_status(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
        status: u8,
    ) -> Result<StatusListEntry, StatusError> {
        let mut inner = self.inner.lock();
        let entry = inner
            .entries
            .get_mut(&(credential_id.to_string(), purpose))
            .ok_or_else(|| StatusError::NotFound(format!("{purpose} entry for {credential_id}")))?;
        check_status_fits(status, entry.status_size)?;
        entry.current_status = status;
        Ok(entry.clone())
    }

    async fn get_list(&self, list_id: Uuid) -> Result<Option<StatusList>, StatusError> {
        let inner = self.inner.lock();
        Ok(inner.lists.iter().find(|l| l.id == list_id).cloned())
    }
}

/// Reject values wider than `status_size` bits.
pub fn check_status_fits(status: u8, status_size: u8) -> Result<(), StatusError> {
    let fits = status_size >= 8 || u16::from(status) < (1u16 << status_size);
    if fits {
        Ok(())
    } else {
        Err(StatusError::InvalidStatus { status, status_size })
    }
}
