//! # Status List Allocator
//!
//! Hands out status list slots to credentials at issuance and flips their
//! status afterwards.
//!
//! ## Allocation
//!
//! 1. Return the credential's existing entry for the purpose, if any.
//! 2. Take the oldest open list for the purpose, or create one.
//! 3. Claim the list's current cursor through the store's compare-and-swap.
//! 4. On `Conflict` or `ListFull`, start over from step 1 with a fresh
//!    cursor, at most `max_retries` more times.
//!
//! The allocator is stateless; every guarantee comes from
//! [`StatusStore::claim_index`].

use std::sync::Arc;

use ob_vc::{Credential, CredentialStatus};
use uuid::Uuid;

use crate::error::StatusError;
use crate::model::{StatusList, StatusListEntry, StatusPurpose, DEFAULT_CAPACITY, DEFAULT_STATUS_SIZE};
use crate::store::StatusStore;

/// Default number of retries after a lost race.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// `type` of the `credentialStatus` object attached at issuance.
pub const STATUS_ENTRY_TYPE: &str = "BitstringStatusListEntry";

/// Assigns and updates status list entries on top of a [`StatusStore`].
#[derive(Clone)]
pub struct StatusAllocator {
    store: Arc<dyn StatusStore>,
    capacity: u64,
    status_size: u8,
    max_retries: u32,
}

impl std::fmt::Debug for StatusAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusAllocator")
            .field("capacity", &self.capacity)
            .field("status_size", &self.status_size)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl StatusAllocator {
    /// Allocator over `store` with the default capacity, status size and
    /// retry budget.
    pub fn new(store: Arc<dyn StatusStore>) -> Self {
        Self {
            store,
            capacity: DEFAULT_CAPACITY,
            status_size: DEFAULT_STATUS_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Capacity of lists created from now on. Zero is treated as one.
    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Retries after a lost race.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Give `credential_id` a slot for `purpose`.
    ///
    /// Idempotent: a credential that already holds an entry for the purpose
    /// gets that entry back.
    ///
    /// # Errors
    ///
    /// The last [`StatusError::Conflict`] or [`StatusError::ListFull`] once
    /// retries are exhausted, or any store failure immediately.
    pub async fn assign_status(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
    ) -> Result<StatusListEntry, StatusError> {
        let mut attempt = 0;
        loop {
            if let Some(existing) = self.store.entry_for(credential_id, purpose).await? {
                return Ok(existing);
            }
            let list = self.open_or_create(purpose).await?;
            match self.store.claim_index(list.id, list.next_index, credential_id).await {
                Ok(entry) => {
                    tracing::debug!(
                        credential_id,
                        list_id = %entry.status_list_id,
                        index = entry.status_list_index,
                        purpose = %purpose,
                        "status index assigned"
                    );
                    return Ok(entry);
                }
                Err(err @ (StatusError::Conflict { .. } | StatusError::ListFull { .. }))
                    if attempt < self.max_retries =>
                {
                    attempt += 1;
                    tracing::debug!(credential_id, attempt, error = %err, "status claim lost, retrying");
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn open_or_create(&self, purpose: StatusPurpose) -> Result<StatusList, StatusError> {
        if let Some(list) = self.store.open_list(purpose).await? {
            return Ok(list);
        }
        let list = self
            .store
            .create_list(purpose, self.status_size, self.capacity)
            .await?;
        tracing::info!(list_id = %list.id, purpose = %purpose, capacity = list.capacity, "status list created");
        Ok(list)
    }

    /// Set the credential's status for `purpose` (1 = revoked / suspended).
    ///
    /// Revocation cannot be undone: clearing a set revocation entry is a
    /// [`StatusError::Conflict`].
    pub async fn set_status(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
        status: u8,
    ) -> Result<StatusListEntry, StatusError> {
        if purpose == StatusPurpose::Revocation && status == 0 {
            if let Some(current) = self.store.entry_for(credential_id, purpose).await? {
                if current.is_set() {
                    return Err(StatusError::Conflict {
                        list_id: current.status_list_id,
                        reason: format!("{credential_id} is revoked; revocation is permanent"),
                    });
                }
            }
        }
        let entry = self.store.update_status(credential_id, purpose, status).await?;
        tracing::info!(
            credential_id,
            purpose = %purpose,
            status,
            list_id = %entry.status_list_id,
            index = entry.status_list_index,
            "credential status updated"
        );
        Ok(entry)
    }

    /// The credential's entry for `purpose`.
    pub async fn status_of(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
    ) -> Result<Option<StatusListEntry>, StatusError> {
        self.store.entry_for(credential_id, purpose).await
    }

    /// The entry at `index` of `status_list_id`.
    pub async fn lookup(
        &self,
        status_list_id: Uuid,
        index: u64,
    ) -> Result<Option<StatusListEntry>, StatusError> {
        self.store.entry_at(status_list_id, index).await
    }

    /// The stored entry a credential's `credentialStatus` points at.
    ///
    /// `None` for lists this store does not hold, or a malformed index.
    pub async fn resolve(&self, status: &CredentialStatus) -> Result<Option<StatusListEntry>, StatusError> {
        let (Some(list_id), Some(index)) = (list_id_from_url(&status.status_list_credential), status.index())
        else {
            return Ok(None);
        };
        Ok(self
            .lookup(list_id, index)
            .await?
            .filter(|entry| entry.purpose.as_str() == status.status_purpose))
    }
}

/// The list id at the end of a `statusListCredential` URL.
pub fn list_id_from_url(url: &str) -> Option<Uuid> {
    let path = url.split(['#', '?']).next()?;
    Uuid::parse_str(path.trim_end_matches('/').rsplit('/').next()?).ok()
}

/// URL of a status list credential under `base_url`.
pub fn status_list_url(base_url: &str, list_id: Uuid) -> String {
    format!("{}/{list_id}", base_url.trim_end_matches('/'))
}

/// The `credentialStatus` object for `entry`.
pub fn credential_status_for(entry: &StatusListEntry, base_url: &str) -> CredentialStatus {
    let list_url = status_list_url(base_url, entry.status_list_id);
    CredentialStatus {
        id: Some(format!("{list_url}#{}", entry.status_list_index)),
        status_type: STATUS_ENTRY_TYPE.to_string(),
        status_purpose: entry.purpose.as_str().to_string(),
        status_list_index: entry.status_list_index.to_string(),
        status_list_credential: list_url,
    }
}

/// Attach a revocation `credentialStatus` to `credential`.
///
/// Status is an optional enrichment: when allocation fails the credential
/// is returned unchanged and the failure is logged. Must run before the
/// credential is signed, since `credentialStatus` is covered by the proof.
pub async fn issue_with_status(
    mut credential: Credential,
    allocator: &StatusAllocator,
    base_url: &str,
) -> Credential {
    let Some(credential_id) = credential.id().map(str::to_owned) else {
        tracing::warn!("credential has no id, issuing without status");
        return credential;
    };

    let entry = match allocator
        .assign_status(&credential_id, StatusPurpose::Revocation)
        .await
    {
        Ok(entry) => entry,
        Err(err) => {
            tracing::warn!(credential_id, error = %err, "status allocation failed, issuing without status");
            return credential;
        }
    };

    let status = credential_status_for(&entry, base_url);
    if let Err(err) = credential.set_credential_status(&status) {
        tracing::warn!(credential_id, error = %err, "could not attach credentialStatus");
    }
    credential
}
