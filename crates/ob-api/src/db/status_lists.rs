//! Status list persistence.
//!
//! [`PgStatusStore`] operates on the `status_lists` and
//! `status_list_entries` tables. A claim runs in one transaction that locks
//! the list row (`SELECT … FOR UPDATE`), inserts the entry and advances the
//! cursor. `UNIQUE (status_list_id, status_list_index)` backs the row lock:
//! a duplicate slot surfaces as a unique violation and becomes
//! [`StatusError::Conflict`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ob_core::Timestamp;
use ob_status::{
    check_status_fits, StatusError, StatusList, StatusListEntry, StatusPurpose, StatusStore,
};
use sqlx::PgPool;
use uuid::Uuid;

/// Postgres-backed [`StatusStore`].
#[derive(Debug, Clone)]
pub struct PgStatusStore {
    pool: PgPool,
}

impl PgStatusStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn store_err(err: sqlx::Error) -> StatusError {
    StatusError::Store(err.to_string())
}

fn to_i64(value: u64, what: &str) -> Result<i64, StatusError> {
    i64::try_from(value).map_err(|_| StatusError::Store(format!("{what} {value} out of range")))
}

#[derive(sqlx::FromRow)]
struct ListRow {
    id: Uuid,
    purpose: String,
    status_size: i16,
    capacity: i64,
    next_index: i64,
    created_at: DateTime<Utc>,
}

impl ListRow {
    fn into_record(self) -> Result<StatusList, StatusError> {
        Ok(StatusList {
            id: self.id,
            purpose: parse_purpose(&self.purpose)?,
            status_size: u8::try_from(self.status_size)
                .map_err(|_| StatusError::Store(format!("bad status_size {}", self.status_size)))?,
            capacity: u64::try_from(self.capacity)
                .map_err(|_| StatusError::Store(format!("bad capacity {}", self.capacity)))?,
            next_index: u64::try_from(self.next_index)
                .map_err(|_| StatusError::Store(format!("bad next_index {}", self.next_index)))?,
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    credential_id: String,
    status_list_id: Uuid,
    status_list_index: i64,
    status_size: i16,
    purpose: String,
    current_status: i16,
    created_at: DateTime<Utc>,
}

impl EntryRow {
    fn into_record(self) -> Result<StatusListEntry, StatusError> {
        Ok(StatusListEntry {
            credential_id: self.credential_id,
            status_list_id: self.status_list_id,
            status_list_index: u64::try_from(self.status_list_index)
                .map_err(|_| StatusError::Store(format!("bad index {}", self.status_list_index)))?,
            status_size: u8::try_from(self.status_size)
                .map_err(|_| StatusError::Store(format!("bad status_size {}", self.status_size)))?,
            purpose: parse_purpose(&self.purpose)?,
            current_status: u8::try_from(self.current_status)
                .map_err(|_| StatusError::Store(format!("bad status {}", self.current_status)))?,
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}

fn parse_purpose(s: &str) -> Result<StatusPurpose, StatusError> {
    StatusPurpose::parse(s).ok_or_else(|| StatusError::Store(format!("unknown purpose {s:?}")))
}

const LIST_COLUMNS: &str = "id, purpose, status_size, capacity, next_index, created_at";
const ENTRY_COLUMNS: &str =
    "credential_id, status_list_id, status_list_index, status_size, purpose, current_status, created_at";

#[async_trait]
impl StatusStore for PgStatusStore {
    async fn open_list(&self, purpose: StatusPurpose) -> Result<Option<StatusList>, StatusError> {
        let row = sqlx::query_as::<_, ListRow>(&format!(
            "SELECT {LIST_COLUMNS} FROM status_lists
             WHERE purpose = $1 AND next_index < capacity
             ORDER BY created_at, id LIMIT 1"
        ))
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(ListRow::into_record).transpose()
    }

    async fn create_list(
        &self,
        purpose: StatusPurpose,
        status_size: u8,
        capacity: u64,
    ) -> Result<StatusList, StatusError> {
        let list = StatusList::new(purpose, status_size, capacity);
        sqlx::query(
            "INSERT INTO status_lists (id, purpose, status_size, capacity, next_index, created_at)
             VALUES ($1, $2, $3, $4, 0, $5)",
        )
        .bind(list.id)
        .bind(purpose.as_str())
        .bind(i16::from(status_size))
        .bind(to_i64(capacity, "capacity")?)
        .bind(*list.created_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(store_err)?;

        Ok(list)
    }

    async fn claim_index(
        &self,
        list_id: Uuid,
        expected_index: u64,
        credential_id: &str,
    ) -> Result<StatusListEntry, StatusError> {
        let mut tx = self.pool.begin().await.map_err(store_err)?;

        let list = sqlx::query_as::<_, ListRow>(&format!(
            "SELECT {LIST_COLUMNS} FROM status_lists WHERE id = $1 FOR UPDATE"
        ))
        .bind(list_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(store_err)?
        .ok_or_else(|| StatusError::NotFound(format!("status list {list_id}")))?
        .into_record()?;

        if !list.is_open() {
            return Err(StatusError::ListFull { list_id });
        }
        if list.next_index != expected_index {
            return Err(StatusError::Conflict {
                list_id,
                reason: format!("cursor at {}, expected {expected_index}", list.next_index),
            });
        }

        let created_at = Timestamp::now();
        let inserted = sqlx::query(
            "INSERT INTO status_list_entries
             (credential_id, status_list_id, status_list_index, status_size, purpose, current_status, created_at)
             VALUES ($1, $2, $3, $4, $5, 0, $6)",
        )
        .bind(credential_id)
        .bind(list_id)
        .bind(to_i64(expected_index, "index")?)
        .bind(i16::from(list.status_size))
        .bind(list.purpose.as_str())
        .bind(*created_at.as_datetime())
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            let unique = err
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            return Err(if unique {
                StatusError::Conflict {
                    list_id,
                    reason: format!("slot {expected_index} or credential {credential_id} already taken"),
                }
            } else {
                store_err(err)
            });
        }

        sqlx::query("UPDATE status_lists SET next_index = next_index + 1 WHERE id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await
            .map_err(store_err)?;

        tx.commit().await.map_err(store_err)?;

        Ok(StatusListEntry {
            credential_id: credential_id.to_string(),
            status_list_id: list_id,
            status_list_index: expected_index,
            status_size: list.status_size,
            purpose: list.purpose,
            current_status: 0,
            created_at,
        })
    }

    async fn entry_for(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
    ) -> Result<Option<StatusListEntry>, StatusError> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM status_list_entries
             WHERE credential_id = $1 AND purpose = $2"
        ))
        .bind(credential_id)
        .bind(purpose.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(EntryRow::into_record).transpose()
    }

    async fn entry_at(&self, list_id: Uuid, index: u64) -> Result<Option<StatusListEntry>, StatusError> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM status_list_entries
             WHERE status_list_id = $1 AND status_list_index = $2"
        ))
        .bind(list_id)
        .bind(to_i64(index, "index")?)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(EntryRow::into_record).transpose()
    }

    async fn entries_for_list(&self, list_id: Uuid) -> Result<Vec<StatusListEntry>, StatusError> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM status_list_entries
             WHERE status_list_id = $1 ORDER BY status_list_index"
        ))
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;

        rows.into_iter().map(EntryRow::into_record).collect()
    }

    async fn update_status(
        &self,
        credential_id: &str,
        purpose: StatusPurpose,
        status: u8,
    ) -> Result<StatusListEntry, StatusError> {
        let current = self
            .entry_for(credential_id, purpose)
            .await?
            .ok_or_else(|| StatusError::NotFound(format!("{purpose} entry for {credential_id}")))?;
        check_status_fits(status, current.status_size)?;

        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "UPDATE status_list_entries SET current_status = $3
             WHERE credential_id = $1 AND purpose = $2
             RETURNING {ENTRY_COLUMNS}"
        ))
        .bind(credential_id)
        .bind(purpose.as_str())
        .bind(i16::from(status))
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;

        row.into_record()
    }

    async fn get_list(&self, list_id: Uuid) -> Result<Option<StatusList>, StatusError> {
        let row = sqlx::query_as::<_, ListRow>(&format!(
            "SELECT {LIST_COLUMNS} FROM status_lists WHERE id = $1"
        ))
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;

        row.map(ListRow::into_record).transpose()
    }
}
