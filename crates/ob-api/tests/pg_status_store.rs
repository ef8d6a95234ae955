//! Concurrent allocation against PostgreSQL.
//!
//! Needs a live database:
//!
//! ```text
//! DATABASE_URL=postgres://... cargo test -p ob-api --test pg_status_store -- --ignored
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use ob_api::db::{init_pool, PgStatusStore};
use ob_status::{StatusAllocator, StatusError, StatusPurpose, StatusStore};
use uuid::Uuid;

async fn store() -> Arc<PgStatusStore> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for Postgres tests");
    let pool = init_pool(Some(&url)).await.unwrap().expect("pool");
    Arc::new(PgStatusStore::new(pool))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn pg_concurrent_claims_never_share_an_index() {
    let store = store().await;
    let allocator = StatusAllocator::new(store.clone()).with_capacity(32);
    let run = Uuid::new_v4();

    let mut handles = Vec::new();
    for i in 0..64 {
        let allocator = allocator.clone();
        let id = format!("urn:uuid:{run}-{i}");
        handles.push(tokio::spawn(async move {
            let outcome = allocator.assign_status(&id, StatusPurpose::Suspension).await;
            (id, outcome)
        }));
    }

    let mut claimed = HashMap::new();
    let mut gave_up = Vec::new();
    for handle in handles {
        let (id, outcome) = handle.await.unwrap();
        match outcome {
            Ok(entry) => {
                let slot = (entry.status_list_id, entry.status_list_index);
                if let Some(previous) = claimed.insert(slot, id.clone()) {
                    panic!("{slot:?} claimed by both {previous} and {id}");
                }
            }
            Err(StatusError::Conflict { .. } | StatusError::ListFull { .. }) => gave_up.push(id),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    for id in gave_up {
        assert!(store.entry_for(&id, StatusPurpose::Suspension).await.unwrap().is_none());
    }

    // The database agrees: every touched list has distinct indices.
    let lists: HashSet<Uuid> = claimed.keys().map(|(list_id, _)| *list_id).collect();
    for list_id in lists {
        let entries = store.entries_for_list(list_id).await.unwrap();
        let indices: HashSet<u64> = entries.iter().map(|e| e.status_list_index).collect();
        assert_eq!(indices.len(), entries.len(), "duplicate index in list {list_id}");
        for ((claimed_list, index), id) in &claimed {
            if *claimed_list == list_id {
                let stored = entries.iter().find(|e| e.status_list_index == *index).unwrap();
                assert_eq!(&stored.credential_id, id);
            }
        }
    }
}
