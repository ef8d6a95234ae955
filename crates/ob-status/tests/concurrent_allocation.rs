//! Concurrent allocation against a shared store.

use std::collections::HashSet;
use std::sync::Arc;

use ob_status::{
    bit_at, decode_bitstring, encode_bitstring, MemoryStatusStore, StatusAllocator, StatusError,
    StatusPurpose, StatusStore,
};

// ============================================================================
// Uniqueness under contention
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assignments_never_share_a_slot() {
    let store = Arc::new(MemoryStatusStore::new());
    let allocator = StatusAllocator::new(store.clone()).with_max_retries(64);

    let mut handles = Vec::new();
    for i in 0..200 {
        let allocator = allocator.clone();
        handles.push(tokio::spawn(async move {
            allocator
                .assign_status(&format!("urn:uuid:cred-{i}"), StatusPurpose::Revocation)
                .await
        }));
    }

    let mut slots = HashSet::new();
    for handle in handles {
        let entry = handle.await.unwrap().unwrap();
        assert!(
            slots.insert((entry.status_list_id, entry.status_list_index)),
            "duplicate slot {:?}",
            (entry.status_list_id, entry.status_list_index)
        );
    }
    assert_eq!(slots.len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn default_retry_budget_never_shares_a_slot() {
    let store = Arc::new(MemoryStatusStore::new());
    let allocator = StatusAllocator::new(store.clone()).with_capacity(16);

    let mut handles = Vec::new();
    for i in 0..100 {
        let allocator = allocator.clone();
        handles.push(tokio::spawn(async move {
            let id = format!("urn:uuid:default-{i}");
            let outcome = allocator.assign_status(&id, StatusPurpose::Revocation).await;
            (id, outcome)
        }));
    }

    // With only three retries some tasks may give up; they must do so with
    // a contention error and leave nothing behind.
    let mut slots = HashSet::new();
    let mut gave_up = Vec::new();
    for handle in handles {
        let (id, outcome) = handle.await.unwrap();
        match outcome {
            Ok(entry) => {
                assert!(entry.status_list_index < 16);
                assert!(slots.insert((entry.status_list_id, entry.status_list_index)));
            }
            Err(StatusError::Conflict { .. } | StatusError::ListFull { .. }) => gave_up.push(id),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    for id in &gave_up {
        assert!(store.entry_for(id, StatusPurpose::Revocation).await.unwrap().is_none());
    }

    // Stragglers succeed once the contention is gone.
    for id in &gave_up {
        let entry = allocator.assign_status(id, StatusPurpose::Revocation).await.unwrap();
        assert!(slots.insert((entry.status_list_id, entry.status_list_index)));
    }
    assert_eq!(slots.len(), 100);

    let lists: HashSet<_> = slots.iter().map(|(list_id, _)| *list_id).collect();
    let mut stored = 0;
    for list_id in lists {
        stored += store.entries_for_list(list_id).await.unwrap().len();
    }
    assert_eq!(stored, 100);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assignments_across_small_lists() {
    let store = Arc::new(MemoryStatusStore::new());
    let allocator = StatusAllocator::new(store.clone())
        .with_capacity(8)
        .with_max_retries(64);

    let mut handles = Vec::new();
    for i in 0..64 {
        let allocator = allocator.clone();
        handles.push(tokio::spawn(async move {
            allocator
                .assign_status(&format!("cred-{i}"), StatusPurpose::Suspension)
                .await
        }));
    }

    let mut slots = HashSet::new();
    for handle in handles {
        let entry = handle.await.unwrap().unwrap();
        assert!(entry.status_list_index < 8);
        assert!(slots.insert((entry.status_list_id, entry.status_list_index)));
    }
    assert_eq!(slots.len(), 64);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn same_credential_racing_gets_one_entry() {
    let store = Arc::new(MemoryStatusStore::new());
    let allocator = StatusAllocator::new(store.clone()).with_max_retries(64);

    let mut handles = Vec::new();
    for _ in 0..16 {
        let allocator = allocator.clone();
        handles.push(tokio::spawn(async move {
            allocator.assign_status("urn:uuid:same", StatusPurpose::Revocation).await
        }));
    }

    let mut slots = HashSet::new();
    for handle in handles {
        let entry = handle.await.unwrap().unwrap();
        slots.insert((entry.status_list_id, entry.status_list_index));
    }
    assert_eq!(slots.len(), 1);
}

// ============================================================================
// Revocation reflected in the published list
// ============================================================================

#[tokio::test]
async fn revoked_credentials_show_in_bitstring() {
    let store = Arc::new(MemoryStatusStore::new());
    let allocator = StatusAllocator::new(store.clone()).with_capacity(32);

    let mut entries = Vec::new();
    for i in 0..10 {
        entries.push(
            allocator
                .assign_status(&format!("cred-{i}"), StatusPurpose::Revocation)
                .await
                .unwrap(),
        );
    }
    allocator.set_status("cred-3", StatusPurpose::Revocation, 1).await.unwrap();
    allocator.set_status("cred-7", StatusPurpose::Revocation, 1).await.unwrap();

    let list_id = entries[0].status_list_id;
    let list = store.get_list(list_id).await.unwrap().unwrap();
    let stored = store.entries_for_list(list_id).await.unwrap();
    let bits = decode_bitstring(&encode_bitstring(&list, &stored).unwrap()).unwrap();

    for entry in &entries {
        let expected = u8::from(entry.credential_id == "cred-3" || entry.credential_id == "cred-7");
        assert_eq!(bit_at(&bits, entry.status_list_index, 1), Some(expected));
    }
}
