use std::time::Duration;

use bytes::Bytes;
use cashew_backend::{DeleteStatus, RequestCache};
use cashew_core::{CacheEntry, CacheKey, KeyPart};
use cashew_moka::{MokaCache, MokaCacheBuilder};

fn make_key(id: u32) -> CacheKey {
    CacheKey::new("test", 1, vec![KeyPart::new("id", Some(id.to_string()))])
}

fn make_entry(size: usize, hard: Duration) -> CacheEntry<Bytes> {
    CacheEntry::new(Bytes::from(vec![0u8; size]), hard, hard).unwrap()
}

#[tokio::test]
async fn entry_is_gone_after_hard_deadline() {
    let backend = MokaCache::builder().max_entries(100).build();
    let key = make_key(1);
    backend
        .set(&key, make_entry(10, Duration::from_millis(300)))
        .await
        .unwrap();
    assert!(backend.get(&key).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(backend.get(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn replacing_entry_takes_new_deadline() {
    let backend = MokaCache::builder().max_entries(100).build();
    let key = make_key(2);
    backend
        .set(&key, make_entry(10, Duration::from_millis(200)))
        .await
        .unwrap();
    backend
        .set(&key, make_entry(10, Duration::from_secs(30)))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(backend.get(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn max_bytes_evicts_oldest() {
    let key = make_key(1);
    let entry = make_entry(100, Duration::from_secs(3600));
    let single = key.memory_size() + entry.memory_size();

    let backend = MokaCacheBuilder::default()
        .max_bytes((single * 3) as u64)
        .build();

    for id in 1..=4 {
        backend
            .set(&make_key(id), make_entry(100, Duration::from_secs(3600)))
            .await
            .unwrap();
        backend.cache().run_pending_tasks().await;
    }

    let mut present = 0;
    for id in 1..=4 {
        if backend.get(&make_key(id)).await.unwrap().is_some() {
            present += 1;
        }
    }
    assert_eq!(present, 3);
    assert!(backend.get(&make_key(4)).await.unwrap().is_some());
}

#[tokio::test]
async fn remove_and_clear() {
    let backend = MokaCache::builder().max_entries(10).name("l1").build();
    assert_eq!(backend.name(), "l1");

    for id in 1..=3 {
        backend
            .set(&make_key(id), make_entry(1, Duration::from_secs(60)))
            .await
            .unwrap();
    }
    assert_eq!(
        backend.remove(&make_key(1)).await.unwrap(),
        DeleteStatus::Deleted(1)
    );
    assert_eq!(
        backend.remove(&make_key(1)).await.unwrap(),
        DeleteStatus::Missing
    );

    backend.clear().await.unwrap();
    assert!(backend.get(&make_key(2)).await.unwrap().is_none());
    assert_eq!(backend.cache().entry_count(), 0);
}
