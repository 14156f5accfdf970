use super::*;
use std::time::Duration;

#[tokio::test]
async fn set_then_get_round_trips_every_key() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    for key in PreferenceKey::ALL {
        let value = format!("value-for-{key}");
        storage.set(key, &value).await.expect("set");
        assert_eq!(storage.get(key).await.expect("get"), Some(value));
    }
}

#[tokio::test]
async fn unset_key_reads_as_none() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    assert_eq!(
        storage.get(PreferenceKey::LoginStatus).await.expect("get"),
        None
    );
}

#[tokio::test]
async fn later_write_overwrites_earlier_one() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .set(PreferenceKey::Username, "alice")
        .await
        .expect("first");
    storage
        .set(PreferenceKey::Username, "bob")
        .await
        .expect("second");
    assert_eq!(
        storage.get(PreferenceKey::Username).await.expect("get"),
        Some("bob".to_string())
    );
}

#[tokio::test]
async fn health_check_succeeds_for_live_pool() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.health_check().await.expect("health check");
}

#[tokio::test]
async fn observe_yields_current_value_then_updates() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .set(PreferenceKey::Email, "a@example.com")
        .await
        .expect("set");

    let mut updates = storage.observe(PreferenceKey::Email);
    assert_eq!(
        updates.next().await.expect("initial"),
        Some("a@example.com".to_string())
    );

    storage
        .set(PreferenceKey::Email, "b@example.com")
        .await
        .expect("update");
    let next = tokio::time::timeout(Duration::from_secs(1), updates.next())
        .await
        .expect("update delivered")
        .expect("stream open");
    assert_eq!(next, Some("b@example.com".to_string()));
}

#[tokio::test]
async fn observers_of_other_keys_are_not_woken() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut address = storage.observe(PreferenceKey::Address);
    assert_eq!(address.next().await.expect("initial"), None);

    storage
        .set(PreferenceKey::Fullname, "Alice Liddell")
        .await
        .expect("set");
    let woke = tokio::time::timeout(Duration::from_millis(100), address.next()).await;
    assert!(woke.is_err(), "address observer must stay idle");
}

#[tokio::test]
async fn remove_and_clear_notify_observers() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage.set(PreferenceKey::Image, "abc").await.expect("set");
    storage
        .set(PreferenceKey::Password, "secret")
        .await
        .expect("set");

    let mut image = storage.observe(PreferenceKey::Image);
    assert_eq!(image.next().await.expect("initial"), Some("abc".to_string()));

    storage.remove(PreferenceKey::Image).await.expect("remove");
    assert_eq!(image.next().await.expect("removed"), None);
    assert_eq!(storage.get(PreferenceKey::Image).await.expect("get"), None);

    storage.clear().await.expect("clear");
    assert_eq!(
        storage.get(PreferenceKey::Password).await.expect("get"),
        None
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writes_leave_observers_on_the_stored_value() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");

    let writers = (0..32).map(|i| {
        let storage = storage.clone();
        tokio::spawn(async move {
            storage
                .set(PreferenceKey::Username, &format!("user-{i}"))
                .await
        })
    });
    for writer in writers.collect::<Vec<_>>() {
        writer.await.expect("writer task").expect("set");
    }

    let stored = storage.get(PreferenceKey::Username).await.expect("get");
    let observed = storage
        .observe(PreferenceKey::Username)
        .next()
        .await
        .expect("current value");
    assert!(stored.is_some());
    assert_eq!(observed, stored);
}
