use futures::StreamExt;
use shared::domain::PreferenceKey;
use storage::{PreferenceStore, Storage};

#[tokio::test]
async fn values_survive_reopening_the_database_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("nested").join("prefs.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    storage
        .set(PreferenceKey::Username, "alice")
        .await
        .expect("username");
    storage
        .set(PreferenceKey::LoginStatus, "true")
        .await
        .expect("login status");
    storage.pool().close().await;
    drop(storage);

    assert!(db_path.exists(), "database file should exist");

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened.get(PreferenceKey::Username).await.expect("get"),
        Some("alice".to_string())
    );

    // Observers of a reopened store start from the persisted value.
    let mut login = reopened.observe(PreferenceKey::LoginStatus);
    assert_eq!(login.next().await.expect("initial"), Some("true".to_string()));
}
