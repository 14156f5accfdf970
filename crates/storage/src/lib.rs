use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{str::FromStr, sync::Arc};
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use shared::domain::PreferenceKey;

pub mod database_url;

pub use database_url::{normalize_database_url, DEFAULT_DATABASE_URL};

const KEY_COUNT: usize = PreferenceKey::ALL.len();

/// Key-value persistence for the session profile.
///
/// `observe` yields the current value of a key first and then every value
/// written after that. Writes to different keys are independent; there is no
/// grouping across keys.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, key: PreferenceKey) -> Result<Option<String>>;
    async fn set(&self, key: PreferenceKey, value: &str) -> Result<()>;
    async fn remove(&self, key: PreferenceKey) -> Result<()>;
    fn observe(&self, key: PreferenceKey) -> BoxStream<'static, Option<String>>;
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
    watchers: Arc<[watch::Sender<Option<String>>; KEY_COUNT]>,
    /// Held across a write and its notification so observers see writes in
    /// the order they reached the database.
    write_lock: Arc<Mutex<()>>,
}

impl Storage {
    /// Opens the store at `database_url`, which may also be a bare file path.
    pub async fn new(database_url: &str) -> Result<Self> {
        let url = normalize_database_url(database_url);
        database_url::create_parent_dir(&url)?;

        let connect_options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);
        // One connection: writes are serialized and an in-memory database is
        // not split across connections.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open preference store at '{url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;

        let watchers: [watch::Sender<Option<String>>; KEY_COUNT] =
            std::array::from_fn(|_| watch::channel(None).0);
        let rows = sqlx::query("SELECT key, value FROM preferences")
            .fetch_all(&pool)
            .await
            .context("failed to load persisted preferences")?;
        for row in rows {
            let name: String = row.try_get("key")?;
            let value: String = row.try_get("value")?;
            match PreferenceKey::from_name(&name) {
                Some(key) => {
                    watchers[key as usize].send_replace(Some(value));
                }
                None => warn!(key = %name, "ignoring unknown persisted preference"),
            }
        }

        Ok(Self {
            pool,
            watchers: Arc::new(watchers),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Drops every persisted preference and notifies all observers.
    pub async fn clear(&self) -> Result<()> {
        let _write = self.write_lock.lock().await;
        sqlx::query("DELETE FROM preferences")
            .execute(&self.pool)
            .await
            .context("failed to clear preferences")?;
        for watcher in self.watchers.iter() {
            watcher.send_replace(None);
        }
        Ok(())
    }

    fn watcher(&self, key: PreferenceKey) -> &watch::Sender<Option<String>> {
        &self.watchers[key as usize]
    }
}

#[async_trait]
impl PreferenceStore for Storage {
    async fn get(&self, key: PreferenceKey) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM preferences WHERE key = ?")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read preference '{key}'"))?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    async fn set(&self, key: PreferenceKey, value: &str) -> Result<()> {
        let _write = self.write_lock.lock().await;
        sqlx::query(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(key.as_str())
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write preference '{key}'"))?;

        debug!(%key, "preference written");
        self.watcher(key).send_replace(Some(value.to_string()));
        Ok(())
    }

    async fn remove(&self, key: PreferenceKey) -> Result<()> {
        let _write = self.write_lock.lock().await;
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove preference '{key}'"))?;
        self.watcher(key).send_replace(None);
        Ok(())
    }

    fn observe(&self, key: PreferenceKey) -> BoxStream<'static, Option<String>> {
        WatchStream::new(self.watcher(key).subscribe()).boxed()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
