//! SQLite connection strings accepted by [`crate::Storage::new`].

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/movies.db";
const MEMORY_URL: &str = "sqlite::memory:";

/// Accepts a full URL, a `sqlite:` shorthand or a bare file path and returns
/// a `sqlite://` URL. Blank input falls back to [`DEFAULT_DATABASE_URL`].
pub fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }
    if raw.starts_with(MEMORY_URL) || raw.contains("://") {
        return raw.to_string();
    }
    let path = raw.strip_prefix("sqlite:").unwrap_or(raw);
    format!("sqlite://{}", path.replace('\\', "/"))
}

/// File backing `database_url`, or `None` for in-memory and non-sqlite URLs.
pub fn sqlite_file(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with(MEMORY_URL) {
        return None;
    }
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    (!path.is_empty()).then(|| PathBuf::from(path))
}

pub(crate) fn create_parent_dir(database_url: &str) -> Result<()> {
    let Some(parent) = sqlite_file(database_url)
        .and_then(|file| file.parent().map(PathBuf::from))
        .filter(|parent| !parent.as_os_str().is_empty())
    else {
        return Ok(());
    };

    fs::create_dir_all(&parent).with_context(|| {
        format!(
            "failed to create '{}' for database '{database_url}'",
            parent.display()
        )
    })
}
