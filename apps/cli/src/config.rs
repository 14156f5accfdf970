use std::{collections::HashMap, fs, path::PathBuf, time::Duration};

use client_core::catalog::{DEFAULT_CATALOG_BASE_URL, DEFAULT_IMAGE_BASE_URL};
use storage::{normalize_database_url, DEFAULT_DATABASE_URL};
use tracing::warn;
use work_chain::StageSettings;

pub const DEFAULT_CONFIG_FILE: &str = "movies.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog_base_url: String,
    pub catalog_api_key: String,
    pub image_base_url: String,
    pub database_url: String,
    pub work_dir: PathBuf,
    pub media_dir: PathBuf,
    pub blur_sigma: f32,
    pub stage_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_BASE_URL.into(),
            catalog_api_key: String::new(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            work_dir: PathBuf::from("./data/work"),
            media_dir: PathBuf::from("./data/media"),
            blur_sigma: 8.0,
            stage_delay_ms: 0,
        }
    }
}

impl Settings {
    pub fn stage_settings(&self) -> StageSettings {
        StageSettings {
            work_dir: self.work_dir.clone(),
            media_dir: self.media_dir.clone(),
            blur_sigma: self.blur_sigma,
            stage_delay: Duration::from_millis(self.stage_delay_ms),
        }
    }
}

pub fn load_settings(config_file: Option<&str>) -> Settings {
    let mut settings = Settings::default();

    let path = config_file.unwrap_or(DEFAULT_CONFIG_FILE);
    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    } else if config_file.is_some() {
        warn!(path, "config file not readable, using defaults");
    }

    apply_env(&mut settings, |name| std::env::var(name).ok());
    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<HashMap<String, toml::Value>>(raw) {
        Ok(cfg) => cfg,
        Err(err) => {
            warn!("ignoring malformed config file: {err}");
            return;
        }
    };

    let text = |key: &str| -> Option<String> {
        file_cfg.get(key).map(|value| match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    if let Some(v) = text("catalog_base_url") {
        settings.catalog_base_url = v;
    }
    if let Some(v) = text("catalog_api_key") {
        settings.catalog_api_key = v;
    }
    if let Some(v) = text("image_base_url") {
        settings.image_base_url = v;
    }
    if let Some(v) = text("database_url") {
        settings.database_url = v;
    }
    if let Some(v) = text("work_dir") {
        settings.work_dir = PathBuf::from(v);
    }
    if let Some(v) = text("media_dir") {
        settings.media_dir = PathBuf::from(v);
    }
    if let Some(v) = text("blur_sigma").and_then(|v| v.parse().ok()) {
        settings.blur_sigma = v;
    }
    if let Some(v) = text("stage_delay_ms").and_then(|v| v.parse().ok()) {
        settings.stage_delay_ms = v;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("TMDB_BASE_URL") {
        settings.catalog_base_url = v;
    }
    if let Some(v) = lookup("APP__CATALOG_BASE_URL") {
        settings.catalog_base_url = v;
    }

    if let Some(v) = lookup("TMDB_API_KEY") {
        settings.catalog_api_key = v;
    }
    if let Some(v) = lookup("APP__CATALOG_API_KEY") {
        settings.catalog_api_key = v;
    }

    if let Some(v) = lookup("APP__IMAGE_BASE_URL") {
        settings.image_base_url = v;
    }

    if let Some(v) = lookup("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = lookup("APP__WORK_DIR") {
        settings.work_dir = PathBuf::from(v);
    }
    if let Some(v) = lookup("APP__MEDIA_DIR") {
        settings.media_dir = PathBuf::from(v);
    }

    if let Some(v) = lookup("APP__BLUR_SIGMA") {
        if let Ok(parsed) = v.parse::<f32>() {
            settings.blur_sigma = parsed;
        }
    }
    if let Some(v) = lookup("APP__STAGE_DELAY_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.stage_delay_ms = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
