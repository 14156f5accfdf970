use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body the catalog service returns alongside a non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStatusBody {
    #[serde(default)]
    pub status_code: i64,
    #[serde(default)]
    pub status_message: String,
}

impl CatalogStatusBody {
    pub fn new(status_code: i64, status_message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
        }
    }

    /// Parses a response body, falling back to `None` for anything that is
    /// not the catalog's error shape.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str::<Self>(raw)
            .ok()
            .filter(|body| !body.status_message.is_empty())
    }
}

#[derive(Debug, Error)]
#[error("catalog status {status_code}: {status_message}")]
pub struct CatalogStatusException {
    pub status_code: i64,
    pub status_message: String,
}

impl From<CatalogStatusBody> for CatalogStatusException {
    fn from(value: CatalogStatusBody) -> Self {
        Self {
            status_code: value.status_code,
            status_message: value.status_message,
        }
    }
}
