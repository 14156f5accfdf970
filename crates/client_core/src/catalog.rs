use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{MovieDetail, MovieId, MovieSummary},
    error::{CatalogStatusBody, CatalogStatusException},
    protocol::{MovieDetailRecord, PopularMoviesResponse},
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.themoviedb.org/";
pub const DEFAULT_IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500/";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid catalog url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("catalog responded with status {status}")]
    Status { status: u16 },
    #[error("catalog rejected request with status {status}: {detail}")]
    Rejected {
        status: u16,
        #[source]
        detail: CatalogStatusException,
    },
    #[error("malformed catalog response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl CatalogError {
    /// HTTP status of a non-2xx response, if that is what failed.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Status { status } | CatalogError::Rejected { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn popular_movies(&self) -> Result<Vec<MovieSummary>, CatalogError>;
    async fn movie_detail(&self, id: MovieId) -> Result<MovieDetail, CatalogError>;
    /// Full URL of a poster or backdrop path, `None` for an empty path.
    fn image_url(&self, path: &str) -> Option<String>;
}

pub struct TmdbClient {
    http: Client,
    base_url: Url,
    image_base_url: String,
    api_key: String,
}

impl TmdbClient {
    pub fn new(
        base_url: &str,
        image_base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        Ok(Self {
            http: Client::new(),
            base_url: Url::parse(&with_trailing_slash(base_url))?,
            image_base_url: image_base_url.into(),
            api_key: api_key.into(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, CatalogError> {
        let url = self.base_url.join(path)?;
        debug!(path, "catalog request");
        let response = self
            .http
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            warn!(path, status = status.as_u16(), "catalog request rejected");
            return Err(match CatalogStatusBody::parse(&body) {
                Some(detail) => CatalogError::Rejected {
                    status: status.as_u16(),
                    detail: detail.into(),
                },
                None => CatalogError::Status {
                    status: status.as_u16(),
                },
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn popular_movies(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        let response: PopularMoviesResponse = self.get_json("3/movie/popular").await?;
        Ok(response.into_summaries())
    }

    async fn movie_detail(&self, id: MovieId) -> Result<MovieDetail, CatalogError> {
        let record: MovieDetailRecord = self.get_json(&format!("3/movie/{}", id.0)).await?;
        Ok(record.into())
    }

    fn image_url(&self, path: &str) -> Option<String> {
        image_url(&self.image_base_url, path)
    }
}

pub fn image_url(image_base_url: &str, path: &str) -> Option<String> {
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(format!("{}{path}", with_trailing_slash(image_base_url)))
}

fn with_trailing_slash(url: &str) -> String {
    let url = url.trim();
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
