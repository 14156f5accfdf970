use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use shared::domain::{MovieDetail, MovieId};

use crate::catalog::CatalogApi;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub id: MovieId,
    pub title: String,
    pub release_date: String,
    pub description: String,
    pub rating: f64,
    pub rating_text: String,
    pub banner_url: Option<String>,
    pub poster_url: Option<String>,
}

pub struct DetailController {
    catalog: Arc<dyn CatalogApi>,
}

impl DetailController {
    pub fn new(catalog: Arc<dyn CatalogApi>) -> Self {
        Self { catalog }
    }

    pub async fn load(&self, id: MovieId) -> Result<DetailView> {
        let detail = self
            .catalog
            .movie_detail(id)
            .await
            .with_context(|| format!("failed to load movie {id}"))?;
        Ok(self.render(detail))
    }

    fn render(&self, detail: MovieDetail) -> DetailView {
        DetailView {
            banner_url: self.catalog.image_url(&detail.backdrop_path),
            poster_url: self.catalog.image_url(&detail.poster_path),
            rating_text: format_rating(detail.rating),
            id: detail.id,
            title: detail.title,
            release_date: detail.release_date,
            description: detail.description,
            rating: detail.rating,
        }
    }
}

/// Shows the catalog's rating exactly as received, without rounding.
pub fn format_rating(rating: f64) -> String {
    rating.to_string()
}
