use std::sync::Arc;

use anyhow::{Context, Result};
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use shared::domain::MovieId;
use tracing::info;

use crate::{catalog::CatalogApi, session::SessionManager};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieListItem {
    pub id: MovieId,
    pub title: String,
    pub poster_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HomeView {
    pub welcome: String,
    pub movies: Vec<MovieListItem>,
}

pub struct HomeController {
    catalog: Arc<dyn CatalogApi>,
    session: SessionManager,
}

impl HomeController {
    pub fn new(catalog: Arc<dyn CatalogApi>, session: SessionManager) -> Self {
        Self { catalog, session }
    }

    pub async fn load(&self) -> Result<HomeView> {
        let username = self.session.username().await?;
        let movies = self
            .catalog
            .popular_movies()
            .await
            .context("failed to load popular movies")?;
        info!(count = movies.len(), "popular movies loaded");

        Ok(HomeView {
            welcome: welcome_text(&username),
            movies: movies
                .into_iter()
                .map(|movie| MovieListItem {
                    poster_url: self.catalog.image_url(&movie.poster_path),
                    id: movie.id,
                    title: movie.title,
                })
                .collect(),
        })
    }

    pub fn observe_welcome(&self) -> BoxStream<'static, String> {
        self.session
            .observe_username()
            .map(|username| welcome_text(&username))
            .boxed()
    }
}

pub fn welcome_text(username: &str) -> String {
    format!("Welcome, {username}")
}
