use super::*;
use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::StreamExt;
use image::{Rgb, RgbImage};
use shared::domain::{MovieDetail, MovieId, MovieSummary};
use storage::Storage;
use work_chain::{locator, StageSettings, WorkScheduler, WorkState};

use crate::{
    catalog::{image_url, CatalogApi, CatalogError, DEFAULT_IMAGE_BASE_URL},
    image_codec,
    session::{SessionError, SessionManager},
};

struct FakeCatalog {
    movies: Vec<MovieSummary>,
    detail: Option<MovieDetail>,
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn popular_movies(&self) -> Result<Vec<MovieSummary>, CatalogError> {
        if self.movies.is_empty() {
            return Err(CatalogError::Status { status: 503 });
        }
        Ok(self.movies.clone())
    }

    async fn movie_detail(&self, id: MovieId) -> Result<MovieDetail, CatalogError> {
        self.detail
            .clone()
            .filter(|detail| detail.id == id)
            .ok_or(CatalogError::Status { status: 404 })
    }

    fn image_url(&self, path: &str) -> Option<String> {
        image_url(DEFAULT_IMAGE_BASE_URL, path)
    }
}

fn fight_club() -> MovieDetail {
    MovieDetail {
        id: MovieId(550),
        title: "Fight Club".to_string(),
        release_date: "1999-10-15".to_string(),
        description: "A ticking-time-bomb insomniac.".to_string(),
        rating: 8.438,
        poster_path: "/poster.jpg".to_string(),
        backdrop_path: "/backdrop.jpg".to_string(),
    }
}

async fn session() -> SessionManager {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    SessionManager::new(Arc::new(storage))
}

#[tokio::test]
async fn home_view_greets_user_and_lists_movies() {
    let session = session().await;
    session.set_username("alice").await.expect("username");
    let catalog = Arc::new(FakeCatalog {
        movies: vec![MovieSummary {
            id: MovieId(1),
            title: "A".to_string(),
            poster_path: "/a.jpg".to_string(),
            backdrop_path: "/b.jpg".to_string(),
        }],
        detail: None,
    });

    let view = HomeController::new(catalog, session)
        .load()
        .await
        .expect("home view");
    assert_eq!(view.welcome, "Welcome, alice");
    assert_eq!(
        view.movies,
        vec![MovieListItem {
            id: MovieId(1),
            title: "A".to_string(),
            poster_url: Some("https://image.tmdb.org/t/p/w500/a.jpg".to_string()),
        }]
    );
}

#[tokio::test]
async fn home_view_surfaces_catalog_failure() {
    let catalog = Arc::new(FakeCatalog {
        movies: Vec::new(),
        detail: None,
    });
    let err = HomeController::new(catalog, session().await)
        .load()
        .await
        .expect_err("must fail");
    let catalog_err = err.downcast_ref::<CatalogError>().expect("catalog error");
    assert_eq!(catalog_err.status(), Some(503));
}

#[tokio::test]
async fn welcome_follows_username_changes() {
    let session = session().await;
    let catalog = Arc::new(FakeCatalog {
        movies: Vec::new(),
        detail: None,
    });
    let home = HomeController::new(catalog, session.clone());
    let mut welcome = home.observe_welcome();
    assert_eq!(welcome.next().await.expect("initial"), "Welcome, ");

    session.set_username("bob").await.expect("username");
    assert_eq!(welcome.next().await.expect("update"), "Welcome, bob");
}

#[tokio::test]
async fn detail_view_shows_raw_catalog_fields() {
    let raw = fight_club();
    let catalog = Arc::new(FakeCatalog {
        movies: Vec::new(),
        detail: Some(raw.clone()),
    });

    let view = DetailController::new(catalog)
        .load(MovieId(550))
        .await
        .expect("detail view");
    assert_eq!(view.title, raw.title);
    assert_eq!(view.release_date, raw.release_date);
    assert_eq!(view.description, raw.description);
    assert_eq!(view.rating, raw.rating);
    assert_eq!(view.rating_text, "8.438");
    assert_eq!(
        view.banner_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/backdrop.jpg")
    );
    assert_eq!(
        view.poster_url.as_deref(),
        Some("https://image.tmdb.org/t/p/w500/poster.jpg")
    );
}

#[test]
fn rating_text_keeps_catalog_precision() {
    assert_eq!(detail::format_rating(7.0), "7");
    assert_eq!(detail::format_rating(6.125), "6.125");
}

#[tokio::test]
async fn detail_view_surfaces_missing_movie() {
    let catalog = Arc::new(FakeCatalog {
        movies: Vec::new(),
        detail: Some(fight_club()),
    });
    let err = DetailController::new(catalog)
        .load(MovieId(1))
        .await
        .expect_err("must fail");
    assert!(err.to_string().contains("failed to load movie 1"));
}

#[tokio::test]
async fn register_then_login_raises_flag() {
    let session = session().await;
    RegisterController::new(session.clone())
        .register(&RegistrationForm {
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password: "wonderland".to_string(),
            confirm_password: "wonderland".to_string(),
        })
        .await
        .expect("register");

    let login = LoginController::new(session.clone());
    assert!(!login.login_status().await.expect("status before login"));
    login.login("alice", "wonderland").await.expect("login");
    assert!(login.login_status().await.expect("status after login"));
    assert_eq!(session.email().await.expect("email"), "alice@example.com");
}

#[tokio::test]
async fn login_rejects_wrong_password_and_unknown_device() {
    let session = session().await;
    let login = LoginController::new(session.clone());

    let err = login.login("alice", "x").await.expect_err("not registered");
    assert_eq!(
        err.downcast_ref::<SessionError>(),
        Some(&SessionError::NotRegistered)
    );

    RegisterController::new(session)
        .save_account("alice", "wonderland", "alice@example.com")
        .await
        .expect("save account");
    let err = login.login("alice", "wrong").await.expect_err("bad password");
    assert_eq!(
        err.downcast_ref::<SessionError>(),
        Some(&SessionError::InvalidCredentials)
    );
    assert!(!login.login_status().await.expect("status"));
}

#[test]
fn registration_form_validation() {
    let mut form = RegistrationForm {
        username: "alice".to_string(),
        email: " ".to_string(),
        password: "a".to_string(),
        confirm_password: "a".to_string(),
    };
    assert_eq!(form.validate(), Err(SessionError::EmptyField("email")));

    form.email = "alice@example.com".to_string();
    form.confirm_password = "b".to_string();
    assert_eq!(form.validate(), Err(SessionError::PasswordMismatch));

    form.confirm_password = "a".to_string();
    assert_eq!(form.validate(), Ok(()));
}

fn profile_controller(session: SessionManager, root: &std::path::Path) -> ProfileController {
    ProfileController::new(
        session,
        WorkScheduler::new(),
        StageSettings {
            work_dir: root.join("work"),
            media_dir: root.join("media"),
            blur_sigma: 1.5,
            stage_delay: Duration::ZERO,
        },
    )
}

#[tokio::test]
async fn edit_account_and_logout_update_session() {
    let session = session().await;
    session.status_login(true).await.expect("login");
    let root = tempfile::tempdir().expect("tempdir");
    let profile = profile_controller(session.clone(), root.path());

    profile
        .edit_account("alice2", "Alice Liddell", "Oxford")
        .await
        .expect("edit");
    profile.logout().await.expect("logout");

    let snapshot = session.profile().await.expect("profile");
    assert_eq!(snapshot.username, "alice2");
    assert_eq!(snapshot.fullname, "Alice Liddell");
    assert_eq!(snapshot.address, "Oxford");
    assert!(!snapshot.login_status);
}

#[tokio::test]
async fn change_picture_stores_image_and_saves_blurred_copy() {
    let session = session().await;
    let root = tempfile::tempdir().expect("tempdir");
    let source = root.path().join("me.png");
    RgbImage::from_fn(8, 8, |x, _| Rgb([(x * 30) as u8, 0, 0]))
        .save(&source)
        .expect("source image");

    let profile = profile_controller(session.clone(), root.path());
    let mut stored = profile.get_image();
    assert_eq!(stored.next().await.expect("initial"), None);

    let id = profile.change_picture(&source).await.expect("change picture");
    let status = tokio::time::timeout(Duration::from_secs(10), profile.await_blur(id))
        .await
        .expect("chain finished")
        .expect("terminal status");
    assert_eq!(status.state, WorkState::Succeeded);

    let encoded = stored.next().await.expect("stored image").expect("image set");
    let decoded = image_codec::decode_image(&encoded).expect("decode stored");
    assert_eq!(decoded.width(), 8);

    let output_uri = profile.output_uri().await.expect("output uri");
    let saved = locator::to_path(&output_uri).expect("saved path");
    assert!(saved.starts_with(root.path().join("media").canonicalize().expect("media")));
}

#[tokio::test]
async fn output_status_is_observable_per_tag() {
    let session = session().await;
    let root = tempfile::tempdir().expect("tempdir");
    let profile = profile_controller(session, root.path());

    let mut statuses = profile.output_work_status().await;
    let id = profile
        .apply_blur(&root.path().join("missing.png").to_string_lossy())
        .await;

    let status = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let status = statuses.next().await.expect("status");
            if status.id == id && status.state.is_finished() {
                return status;
            }
        }
    })
    .await
    .expect("terminal status in time");
    assert_eq!(status.state, WorkState::Failed);
    assert_eq!(profile.output_uri().await, None);
}
