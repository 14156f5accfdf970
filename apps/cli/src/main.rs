mod config;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    controllers::{
        DetailController, HomeController, LoginController, ProfileController, RegisterController,
        RegistrationForm,
    },
    CatalogApi, SessionManager, TmdbClient,
};
use serde::Serialize;
use shared::domain::MovieId;
use storage::Storage;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use work_chain::{WorkScheduler, WorkState};

#[derive(Parser, Debug)]
#[command(name = "movies", about = "Browse the movie catalog and manage the local profile")]
struct Cli {
    /// Path to a TOML settings file (defaults to ./movies.toml when present).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Print views as JSON instead of text.
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the local account.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Defaults to --password.
        #[arg(long)]
        confirm_password: Option<String>,
    },
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Greeting plus the popular movie list.
    Home,
    Popular,
    Detail {
        id: i64,
    },
    Profile {
        #[command(subcommand)]
        command: ProfileCommand,
    },
    /// Wipe every stored preference.
    Reset,
}

#[derive(Subcommand, Debug)]
enum ProfileCommand {
    Show,
    Edit {
        #[arg(long)]
        username: String,
        #[arg(long)]
        fullname: String,
        #[arg(long)]
        address: String,
    },
    /// Store a new picture and blur a copy of it into the media directory.
    Picture {
        path: PathBuf,
    },
}

#[derive(Serialize)]
struct ProfileView {
    username: String,
    email: String,
    fullname: String,
    address: String,
    logged_in: bool,
    has_image: bool,
}

#[derive(Serialize)]
struct PictureOutcome {
    work_id: String,
    state: String,
    output_uri: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = config::load_settings(cli.config.as_deref());

    let storage = Storage::new(&settings.database_url)
        .await
        .with_context(|| format!("failed to open preferences at {}", settings.database_url))?;
    let session = SessionManager::new(Arc::new(storage.clone()));

    if requires_login(&cli.command) && !session.login_status().await? {
        bail!("not logged in; run `movies login` first");
    }

    match cli.command {
        Command::Register {
            username,
            email,
            password,
            confirm_password,
        } => {
            let form = RegistrationForm {
                confirm_password: confirm_password.unwrap_or_else(|| password.clone()),
                username,
                email,
                password,
            };
            RegisterController::new(session).register(&form).await?;
            println!("registered {}", form.username);
        }
        Command::Login { username, password } => {
            LoginController::new(session)
                .login(&username, &password)
                .await?;
            println!("logged in as {username}");
        }
        Command::Logout => {
            session.status_login(false).await?;
            println!("logged out");
        }
        Command::Home => {
            let home = HomeController::new(catalog(&settings)?, session);
            let view = home.load().await?;
            if cli.json {
                print_json(&view)?;
            } else {
                println!("{}", view.welcome);
                for movie in &view.movies {
                    println!("{:>8}  {}", movie.id, movie.title);
                }
            }
        }
        Command::Popular => {
            let home = HomeController::new(catalog(&settings)?, session);
            let movies = home.load().await?.movies;
            if cli.json {
                print_json(&movies)?;
            } else {
                for movie in &movies {
                    println!(
                        "{:>8}  {}  {}",
                        movie.id,
                        movie.title,
                        movie.poster_url.as_deref().unwrap_or("-")
                    );
                }
            }
        }
        Command::Detail { id } => {
            let view = DetailController::new(catalog(&settings)?)
                .load(MovieId(id))
                .await?;
            if cli.json {
                print_json(&view)?;
            } else {
                println!("{}", view.title);
                println!("released: {}", view.release_date);
                println!("rating:   {}", view.rating_text);
                if let Some(banner) = &view.banner_url {
                    println!("banner:   {banner}");
                }
                if let Some(poster) = &view.poster_url {
                    println!("poster:   {poster}");
                }
                println!();
                println!("{}", view.description);
            }
        }
        Command::Profile { command } => {
            let profile = ProfileController::new(
                session.clone(),
                WorkScheduler::new(),
                settings.stage_settings(),
            );
            match command {
                ProfileCommand::Show => {
                    let snapshot = session.profile().await?;
                    let view = ProfileView {
                        username: snapshot.username,
                        email: snapshot.email,
                        fullname: snapshot.fullname,
                        address: snapshot.address,
                        logged_in: snapshot.login_status,
                        has_image: snapshot.image.is_some(),
                    };
                    if cli.json {
                        print_json(&view)?;
                    } else {
                        println!("username: {}", view.username);
                        println!("email:    {}", view.email);
                        println!("fullname: {}", view.fullname);
                        println!("address:  {}", view.address);
                        println!("picture:  {}", if view.has_image { "set" } else { "none" });
                    }
                }
                ProfileCommand::Edit {
                    username,
                    fullname,
                    address,
                } => {
                    profile.edit_account(&username, &fullname, &address).await?;
                    println!("profile updated");
                }
                ProfileCommand::Picture { path } => {
                    let id = profile.change_picture(&path).await?;
                    info!(%id, "waiting for picture processing");
                    let Some(status) = profile.await_blur(id).await else {
                        bail!("picture processing was superseded");
                    };
                    let outcome = PictureOutcome {
                        work_id: id.to_string(),
                        state: format!("{:?}", status.state),
                        output_uri: profile.output_uri().await,
                    };
                    if cli.json {
                        print_json(&outcome)?;
                    } else if let Some(uri) = &outcome.output_uri {
                        println!("picture updated; blurred copy saved to {uri}");
                    }
                    if status.state != WorkState::Succeeded {
                        bail!("picture processing ended in state {}", outcome.state);
                    }
                }
            }
        }
        Command::Reset => {
            storage.clear().await?;
            println!("preferences cleared");
        }
    }

    Ok(())
}

fn requires_login(command: &Command) -> bool {
    matches!(
        command,
        Command::Home | Command::Popular | Command::Detail { .. } | Command::Profile { .. }
    )
}

fn catalog(settings: &config::Settings) -> Result<Arc<dyn CatalogApi>> {
    if settings.catalog_api_key.is_empty() {
        warn!("no catalog API key configured; set TMDB_API_KEY");
    }
    let client = TmdbClient::new(
        &settings.catalog_base_url,
        settings.image_base_url.clone(),
        settings.catalog_api_key.clone(),
    )
    .context("invalid catalog base url")?;
    Ok(Arc::new(client))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
