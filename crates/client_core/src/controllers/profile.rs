use std::path::Path;

use anyhow::{Context, Result};
use futures::stream::BoxStream;
use tokio::sync::RwLock;
use tracing::info;
use work_chain::{
    image_manipulation_chain, locator, StageSettings, WorkId, WorkScheduler, WorkState,
    WorkStatus, IMAGE_MANIPULATION_WORK_NAME, TAG_OUTPUT,
};

use crate::{image_codec, session::SessionManager};

pub struct ProfileController {
    session: SessionManager,
    scheduler: WorkScheduler,
    stage_settings: StageSettings,
    output_uri: RwLock<Option<String>>,
}

impl ProfileController {
    pub fn new(
        session: SessionManager,
        scheduler: WorkScheduler,
        stage_settings: StageSettings,
    ) -> Self {
        Self {
            session,
            scheduler,
            stage_settings,
            output_uri: RwLock::new(None),
        }
    }

    /// Three independent writes, not one atomic update.
    pub async fn edit_account(&self, username: &str, fullname: &str, address: &str) -> Result<()> {
        self.session.set_username(username).await?;
        self.session.set_fullname(fullname).await?;
        self.session.set_address(address).await?;
        info!(username, "profile updated");
        Ok(())
    }

    pub async fn status_login(&self, is_login: bool) -> Result<()> {
        self.session.status_login(is_login).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.status_login(false).await
    }

    pub async fn upload_image(&self, image: &str) -> Result<()> {
        self.session.set_image(image).await
    }

    pub fn get_image(&self) -> BoxStream<'static, Option<String>> {
        self.session.observe_image()
    }

    /// Enqueues cleanup → blur → save for `image_uri`, replacing a chain that
    /// is still pending.
    pub async fn apply_blur(&self, image_uri: &str) -> WorkId {
        let chain = image_manipulation_chain(&self.stage_settings, image_uri);
        self.scheduler
            .enqueue_unique(IMAGE_MANIPULATION_WORK_NAME, chain)
            .await
    }

    pub async fn output_work_status(&self) -> BoxStream<'static, WorkStatus> {
        self.scheduler.observe_tag(TAG_OUTPUT).await
    }

    pub async fn set_output_uri(&self, output_image_uri: Option<&str>) {
        *self.output_uri.write().await = output_image_uri
            .filter(|uri| !uri.is_empty())
            .map(str::to_string);
    }

    pub async fn output_uri(&self) -> Option<String> {
        self.output_uri.read().await.clone()
    }

    /// Stores `path` as the profile picture and starts blurring it.
    pub async fn change_picture(&self, path: &Path) -> Result<WorkId> {
        let source = path.to_path_buf();
        let encoded = tokio::task::spawn_blocking(move || image_codec::encode_file(&source))
            .await
            .context("picture encoding task failed")??;
        self.upload_image(&encoded).await?;

        let image_uri = locator::to_uri(path)
            .with_context(|| format!("failed to locate '{}'", path.display()))?;
        Ok(self.apply_blur(&image_uri).await)
    }

    /// Waits for chain `id` and records its output locator when it succeeds.
    pub async fn await_blur(&self, id: WorkId) -> Option<WorkStatus> {
        let status = self.scheduler.wait_for_terminal(TAG_OUTPUT, id).await?;
        if status.state == WorkState::Succeeded {
            self.set_output_uri(status.output.image_uri()).await;
        }
        Some(status)
    }
}
