use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use chrono::Local;
use image::ImageFormat;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    cancel::{discard, staged_path, ChainCancellation},
    data::WorkData,
    error::WorkStageError,
    locator,
    scheduler::{WorkChain, WorkStage},
    KEY_IMAGE_URI, OUTPUT_FILE_PREFIX, OUTPUT_PATH, SAVED_IMAGE_TITLE, TAG_OUTPUT,
};

#[derive(Debug, Clone)]
pub struct StageSettings {
    /// Scratch directory; blurred intermediates go to `<work_dir>/blur_filter_outputs`.
    pub work_dir: PathBuf,
    /// Shared media storage the saved picture is written to.
    pub media_dir: PathBuf,
    pub blur_sigma: f32,
    /// Pause before each stage starts working.
    pub stage_delay: Duration,
}

impl StageSettings {
    pub fn outputs_dir(&self) -> PathBuf {
        self.work_dir.join(OUTPUT_PATH)
    }
}

/// Standard profile-picture chain for `image_uri`, tagged with [`TAG_OUTPUT`].
pub fn image_manipulation_chain(settings: &StageSettings, image_uri: &str) -> WorkChain {
    WorkChain::new(
        Arc::new(CleanupStage::new(settings.clone())),
        Arc::new(BlurStage::new(settings.clone())),
        Arc::new(SaveStage::new(settings.clone())),
        WorkData::with_image_uri(image_uri),
    )
    .add_tag(TAG_OUTPUT)
}

fn make_status_notification(message: &str) {
    info!(target: "work_chain::notification", "{message}");
}

async fn pause(delay: Duration, cancel: &ChainCancellation) -> Result<(), WorkStageError> {
    if delay.is_zero() {
        return cancel.check();
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => Ok(()),
        _ = cancel.cancelled() => Err(WorkStageError::Cancelled),
    }
}

/// Writes `target` through a staged file and commits it to the chain.
fn write_committed(
    cancel: &ChainCancellation,
    target: &Path,
    write: impl FnOnce(&Path) -> Result<(), WorkStageError>,
) -> Result<(), WorkStageError> {
    cancel.check()?;
    let staged = staged_path(target);
    if let Err(err) = write(&staged) {
        discard(&staged);
        return Err(err);
    }
    cancel.commit(&staged, target)
}

fn required_image_uri(input: &WorkData) -> Result<String, WorkStageError> {
    input
        .image_uri()
        .map(str::to_string)
        .ok_or(WorkStageError::MissingInput(KEY_IMAGE_URI))
}

/// Removes stale blurred intermediates. The input is passed on untouched.
pub struct CleanupStage {
    settings: StageSettings,
}

impl CleanupStage {
    pub fn new(settings: StageSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl WorkStage for CleanupStage {
    async fn run(
        &self,
        input: WorkData,
        cancel: &ChainCancellation,
    ) -> Result<WorkData, WorkStageError> {
        make_status_notification("Cleaning up old temporary files");
        pause(self.settings.stage_delay, cancel).await?;

        let outputs_dir = self.settings.outputs_dir();
        let removed = tokio::task::spawn_blocking(move || remove_png_files(&outputs_dir)).await??;
        debug!(removed, "cleanup stage finished");
        Ok(input)
    }
}

fn remove_png_files(dir: &Path) -> Result<usize, WorkStageError> {
    if !dir.is_dir() {
        return Ok(0);
    }
    let entries =
        fs::read_dir(dir).map_err(|err| WorkStageError::io("failed to list", dir, err))?;

    let mut removed = 0;
    for entry in entries {
        let path = entry
            .map_err(|err| WorkStageError::io("failed to list", dir, err))?
            .path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
        if path.is_file() && is_png {
            fs::remove_file(&path)
                .map_err(|err| WorkStageError::io("failed to delete", &path, err))?;
            info!(path = %path.display(), "deleted stale blur output");
            removed += 1;
        }
    }
    Ok(removed)
}

/// Decodes the input image, applies a Gaussian blur and writes the result as
/// a PNG into the outputs directory.
pub struct BlurStage {
    settings: StageSettings,
}

impl BlurStage {
    pub fn new(settings: StageSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl WorkStage for BlurStage {
    async fn run(
        &self,
        input: WorkData,
        cancel: &ChainCancellation,
    ) -> Result<WorkData, WorkStageError> {
        make_status_notification("Blurring image");
        pause(self.settings.stage_delay, cancel).await?;

        let source = locator::to_path(&required_image_uri(&input)?)?;
        let outputs_dir = self.settings.outputs_dir();
        let sigma = self.settings.blur_sigma;
        let cancel = cancel.clone();

        let output_path = tokio::task::spawn_blocking(move || -> Result<PathBuf, WorkStageError> {
            let picture = image::open(&source)?;
            cancel.check()?;
            let blurred = picture.blur(sigma);
            cancel.check()?;
            fs::create_dir_all(&outputs_dir)
                .map_err(|err| WorkStageError::io("failed to create", &outputs_dir, err))?;
            let output_path =
                outputs_dir.join(format!("{OUTPUT_FILE_PREFIX}{}.png", Uuid::new_v4()));
            write_committed(&cancel, &output_path, |staged| {
                Ok(blurred.save_with_format(staged, ImageFormat::Png)?)
            })?;
            Ok(output_path)
        })
        .await??;

        let output_uri = locator::to_uri(&output_path)?;
        info!(output = %output_uri, sigma, "image blurred");
        Ok(WorkData::with_image_uri(output_uri))
    }
}

/// Title and capture description stored next to a saved picture.
#[derive(Debug, Serialize)]
struct SavedImageMetadata<'a> {
    title: &'a str,
    description: &'a str,
    mime_type: &'static str,
}

/// JSON sidecar holding the title and description of the picture at `image`.
pub fn metadata_path(image: &Path) -> PathBuf {
    image.with_extension("json")
}

/// Copies the input image into media storage and outputs its new locator.
pub struct SaveStage {
    settings: StageSettings,
}

impl SaveStage {
    pub fn new(settings: StageSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl WorkStage for SaveStage {
    async fn run(
        &self,
        input: WorkData,
        cancel: &ChainCancellation,
    ) -> Result<WorkData, WorkStageError> {
        make_status_notification("Saving image");
        pause(self.settings.stage_delay, cancel).await?;

        let source = locator::to_path(&required_image_uri(&input)?)?;
        let media_dir = self.settings.media_dir.clone();
        let now = Local::now();
        let description = now.format("%Y.%m.%d at %H:%M:%S %Z").to_string();
        let stem = format!(
            "{}_{}_{}",
            SAVED_IMAGE_TITLE.to_ascii_lowercase().replace(' ', "_"),
            now.format("%Y%m%d_%H%M%S"),
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let metadata = serde_json::to_vec_pretty(&SavedImageMetadata {
            title: SAVED_IMAGE_TITLE,
            description: &description,
            mime_type: "image/png",
        })
        .map_err(|err| WorkStageError::MediaWrite(err.to_string()))?;
        let cancel = cancel.clone();

        let saved = tokio::task::spawn_blocking(move || -> Result<PathBuf, WorkStageError> {
            let picture = image::open(&source)?;
            cancel.check()?;
            fs::create_dir_all(&media_dir)
                .map_err(|err| WorkStageError::io("failed to create", &media_dir, err))?;
            let target = media_dir.join(format!("{stem}.png"));
            write_committed(&cancel, &target, |staged| {
                Ok(picture.save_with_format(staged, ImageFormat::Png)?)
            })?;
            let sidecar = metadata_path(&target);
            write_committed(&cancel, &sidecar, |staged| {
                fs::write(staged, &metadata)
                    .map_err(|err| WorkStageError::io("failed to write", staged, err))
            })?;
            Ok(target)
        })
        .await??;

        let saved_uri = locator::to_uri(&saved)
            .map_err(|err| WorkStageError::MediaWrite(err.to_string()))?;
        if saved_uri.is_empty() {
            return Err(WorkStageError::MediaWrite(
                "media storage returned no locator".to_string(),
            ));
        }

        info!(
            title = SAVED_IMAGE_TITLE,
            %description,
            output = %saved_uri,
            "image saved to media storage"
        );
        Ok(WorkData::with_image_uri(saved_uri))
    }
}

#[cfg(test)]
#[path = "tests/stages_tests.rs"]
mod tests;
