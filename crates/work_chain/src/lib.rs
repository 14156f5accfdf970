//! Profile-picture work chain: cleanup, blur and save, run strictly in that
//! order by a [`WorkScheduler`] that keeps at most one chain alive per unique
//! name.

pub mod cancel;
pub mod data;
pub mod error;
pub mod locator;
pub mod scheduler;
pub mod stages;
pub mod status;

pub use cancel::ChainCancellation;
pub use data::WorkData;
pub use error::WorkStageError;
pub use scheduler::{WorkChain, WorkScheduler, WorkStage};
pub use stages::{
    image_manipulation_chain, metadata_path, BlurStage, CleanupStage, SaveStage, StageSettings,
};
pub use status::{Stage, WorkId, WorkState, WorkStatus};

/// Data key carrying the image locator between stages.
pub const KEY_IMAGE_URI: &str = "KEY_IMAGE_URI";
/// Tag under which chain status is observed.
pub const TAG_OUTPUT: &str = "OUTPUT";
/// Unique name of the profile-picture chain. Enqueueing under it replaces
/// any chain still pending.
pub const IMAGE_MANIPULATION_WORK_NAME: &str = "image_manipulation_work";
pub const OUTPUT_PATH: &str = "blur_filter_outputs";
pub const OUTPUT_FILE_PREFIX: &str = "blur-filter-output-";
pub const SAVED_IMAGE_TITLE: &str = "Profile Picture";
