use std::{io, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkStageError {
    #[error("missing input data key {0}")]
    MissingInput(&'static str),
    #[error("invalid image locator '{0}'")]
    InvalidLocator(String),
    #[error("{action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("image codec failure: {0}")]
    Image(#[from] image::ImageError),
    #[error("writing to media storage failed: {0}")]
    MediaWrite(String),
    #[error("work chain was cancelled")]
    Cancelled,
    #[error("stage task aborted: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl WorkStageError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
