use std::path::{Path, PathBuf};

use url::Url;

use crate::error::WorkStageError;

/// Resolves a `file://` URI or a bare path into a filesystem path.
pub fn to_path(locator: &str) -> Result<PathBuf, WorkStageError> {
    let locator = locator.trim();
    if locator.is_empty() {
        return Err(WorkStageError::InvalidLocator(locator.to_string()));
    }

    if locator.starts_with("file:") {
        let url =
            Url::parse(locator).map_err(|_| WorkStageError::InvalidLocator(locator.to_string()))?;
        return url
            .to_file_path()
            .map_err(|_| WorkStageError::InvalidLocator(locator.to_string()));
    }

    if locator.contains("://") {
        return Err(WorkStageError::InvalidLocator(locator.to_string()));
    }

    Ok(PathBuf::from(locator))
}

/// Builds a `file://` URI for an existing file.
pub fn to_uri(path: &Path) -> Result<String, WorkStageError> {
    let absolute = path
        .canonicalize()
        .map_err(|err| WorkStageError::io("failed to resolve", path, err))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|_| WorkStageError::InvalidLocator(absolute.display().to_string()))
}
