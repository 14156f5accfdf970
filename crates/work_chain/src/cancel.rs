use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::WorkStageError;

/// Cancellation shared by the stages of one chain and the scheduler.
///
/// Stages write into a staged file and make it visible through [`commit`].
/// `commit` and [`cancel`] take the same lock, so once a chain is cancelled
/// no file it produced remains: later commits discard their staged file and
/// files committed earlier are removed by `cancel` itself.
///
/// [`commit`]: ChainCancellation::commit
/// [`cancel`]: ChainCancellation::cancel
#[derive(Debug, Clone, Default)]
pub struct ChainCancellation {
    token: CancellationToken,
    committed: Arc<Mutex<Vec<PathBuf>>>,
}

impl ChainCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn check(&self) -> Result<(), WorkStageError> {
        if self.is_cancelled() {
            return Err(WorkStageError::Cancelled);
        }
        Ok(())
    }

    /// Resolves once the chain is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Renames `staged` to `target` unless the chain was cancelled, in which
    /// case `staged` is deleted and `Cancelled` is returned.
    pub fn commit(&self, staged: &Path, target: &Path) -> Result<(), WorkStageError> {
        let mut committed = self.lock();
        if self.token.is_cancelled() {
            discard(staged);
            return Err(WorkStageError::Cancelled);
        }
        fs::rename(staged, target)
            .map_err(|err| WorkStageError::io("failed to publish", target, err))?;
        committed.push(target.to_path_buf());
        Ok(())
    }

    /// Marks the chain cancelled and deletes every file it committed.
    pub fn cancel(&self) {
        let committed = {
            let mut committed = self.lock();
            self.token.cancel();
            std::mem::take(&mut *committed)
        };
        for path in committed {
            discard(&path);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PathBuf>> {
        self.committed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Path a stage writes to before committing `target`.
pub fn staged_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    target.with_file_name(name)
}

pub(crate) fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "discarded output of cancelled chain"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(path = %path.display(), "failed to discard output: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_publishes_staged_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.png");
        let staged = staged_path(&target);
        fs::write(&staged, b"data").expect("staged");

        ChainCancellation::new()
            .commit(&staged, &target)
            .expect("commit");
        assert!(target.exists());
        assert!(!staged.exists());
    }

    #[test]
    fn commit_after_cancel_discards_staged_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("out.png");
        let staged = staged_path(&target);
        fs::write(&staged, b"data").expect("staged");

        let cancellation = ChainCancellation::new();
        cancellation.cancel();
        let err = cancellation
            .commit(&staged, &target)
            .expect_err("cancelled");
        assert!(matches!(err, WorkStageError::Cancelled));
        assert!(!target.exists());
        assert!(!staged.exists());
    }

    #[test]
    fn cancel_removes_already_committed_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cancellation = ChainCancellation::new();
        let shared = cancellation.clone();
        let target = dir.path().join("out.png");
        let staged = staged_path(&target);
        fs::write(&staged, b"data").expect("staged");
        shared.commit(&staged, &target).expect("commit");

        cancellation.cancel();
        assert!(shared.is_cancelled());
        assert!(!target.exists());
    }
}
