use std::fmt;

use uuid::Uuid;

use crate::data::WorkData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkId(pub Uuid);

impl WorkId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for WorkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Cleanup,
    Blur,
    Save,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Cleanup => "cleanup",
            Stage::Blur => "blur",
            Stage::Save => "save",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkState {
    Enqueued,
    Running(Stage),
    Succeeded,
    Failed,
    /// Replaced by a newer chain under the same unique name.
    Cancelled,
}

impl WorkState {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            WorkState::Succeeded | WorkState::Failed | WorkState::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkStatus {
    pub id: WorkId,
    pub state: WorkState,
    /// Final stage output; empty until the chain succeeds.
    pub output: WorkData,
}
