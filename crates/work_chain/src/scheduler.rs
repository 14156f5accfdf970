use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_stream::wrappers::WatchStream;
use tracing::{error, info, warn};

use crate::{
    cancel::ChainCancellation,
    data::WorkData,
    error::WorkStageError,
    status::{Stage, WorkId, WorkState, WorkStatus},
};

#[async_trait]
pub trait WorkStage: Send + Sync {
    /// Files a stage leaves behind must go through `cancel.commit` so they
    /// disappear with a replaced chain.
    async fn run(
        &self,
        input: WorkData,
        cancel: &ChainCancellation,
    ) -> Result<WorkData, WorkStageError>;
}

/// A cleanup → blur → save chain. The order is fixed by construction.
pub struct WorkChain {
    stages: [(Stage, Arc<dyn WorkStage>); 3],
    input: WorkData,
    tags: Vec<String>,
}

impl WorkChain {
    pub fn new(
        cleanup: Arc<dyn WorkStage>,
        blur: Arc<dyn WorkStage>,
        save: Arc<dyn WorkStage>,
        input: WorkData,
    ) -> Self {
        Self {
            stages: [
                (Stage::Cleanup, cleanup),
                (Stage::Blur, blur),
                (Stage::Save, save),
            ],
            input,
            tags: Vec::new(),
        }
    }

    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

struct ActiveChain {
    id: WorkId,
    tags: Vec<String>,
    cancellation: ChainCancellation,
    handle: JoinHandle<()>,
}

impl ActiveChain {
    fn stop(&self) {
        self.cancellation.cancel();
        self.handle.abort();
    }
}

#[derive(Default)]
struct SchedulerState {
    unique: HashMap<String, ActiveChain>,
    tag_status: HashMap<String, watch::Sender<Option<WorkStatus>>>,
}

impl SchedulerState {
    fn tag_sender(&mut self, tag: &str) -> &watch::Sender<Option<WorkStatus>> {
        self.tag_status
            .entry(tag.to_string())
            .or_insert_with(|| watch::channel(None).0)
    }

    fn broadcast(&mut self, tags: &[String], status: &WorkStatus) {
        for tag in tags {
            self.tag_sender(tag).send_replace(Some(status.clone()));
        }
    }

    fn is_current(&self, name: &str, id: WorkId) -> bool {
        self.unique.get(name).map(|active| active.id) == Some(id)
    }
}

/// Runs work chains on the tokio runtime and publishes their status per tag.
#[derive(Clone, Default)]
pub struct WorkScheduler {
    state: Arc<Mutex<SchedulerState>>,
}

impl WorkScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts `chain` under `name`, replacing a chain still pending under the
    /// same name. The replaced chain is aborted, its committed files are
    /// removed and it is reported as cancelled.
    pub async fn enqueue_unique(&self, name: &str, chain: WorkChain) -> WorkId {
        let id = WorkId::new();
        let mut guard = self.state.lock().await;

        if let Some(previous) = guard.unique.remove(name) {
            if !previous.handle.is_finished() {
                previous.stop();
                info!(work_name = name, replaced = %previous.id, "replacing pending work chain");
                let cancelled = WorkStatus {
                    id: previous.id,
                    state: WorkState::Cancelled,
                    output: WorkData::default(),
                };
                guard.broadcast(&previous.tags, &cancelled);
            }
        }

        let WorkChain {
            stages,
            input,
            tags,
        } = chain;
        let enqueued = WorkStatus {
            id,
            state: WorkState::Enqueued,
            output: WorkData::default(),
        };
        guard.broadcast(&tags, &enqueued);

        let cancellation = ChainCancellation::new();
        let handle = tokio::spawn(drive_chain(
            Arc::clone(&self.state),
            name.to_string(),
            id,
            stages,
            input,
            tags.clone(),
            cancellation.clone(),
        ));
        guard.unique.insert(
            name.to_string(),
            ActiveChain {
                id,
                tags,
                cancellation,
                handle,
            },
        );
        info!(work_name = name, %id, "work chain enqueued");
        id
    }

    /// Aborts the chain pending under `name`, if any.
    pub async fn cancel_unique(&self, name: &str) -> bool {
        let mut guard = self.state.lock().await;
        let Some(active) = guard.unique.remove(name) else {
            return false;
        };
        active.stop();
        let cancelled = WorkStatus {
            id: active.id,
            state: WorkState::Cancelled,
            output: WorkData::default(),
        };
        guard.broadcast(&active.tags, &cancelled);
        true
    }

    /// Latest status published under `tag`, followed by every later one.
    pub async fn observe_tag(&self, tag: &str) -> BoxStream<'static, WorkStatus> {
        let receiver = self.state.lock().await.tag_sender(tag).subscribe();
        WatchStream::new(receiver)
            .filter_map(|status| async move { status })
            .boxed()
    }

    pub async fn latest_for_tag(&self, tag: &str) -> Option<WorkStatus> {
        self.state.lock().await.tag_sender(tag).borrow().clone()
    }

    /// Waits for chain `id` to reach a terminal state. Returns `None` when a
    /// newer chain took over the tag before `id` was seen finishing.
    pub async fn wait_for_terminal(&self, tag: &str, id: WorkId) -> Option<WorkStatus> {
        let mut updates = self.observe_tag(tag).await;
        while let Some(status) = updates.next().await {
            if status.id != id {
                // Another chain owns the tag now.
                if status.state != WorkState::Cancelled {
                    return None;
                }
                continue;
            }
            if status.state.is_finished() {
                return Some(status);
            }
        }
        None
    }
}

async fn drive_chain(
    state: Arc<Mutex<SchedulerState>>,
    name: String,
    id: WorkId,
    stages: [(Stage, Arc<dyn WorkStage>); 3],
    input: WorkData,
    tags: Vec<String>,
    cancellation: ChainCancellation,
) {
    let mut data = input;
    for (stage, worker) in stages {
        if !publish(&state, &name, id, &tags, WorkState::Running(stage)).await {
            return;
        }

        match worker.run(data, &cancellation).await {
            Ok(output) => data = output,
            Err(err) => {
                error!(work_name = %name, %id, stage = stage.as_str(), "work stage failed: {err}");
                finish(&state, &name, id, &tags, WorkState::Failed, WorkData::default()).await;
                return;
            }
        }
    }

    info!(work_name = %name, %id, "work chain succeeded");
    finish(&state, &name, id, &tags, WorkState::Succeeded, data).await;
}

async fn publish(
    state: &Mutex<SchedulerState>,
    name: &str,
    id: WorkId,
    tags: &[String],
    work_state: WorkState,
) -> bool {
    let mut guard = state.lock().await;
    if !guard.is_current(name, id) {
        warn!(work_name = name, %id, "dropping status of superseded work chain");
        return false;
    }
    let status = WorkStatus {
        id,
        state: work_state,
        output: WorkData::default(),
    };
    guard.broadcast(tags, &status);
    true
}

async fn finish(
    state: &Mutex<SchedulerState>,
    name: &str,
    id: WorkId,
    tags: &[String],
    work_state: WorkState,
    output: WorkData,
) {
    let mut guard = state.lock().await;
    if !guard.is_current(name, id) {
        return;
    }
    let status = WorkStatus {
        id,
        state: work_state,
        output,
    };
    guard.broadcast(tags, &status);
    guard.unique.remove(name);
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
