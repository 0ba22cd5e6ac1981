//! In-memory task records for pipeline runs.
//!
//! A run is submitted as a future and executed on the tokio runtime; the
//! caller gets a [`TaskId`] back immediately and polls its [`TaskStatus`].
//! Records expire after a fixed time to live.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use moka::future::Cache as MokaCache;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::output::{CourseOutput, CourseSummary};
use super::PipelineError;

/// Most task records kept at once.
const MAX_TASKS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Where a task is in its lifecycle.
#[derive(Debug, Clone)]
pub enum TaskState {
    Running,
    Succeeded(Arc<CourseOutput>),
    Failed(String),
}

impl TaskState {
    pub fn is_done(&self) -> bool {
        !matches!(self, TaskState::Running)
    }
}

/// The polling view of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub done: bool,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&TaskState> for TaskStatus {
    fn from(state: &TaskState) -> Self {
        match state {
            TaskState::Running => TaskStatus {
                done: false,
                success: false,
                error: None,
                message: Some("planning course".to_string()),
            },
            TaskState::Succeeded(output) => {
                let summary = CourseSummary::from(output.as_ref());
                TaskStatus {
                    done: true,
                    success: true,
                    error: None,
                    message: Some(format!(
                        "{} stops, about {:.0} min, {} warning(s)",
                        summary.stops, summary.total_minutes, summary.warnings
                    )),
                }
            }
            TaskState::Failed(reason) => TaskStatus {
                done: true,
                success: false,
                error: Some(reason.clone()),
                message: None,
            },
        }
    }
}

/// Handle to a submitted run.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Wait until the task's final state has been recorded.
    pub async fn finished(self) {
        if let Err(e) = self.join.await {
            warn!(task = %self.id, error = %e, "task join failed");
        }
    }
}

/// Process-local store of task records.
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: MokaCache<TaskId, TaskState>,
}

impl TaskRegistry {
    pub fn new(ttl: Duration) -> Self {
        let tasks = MokaCache::builder()
            .time_to_live(ttl)
            .max_capacity(MAX_TASKS)
            .build();
        Self { tasks }
    }

    /// Record a new running task and execute `run` in the background.
    ///
    /// A panic inside `run` is caught and recorded as a failure.
    pub async fn submit<F>(&self, run: F) -> TaskHandle
    where
        F: Future<Output = Result<CourseOutput, PipelineError>> + Send + 'static,
    {
        let id = TaskId::new();
        self.tasks.insert(id, TaskState::Running).await;
        info!(task = %id, "task submitted");

        let tasks = self.tasks.clone();
        let join = tokio::spawn(async move {
            let state = match AssertUnwindSafe(run).catch_unwind().await {
                Ok(Ok(output)) => {
                    info!(task = %id, stops = output.sequence.len(), "task succeeded");
                    TaskState::Succeeded(Arc::new(output))
                }
                Ok(Err(e)) => {
                    if e.is_request_error() {
                        info!(task = %id, error = %e, "task rejected");
                    } else {
                        error!(task = %id, error = %e, "task failed");
                    }
                    TaskState::Failed(e.to_string())
                }
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    error!(task = %id, reason = %reason, "task panicked");
                    TaskState::Failed(format!("internal error: {reason}"))
                }
            };
            tasks.insert(id, state).await;
        });

        TaskHandle { id, join }
    }

    pub async fn state(&self, id: &TaskId) -> Option<TaskState> {
        self.tasks.get(id).await
    }

    pub async fn status(&self, id: &TaskId) -> Option<TaskStatus> {
        self.state(id).await.map(|s| TaskStatus::from(&s))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "pipeline panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use tokio::sync::oneshot;

    use super::*;
    use crate::course::AssemblyError;

    fn empty_output() -> CourseOutput {
        CourseOutput {
            places: vec![],
            sequence: vec![],
            estimated_duration: BTreeMap::new(),
            route_paths: None,
            segments: vec![],
            warnings: vec![],
        }
    }

    fn registry() -> TaskRegistry {
        TaskRegistry::new(Duration::from_secs(60))
    }

    #[tokio::test]
    async fn running_until_the_run_completes() {
        let tasks = registry();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tasks
            .submit(async move {
                let _ = rx.await;
                Ok(empty_output())
            })
            .await;
        let id = handle.id();

        assert!(!tasks.state(&id).await.unwrap().is_done());
        let status = tasks.status(&id).await.unwrap();
        assert!(!status.done);
        assert!(!status.success);

        tx.send(()).unwrap();
        handle.finished().await;

        let status = tasks.status(&id).await.unwrap();
        assert!(status.done);
        assert!(status.success);
        assert_eq!(status.error, None);
        assert!(matches!(tasks.state(&id).await, Some(TaskState::Succeeded(_))));
    }

    #[tokio::test]
    async fn failure_sets_error() {
        let tasks = registry();

        let handle = tasks
            .submit(async {
                Err(PipelineError::from(AssemblyError::InsufficientCandidates {
                    found: 1,
                    required: 3,
                }))
            })
            .await;
        let id = handle.id();
        handle.finished().await;

        let status = tasks.status(&id).await.unwrap();
        assert!(status.done);
        assert!(!status.success);
        assert!(status.error.unwrap().contains("1 candidates"));
    }

    #[tokio::test]
    async fn panic_is_recorded_as_failure() {
        let tasks = registry();

        let handle = tasks
            .submit(async {
                if true {
                    panic!("boom");
                }
                Ok::<_, PipelineError>(empty_output())
            })
            .await;
        let id = handle.id();
        handle.finished().await;

        let status = tasks.status(&id).await.unwrap();
        assert!(status.done);
        assert!(!status.success);
        assert_eq!(status.error.as_deref(), Some("internal error: boom"));
    }

    #[tokio::test]
    async fn unknown_task_has_no_status() {
        assert!(registry().status(&TaskId::new()).await.is_none());
    }

    #[tokio::test]
    async fn records_expire() {
        let tasks = TaskRegistry::new(Duration::from_millis(50));
        let handle = tasks.submit(async { Ok(empty_output()) }).await;
        let id = handle.id();
        handle.finished().await;

        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(tasks.status(&id).await.is_none());
    }

    #[test]
    fn task_id_round_trips_through_text() {
        let id = TaskId::new();
        assert_eq!(id.to_string().parse::<TaskId>().unwrap(), id);
        assert!("not-a-uuid".parse::<TaskId>().is_err());
    }

    #[test]
    fn status_json_omits_absent_fields() {
        let json = serde_json::to_value(TaskStatus::from(&TaskState::Failed("x".into()))).unwrap();
        assert_eq!(json, serde_json::json!({"done": true, "success": false, "error": "x"}));
    }
}
