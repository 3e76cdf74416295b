//! Initializer tasks that report into a loading session
//!
//! Each task waits for its work to finish and then marks its step done
//! through a [`ReadinessHandle`]. Tasks are plain tokio tasks; dropping the
//! runner aborts whatever is still running.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::startup::error::{ReadinessError, ReadinessResult};
use crate::startup::manager::ReadinessHandle;
use crate::startup::progress::StepId;

/// How a batch of simulated initializers is scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// One after another, in sequence order
    #[default]
    Sequential,
    /// All at once; completions may arrive out of order
    Concurrent,
}

/// A simulated unit of initialization work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepTask {
    pub id: StepId,
    pub delay: Duration,
}

impl StepTask {
    pub fn new(id: impl Into<StepId>, delay: Duration) -> Self {
        Self {
            id: id.into(),
            delay,
        }
    }
}

pub struct StepRunner {
    handle: ReadinessHandle,
    tasks: Vec<JoinHandle<ReadinessResult<()>>>,
}

impl StepRunner {
    pub fn new(handle: ReadinessHandle) -> Self {
        Self {
            handle,
            tasks: Vec::new(),
        }
    }

    /// Run `work` and mark `id` done once it resolves
    pub fn spawn<F>(&mut self, id: impl Into<StepId>, work: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let id = id.into();
        let handle = self.handle.clone();
        self.tasks.push(tokio::spawn(async move {
            work.await;
            handle.mark_step_done(id)
        }));
    }

    /// Spawn simulated tasks that only sleep for their configured delay
    pub fn spawn_simulated(&mut self, tasks: Vec<StepTask>, mode: RunMode) {
        match mode {
            RunMode::Concurrent => {
                for task in tasks {
                    self.spawn(task.id, tokio::time::sleep(task.delay));
                }
            }
            RunMode::Sequential => {
                let handle = self.handle.clone();
                self.tasks.push(tokio::spawn(async move {
                    for task in tasks {
                        tokio::time::sleep(task.delay).await;
                        handle.mark_step_done(task.id)?;
                    }
                    Ok::<(), ReadinessError>(())
                }));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Abort all running tasks
    pub fn cancel(&self) {
        for task in &self.tasks {
            task.abort();
        }
    }

    /// Wait for every task; the first initializer error is returned
    pub async fn wait(mut self) -> ReadinessResult<()> {
        let mut result = Ok(());
        for task in std::mem::take(&mut self.tasks) {
            match task.await {
                Ok(Err(e)) if result.is_ok() => result = Err(e),
                Ok(_) => {}
                Err(e) => tracing::debug!("Initializer task ended early: {}", e),
            }
        }
        result
    }
}

impl Drop for StepRunner {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup::manager::ReadinessTracker;
    use crate::startup::progress::Step;

    fn handle(ids: &[&str]) -> ReadinessHandle {
        let steps = ids.iter().map(|id| Step::new(*id, *id)).collect();
        ReadinessHandle::new(ReadinessTracker::new(steps).unwrap())
    }

    #[tokio::test]
    async fn test_sequential_tasks_complete_session() {
        let handle = handle(&["a", "b", "c"]);
        let mut runner = StepRunner::new(handle.clone());
        runner.spawn_simulated(
            vec![
                StepTask::new("a", Duration::from_millis(5)),
                StepTask::new("b", Duration::from_millis(5)),
                StepTask::new("c", Duration::from_millis(5)),
            ],
            RunMode::Sequential,
        );
        assert_eq!(runner.len(), 1);

        runner.wait().await.unwrap();
        assert!(handle.observe_all_ready());
    }

    #[tokio::test]
    async fn test_concurrent_tasks_complete_session() {
        let handle = handle(&["a", "b"]);
        let mut runner = StepRunner::new(handle.clone());
        runner.spawn_simulated(
            vec![
                StepTask::new("a", Duration::from_millis(20)),
                StepTask::new("b", Duration::from_millis(1)),
            ],
            RunMode::Concurrent,
        );
        assert_eq!(runner.len(), 2);

        runner.wait().await.unwrap();
        assert!(handle.observe_all_ready());
    }

    #[tokio::test]
    async fn test_unknown_step_reaches_caller() {
        let handle = handle(&["a"]);
        let mut runner = StepRunner::new(handle.clone());
        runner.spawn("missing", async {});

        let err = runner.wait().await.unwrap_err();
        assert_eq!(err, ReadinessError::UnknownStep(StepId::new("missing")));
        assert!(!handle.observe_all_ready());
    }

    #[tokio::test]
    async fn test_cancelled_tasks_leave_session_pending() {
        let handle = handle(&["a"]);
        let mut runner = StepRunner::new(handle.clone());
        runner.spawn_simulated(
            vec![StepTask::new("a", Duration::from_secs(60))],
            RunMode::Sequential,
        );

        runner.cancel();
        runner.wait().await.unwrap();
        assert!(!handle.observe_all_ready());
    }
}
