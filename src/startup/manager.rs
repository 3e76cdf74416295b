use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::startup::error::{ReadinessError, ReadinessResult};
use crate::startup::progress::{ReadinessState, Step, StepId};

/// Owner of a loading session's step sequence.
///
/// Steps can only move from pending to done; the derived [`ReadinessState`]
/// is recomputed synchronously after every change and published to
/// subscribers when it differs from the previous value.
pub struct ReadinessTracker {
    steps: Vec<Step>,
    started_at: Instant,
    state: ReadinessState,
    state_tx: watch::Sender<ReadinessState>,
}

impl ReadinessTracker {
    pub fn new(steps: Vec<Step>) -> ReadinessResult<Self> {
        let mut seen = HashSet::new();
        for step in &steps {
            if !seen.insert(step.id().clone()) {
                return Err(ReadinessError::DuplicateStep(step.id().clone()));
            }
        }

        let state = ReadinessState::derive(&steps);
        let (state_tx, _) = watch::channel(state.clone());

        tracing::debug!(
            "Loading session created with {} steps ({} already done)",
            state.total,
            state.completed
        );

        Ok(Self {
            steps,
            started_at: Instant::now(),
            state,
            state_tx,
        })
    }

    /// Mark a step as done. Marking an already-done step again is a no-op.
    pub fn mark_step_done(&mut self, id: impl Into<StepId>) -> ReadinessResult<()> {
        let id = id.into();
        let index = self.find_step(&id)?;
        let elapsed = self.started_at.elapsed();

        if !self.steps[index].mark_done(elapsed) {
            tracing::debug!("Step '{}' already done", id);
            return Ok(());
        }

        tracing::debug!("Step '{}' done after {:.1}s", id, elapsed.as_secs_f64());

        self.publish();
        Ok(())
    }

    pub fn observe_all_ready(&self) -> bool {
        self.state.all_ready
    }

    pub fn observe_visible_steps(&self) -> Vec<Step> {
        self.state.visible_steps.clone()
    }

    /// Current derived state
    pub fn state(&self) -> &ReadinessState {
        &self.state
    }

    /// Receive every change of the derived state
    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.state_tx.subscribe()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step(&self, id: &StepId) -> Option<&Step> {
        self.steps.iter().find(|step| step.id() == id)
    }

    pub fn is_done(&self, id: &StepId) -> ReadinessResult<bool> {
        self.find_step(id).map(|index| self.steps[index].is_done())
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    fn publish(&mut self) {
        let next = ReadinessState::derive(&self.steps);
        if next == self.state {
            return;
        }

        if next.all_ready && !self.state.all_ready {
            tracing::info!(
                "All {} steps ready after {:.1}s",
                next.total,
                self.started_at.elapsed().as_secs_f64()
            );
        }

        self.state = next;
        let state = self.state.clone();
        self.state_tx.send_if_modified(move |current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    fn find_step(&self, id: &StepId) -> ReadinessResult<usize> {
        self.steps
            .iter()
            .position(|step| step.id() == id)
            .ok_or_else(|| ReadinessError::UnknownStep(id.clone()))
    }
}

/// Cloneable handle through which asynchronous initializers report progress.
///
/// The lock is held only for the duration of a synchronous recompute.
#[derive(Clone)]
pub struct ReadinessHandle {
    inner: Arc<Mutex<ReadinessTracker>>,
}

impl ReadinessHandle {
    pub fn new(tracker: ReadinessTracker) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracker)),
        }
    }

    pub fn mark_step_done(&self, id: impl Into<StepId>) -> ReadinessResult<()> {
        self.lock().mark_step_done(id)
    }

    pub fn observe_all_ready(&self) -> bool {
        self.lock().observe_all_ready()
    }

    pub fn observe_visible_steps(&self) -> Vec<Step> {
        self.lock().observe_visible_steps()
    }

    pub fn snapshot(&self) -> ReadinessState {
        self.lock().state().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ReadinessState> {
        self.lock().subscribe()
    }

    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed()
    }

    fn lock(&self) -> MutexGuard<'_, ReadinessTracker> {
        // Every mutation is a single flag write plus a recompute, so a
        // poisoned tracker is still consistent.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl From<ReadinessTracker> for ReadinessHandle {
    fn from(tracker: ReadinessTracker) -> Self {
        Self::new(tracker)
    }
}
