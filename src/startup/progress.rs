use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable identifier of a step, used as the rendering key for its row
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepId(String);

impl StepId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StepId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for StepId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A named unit of initialization work
///
/// A step is done exactly when it carries a completion time, so a finished
/// step always has one to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    id: StepId,
    message: String,
    completed_after: Option<Duration>,
}

impl Step {
    pub fn new(id: impl Into<StepId>, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message: message.into(),
            completed_after: None,
        }
    }

    /// Create a step that is already complete when the session starts
    pub fn completed(id: impl Into<StepId>, message: impl Into<String>) -> Self {
        Self {
            completed_after: Some(Duration::ZERO),
            ..Self::new(id, message)
        }
    }

    pub fn id(&self) -> &StepId {
        &self.id
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_done(&self) -> bool {
        self.completed_after.is_some()
    }

    /// Time since session start at which the step was first marked done
    pub fn completed_after(&self) -> Option<Duration> {
        self.completed_after
    }

    /// Mark the step done at `after`. Returns false if it already was; the
    /// first completion time is kept.
    pub(crate) fn mark_done(&mut self, after: Duration) -> bool {
        if self.is_done() {
            return false;
        }
        self.completed_after = Some(after);
        true
    }
}

/// Derived summary of a step sequence
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReadinessState {
    pub all_ready: bool,
    pub visible_steps: Vec<Step>,
    pub completed: usize,
    pub total: usize,
}

impl ReadinessState {
    /// Derive the state from an ordered step sequence.
    ///
    /// The visible subsequence stops at the first incomplete step, so a later
    /// step finishing early is not shown until everything before it is done.
    pub fn derive(steps: &[Step]) -> Self {
        let first_pending = steps.iter().position(|step| !step.is_done());
        let visible_steps = match first_pending {
            Some(index) => steps[..=index].to_vec(),
            None => steps.to_vec(),
        };

        Self {
            all_ready: first_pending.is_none(),
            visible_steps,
            completed: steps.iter().filter(|step| step.is_done()).count(),
            total: steps.len(),
        }
    }

    pub fn progress_percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed as f64 / self.total as f64 * 100.0
    }
}
