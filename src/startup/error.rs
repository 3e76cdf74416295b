use crate::startup::progress::StepId;
use thiserror::Error;

pub type ReadinessResult<T> = Result<T, ReadinessError>;

/// Errors surfaced to the code driving a loading session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    /// The id does not name any step of the session
    #[error("Unknown step: {0}")]
    UnknownStep(StepId),

    /// The same id appears twice in a step sequence
    #[error("Duplicate step id: {0}")]
    DuplicateStep(StepId),
}
