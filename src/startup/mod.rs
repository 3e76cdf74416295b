pub mod background_tasks;
pub mod error;
pub mod manager;
pub mod presence;
pub mod progress;
pub mod screen;

pub use background_tasks::{RunMode, StepRunner, StepTask};
pub use error::{ReadinessError, ReadinessResult};
pub use manager::{ReadinessHandle, ReadinessTracker};
pub use presence::{Presence, PresenceDiff, TransitionSpec};
pub use progress::{ReadinessState, Step, StepId};
pub use screen::{diff_rows, Indicator, LoaderView, OverlayNode, RowChange, RowNode, ViewTree};
