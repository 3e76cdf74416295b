pub mod cli;
pub mod config;
pub mod startup;
pub mod theme;

pub use config::LoaderConfig;
pub use startup::{LoaderView, ReadinessError, ReadinessHandle, ReadinessState, ReadinessTracker, Step, StepId};
