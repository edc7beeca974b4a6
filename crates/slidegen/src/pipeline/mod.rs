//! Job pipeline: state machine, stage execution and progress reporting.

pub mod controller;
pub mod executor;
pub mod progress;

pub use controller::PipelineController;
pub use executor::StageExecutor;
pub use progress::ProgressReporter;
