pub mod model;
pub mod store;

pub use model::{Job, JobId, JobStatus, JobStatusView, Slide, SlideContent};
pub use store::{JobCounts, JobStore};
