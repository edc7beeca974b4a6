//! HTTP front end for the slidegen pipeline.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use server::{build_router, serve};
pub use state::AppState;
