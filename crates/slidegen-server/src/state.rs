use std::sync::Arc;
use std::time::Instant;

use slidegen::SlideService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SlideService>,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: Arc<SlideService>) -> Self {
        Self {
            service,
            start_time: Instant::now(),
        }
    }
}
