pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::{scheduler::MonitorScheduler, settings::SettingsStore};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub scheduler: Arc<MonitorScheduler>,
    pub settings: Arc<dyn SettingsStore>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(scheduler: Arc<MonitorScheduler>, settings: Arc<dyn SettingsStore>) -> Self {
        Self {
            scheduler,
            settings,
            started_at: Instant::now(),
        }
    }
}
