//! Monitoring scheduler for ISP management deployments.
//!
//! Runs the signal-warning, signal-recap and offline-check jobs on
//! settings-driven intervals and exposes a small admin API to inspect and
//! restart them after a settings change.

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod scheduler;
pub mod settings;

pub use error::{AppError, Result};
pub use scheduler::{JobKind, MonitorChecks, MonitorScheduler, SchedulerStatus};
pub use settings::{JsonFileSettings, MemorySettings, SettingsProvider, SettingsStore};
