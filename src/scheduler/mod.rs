//! Monitoring job scheduler
//!
//! Runs the three monitoring jobs of the ISP application (signal warning,
//! signal recap, offline check) on tokio timers, driven by the shared
//! settings store.
//!
//! # Features
//!
//! - **Settings-driven**: enabled flags and intervals are read from the
//!   settings on every (re)start
//! - **Warm-up run**: each job runs once shortly after (re)start, then on
//!   its interval
//! - **Safe reconfiguration**: restart all or one job without leaking timers
//! - **Failure isolation**: a failing or panicking check is logged and
//!   never stops its timer
//! - **Metrics Integration**: Prometheus metrics for check executions
//!
//! # Example
//!
//! ```no_run
//! use isp_monitor::scheduler::{MonitorChecks, MonitorScheduler, NoopCheck};
//! use isp_monitor::settings::JsonFileSettings;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Arc::new(JsonFileSettings::new("settings.json"));
//!     let checks = MonitorChecks::from_fn(|kind| Arc::new(NoopCheck::new(kind)));
//!     let scheduler = MonitorScheduler::new(settings, checks)?;
//!
//!     scheduler.initialize();
//!
//!     // Jobs run in background
//!     tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
//!
//!     scheduler.stop_all();
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod handle;
mod jobs;
mod metrics;
mod tasks;

pub use config::{JobSchedule, JobSettings, MonitoringSettings, MAX_INTERVAL};
pub use core::{MonitorScheduler, MonitoringConfiguration};
pub use error::{CheckError, SchedulerError, SchedulerResult};
pub use handle::TimerHandle;
pub use jobs::{JobKind, JobPhase, JobStatus, SchedulerStatus, Trigger};
pub use metrics::{SchedulerMetrics, SCHEDULER_METRICS};
pub use tasks::{check_fn, FnCheck, HttpCheck, MonitorCheck, MonitorChecks, NoopCheck};
