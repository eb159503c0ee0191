//! Job kinds and the per-kind status snapshots

use super::error::{SchedulerError, SchedulerResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use strum::{AsRefStr, Display, EnumString};

const HOUR_MS: u64 = 60 * 60 * 1000;

/// One of the three monitored jobs.
///
/// The set is closed: settings keys, default intervals and warm-up delays
/// are all derived from the kind.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum JobKind {
    /// Signal-level (RX power) warning check
    SignalWarning,
    /// Periodic recap of signal levels
    SignalRecap,
    /// Offline device check
    OfflineCheck,
}

impl JobKind {
    /// All job kinds, in scheduling order
    pub const ALL: [JobKind; 3] = [
        JobKind::SignalWarning,
        JobKind::SignalRecap,
        JobKind::OfflineCheck,
    ];

    /// Resolve a job identifier such as `offlineCheck`
    pub fn parse(name: &str) -> SchedulerResult<Self> {
        Self::from_str(name).map_err(|_| SchedulerError::UnknownJobKind(name.to_string()))
    }

    /// Settings key holding the enabled flag
    pub fn enable_key(&self) -> String {
        format!("{}_notification_enable", self.as_ref())
    }

    /// Settings key holding the interval in milliseconds
    pub fn interval_key(&self) -> String {
        format!("{}_interval", self.as_ref())
    }

    /// Interval used when the settings do not provide one
    pub fn default_interval(&self) -> Duration {
        let hours = match self {
            JobKind::SignalWarning => 10,
            JobKind::SignalRecap => 6,
            JobKind::OfflineCheck => 12,
        };
        Duration::from_millis(hours * HOUR_MS)
    }

    /// Fixed delay before the first run after (re)start. Not configurable.
    pub fn warm_up_delay(&self) -> Duration {
        match self {
            JobKind::SignalWarning => Duration::from_secs(10),
            JobKind::SignalRecap | JobKind::OfflineCheck => Duration::from_secs(5 * 60),
        }
    }
}

/// What caused a check invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    /// The one-shot run after (re)start
    WarmUp,
    /// A recurring tick
    Interval,
}

/// Lifecycle phase of a job, derived from its handles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// No timers
    Stopped,
    /// Timers live, warm-up run not fired yet
    Armed,
    /// Warm-up fired, recurring timer live
    Running,
}

/// Status of one job kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatus {
    /// Recurring handle present
    pub has_interval: bool,

    /// Initial-delay handle present
    pub has_initial_timeout: bool,

    /// Warm-up run has not fired yet
    pub warm_up_pending: bool,

    /// Phase derived from the handles
    pub phase: JobPhase,

    /// Interval the running timer was started with
    pub active_interval_ms: Option<u64>,

    /// When the timers were armed
    pub started_at: Option<DateTime<Utc>>,
}

/// Read-only snapshot returned by `get_status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    pub initialized: bool,
    pub signal_warning: JobStatus,
    pub signal_recap: JobStatus,
    pub offline_check: JobStatus,
}

impl SchedulerStatus {
    pub fn job(&self, kind: JobKind) -> &JobStatus {
        match kind {
            JobKind::SignalWarning => &self.signal_warning,
            JobKind::SignalRecap => &self.signal_recap,
            JobKind::OfflineCheck => &self.offline_check,
        }
    }

    /// True when no kind holds any handle
    pub fn is_idle(&self) -> bool {
        JobKind::ALL.iter().all(|kind| {
            let job = self.job(*kind);
            !job.has_interval && !job.has_initial_timeout
        })
    }
}
