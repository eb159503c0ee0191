//! Translation from settings to job schedules

use super::jobs::JobKind;
use crate::settings::SettingsProvider;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const HOUR_MS: f64 = 3_600_000.0;

/// Longest interval a job may be scheduled with
pub const MAX_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Schedule of one job as read from the settings at a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobSchedule {
    pub kind: JobKind,
    pub enabled: bool,
    pub interval: Duration,
    pub warm_up: Duration,
}

impl JobSchedule {
    /// Live read of `kind`'s schedule
    pub fn resolve(kind: JobKind, settings: &dyn SettingsProvider) -> Self {
        let enabled = settings.get_bool(&kind.enable_key(), true);
        let mut interval = settings.get_millis(&kind.interval_key(), kind.default_interval());
        if interval > MAX_INTERVAL {
            warn!(
                job = %kind,
                interval_ms = interval.as_millis() as u64,
                "Interval too long, clamping to one year"
            );
            interval = MAX_INTERVAL;
        }

        Self {
            kind,
            enabled,
            interval,
            warm_up: kind.warm_up_delay(),
        }
    }
}

/// Effective settings of one job kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSettings {
    pub enabled: bool,
    pub interval_ms: u64,
    /// Interval rounded to whole hours, for display
    pub interval_hours: u64,
}

impl From<JobSchedule> for JobSettings {
    fn from(schedule: JobSchedule) -> Self {
        let interval_ms = schedule.interval.as_millis() as u64;
        Self {
            enabled: schedule.enabled,
            interval_ms,
            interval_hours: (interval_ms as f64 / HOUR_MS).round() as u64,
        }
    }
}

/// Pending configuration of all jobs, as `get_current_settings` returns it.
///
/// This is what a restart would apply, not necessarily what the running
/// timers use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringSettings {
    pub signal_warning: JobSettings,
    pub signal_recap: JobSettings,
    pub offline_check: JobSettings,
}

impl MonitoringSettings {
    pub fn read(settings: &dyn SettingsProvider) -> Self {
        let read = |kind| JobSettings::from(JobSchedule::resolve(kind, settings));
        Self {
            signal_warning: read(JobKind::SignalWarning),
            signal_recap: read(JobKind::SignalRecap),
            offline_check: read(JobKind::OfflineCheck),
        }
    }

    pub fn job(&self, kind: JobKind) -> &JobSettings {
        match kind {
            JobKind::SignalWarning => &self.signal_warning,
            JobKind::SignalRecap => &self.signal_recap,
            JobKind::OfflineCheck => &self.offline_check,
        }
    }
}
