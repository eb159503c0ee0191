//! Core scheduler service implementation

use super::{
    config::{JobSchedule, MonitoringSettings},
    error::SchedulerResult,
    handle::TimerHandle,
    jobs::{JobKind, JobPhase, JobStatus, SchedulerStatus, Trigger},
    metrics::SCHEDULER_METRICS,
    tasks::{MonitorCheck, MonitorChecks},
};
use crate::settings::SettingsProvider;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Timers of one job kind
#[derive(Debug)]
struct JobSlot {
    kind: JobKind,
    recurring: Option<TimerHandle>,
    initial_delay: Option<TimerHandle>,
    active_interval: Option<Duration>,
    started_at: Option<DateTime<Utc>>,
}

impl JobSlot {
    fn new(kind: JobKind) -> Self {
        Self {
            kind,
            recurring: None,
            initial_delay: None,
            active_interval: None,
            started_at: None,
        }
    }

    /// Cancel and clear both handles. Returns whether anything was live.
    fn clear(&mut self) -> bool {
        let mut cleared = false;
        if let Some(handle) = self.recurring.take() {
            handle.cancel();
            cleared = true;
        }
        if let Some(handle) = self.initial_delay.take() {
            handle.cancel();
            cleared = true;
        }
        self.active_interval = None;
        self.started_at = None;
        SCHEDULER_METRICS.set_live_timers(self.kind, false, false);
        cleared
    }

    fn status(&self) -> JobStatus {
        let warm_up_pending = self
            .initial_delay
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false);

        let phase = match (&self.recurring, warm_up_pending) {
            (None, false) if self.initial_delay.is_none() => JobPhase::Stopped,
            (_, true) => JobPhase::Armed,
            _ => JobPhase::Running,
        };

        JobStatus {
            has_interval: self.recurring.is_some(),
            has_initial_timeout: self.initial_delay.is_some(),
            warm_up_pending,
            phase,
            active_interval_ms: self.active_interval.map(|d| d.as_millis() as u64),
            started_at: self.started_at,
        }
    }
}

#[derive(Debug)]
struct SchedulerState {
    initialized: bool,
    slots: [JobSlot; 3],
}

impl SchedulerState {
    fn new() -> Self {
        Self {
            initialized: false,
            slots: JobKind::ALL.map(JobSlot::new),
        }
    }

    fn slot_mut(&mut self, kind: JobKind) -> &mut JobSlot {
        &mut self.slots[slot_index(kind)]
    }

    fn slot(&self, kind: JobKind) -> &JobSlot {
        &self.slots[slot_index(kind)]
    }
}

fn slot_index(kind: JobKind) -> usize {
    match kind {
        JobKind::SignalWarning => 0,
        JobKind::SignalRecap => 1,
        JobKind::OfflineCheck => 2,
    }
}

/// Runs the three monitoring jobs and owns their timers.
///
/// One instance per process, owned by the composition root and shared
/// (behind an `Arc`) with whatever must trigger a restart, such as the
/// settings-save handler. No operation returns an error: check failures
/// and misuse are logged and otherwise visible only through
/// [`get_status`](Self::get_status).
pub struct MonitorScheduler {
    settings: Arc<dyn SettingsProvider>,
    checks: MonitorChecks,
    runtime: Handle,
    state: Mutex<SchedulerState>,
}

impl MonitorScheduler {
    /// Create a scheduler bound to the current tokio runtime.
    ///
    /// Nothing is scheduled until [`initialize`](Self::initialize).
    pub fn new(settings: Arc<dyn SettingsProvider>, checks: MonitorChecks) -> SchedulerResult<Self> {
        let runtime = Handle::try_current()?;
        Ok(Self::with_runtime(settings, checks, runtime))
    }

    /// Create a scheduler that spawns its timers on `runtime`
    pub fn with_runtime(
        settings: Arc<dyn SettingsProvider>,
        checks: MonitorChecks,
        runtime: Handle,
    ) -> Self {
        Self {
            settings,
            checks,
            runtime,
            state: Mutex::new(SchedulerState::new()),
        }
    }

    /// Start every enabled job from the current settings.
    ///
    /// Calling it while initialized restarts everything.
    pub fn initialize(&self) {
        let mut state = self.state.lock();
        self.initialize_locked(&mut state);
    }

    fn initialize_locked(&self, state: &mut SchedulerState) {
        if state.initialized {
            warn!("Monitoring scheduler already initialized, restarting all jobs");
            Self::stop_all_locked(state);
        }

        info!("Initializing monitoring scheduler");
        for kind in JobKind::ALL {
            self.start_job_locked(state, kind);
        }
        state.initialized = true;
        SCHEDULER_METRICS.record_lifecycle("initialize");

        info!("Monitoring scheduler initialized");
    }

    /// Start one job from the current settings, replacing any timers it
    /// already has.
    pub fn start_job(&self, kind: JobKind) {
        let mut state = self.state.lock();
        self.start_job_locked(&mut state, kind);
    }

    /// Cancel every timer
    pub fn stop_all(&self) {
        let mut state = self.state.lock();
        Self::stop_all_locked(&mut state);
        SCHEDULER_METRICS.record_lifecycle("stop_all");
    }

    /// Stop everything and initialize again from fresh settings
    pub fn restart_all(&self) {
        info!("Restarting all monitoring jobs");
        let mut state = self.state.lock();
        Self::stop_all_locked(&mut state);
        self.initialize_locked(&mut state);
        SCHEDULER_METRICS.record_lifecycle("restart_all");
    }

    /// Cancel and restart a single job
    pub fn restart_job(&self, kind: JobKind) {
        info!(job = %kind, "Restarting monitoring job");
        let mut state = self.state.lock();
        state.slot_mut(kind).clear();
        self.start_job_locked(&mut state, kind);
        SCHEDULER_METRICS.record_lifecycle("restart_job");
    }

    /// Restart a job by its identifier (`signalWarning`, `signalRecap`,
    /// `offlineCheck`). Unknown names are logged and ignored.
    ///
    /// Returns whether a job was restarted.
    pub fn restart_job_by_name(&self, name: &str) -> bool {
        match JobKind::parse(name) {
            Ok(kind) => {
                self.restart_job(kind);
                true
            }
            Err(e) => {
                warn!(job = name, error = %e, "Unknown monitoring job, restart ignored");
                false
            }
        }
    }

    /// Which timers are live right now
    pub fn get_status(&self) -> SchedulerStatus {
        let state = self.state.lock();
        SchedulerStatus {
            initialized: state.initialized,
            signal_warning: state.slot(JobKind::SignalWarning).status(),
            signal_recap: state.slot(JobKind::SignalRecap).status(),
            offline_check: state.slot(JobKind::OfflineCheck).status(),
        }
    }

    /// Live read of the configured settings of every job.
    ///
    /// Reflects saved edits immediately, even before a restart applies them;
    /// see [`get_configuration`](Self::get_configuration) for the comparison
    /// with what is running.
    pub fn get_current_settings(&self) -> MonitoringSettings {
        MonitoringSettings::read(self.settings.as_ref())
    }

    /// Pending settings next to the running timers, with the kinds a
    /// restart would change
    pub fn get_configuration(&self) -> MonitoringConfiguration {
        let pending = self.get_current_settings();
        let active = self.get_status();

        let drift = JobKind::ALL
            .into_iter()
            .filter(|kind| {
                let want = pending.job(*kind);
                let have = active.job(*kind);
                if want.enabled != have.has_interval {
                    return true;
                }
                have.has_interval && have.active_interval_ms != Some(want.interval_ms)
            })
            .collect();

        MonitoringConfiguration {
            pending,
            active,
            drift,
        }
    }

    fn stop_all_locked(state: &mut SchedulerState) {
        let mut stopped = 0;
        for slot in state.slots.iter_mut() {
            if slot.clear() {
                debug!(job = %slot.kind, "Cancelled monitoring timers");
                stopped += 1;
            }
        }
        state.initialized = false;
        info!(stopped_jobs = stopped, "All monitoring jobs stopped");
    }

    fn start_job_locked(&self, state: &mut SchedulerState, kind: JobKind) {
        let slot = state.slot_mut(kind);
        slot.clear();

        let schedule = JobSchedule::resolve(kind, self.settings.as_ref());
        if !schedule.enabled {
            info!(job = %kind, "Monitoring job disabled, not scheduling");
            return;
        }

        let check = self.checks.get(kind);

        let warm_up_check = check.clone();
        let warm_up = schedule.warm_up;
        let initial_delay = self.runtime.spawn(async move {
            tokio::time::sleep(warm_up).await;
            dispatch(kind, Trigger::WarmUp, warm_up_check);
        });

        let period = schedule.interval;
        let recurring = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                dispatch(kind, Trigger::Interval, check.clone());
            }
        });

        slot.initial_delay = Some(TimerHandle::new(initial_delay.abort_handle()));
        slot.recurring = Some(TimerHandle::new(recurring.abort_handle()));
        slot.active_interval = Some(period);
        slot.started_at = Some(Utc::now());
        SCHEDULER_METRICS.set_live_timers(kind, true, true);

        info!(
            job = %kind,
            interval_ms = period.as_millis() as u64,
            interval_hours = period.as_secs_f64() / 3600.0,
            warm_up_secs = warm_up.as_secs(),
            "Monitoring job scheduled"
        );
    }
}

impl std::fmt::Debug for MonitorScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorScheduler")
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

/// Pending and active configuration side by side
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringConfiguration {
    /// What the settings say now
    pub pending: MonitoringSettings,
    /// What the timers were started with
    pub active: SchedulerStatus,
    /// Kinds whose running timers differ from the pending settings
    pub drift: Vec<JobKind>,
}

/// Run one invocation as a detached task. The timer never waits for it.
fn dispatch(kind: JobKind, trigger: Trigger, check: Arc<dyn MonitorCheck>) {
    tokio::spawn(invoke(kind, trigger, check));
}

/// Run a check, containing its error or panic
async fn invoke(kind: JobKind, trigger: Trigger, check: Arc<dyn MonitorCheck>) {
    SCHEDULER_METRICS.record_invocation(kind, trigger);
    debug!(job = %kind, trigger = %trigger, "Running monitoring check");

    let start = std::time::Instant::now();
    let outcome = AssertUnwindSafe(check.run()).catch_unwind().await;
    let duration = start.elapsed();

    let success = matches!(outcome, Ok(Ok(())));
    SCHEDULER_METRICS.record_completion(kind, success, duration.as_secs_f64());

    match outcome {
        Ok(Ok(())) => {
            info!(
                job = %kind,
                trigger = %trigger,
                duration_ms = duration.as_millis() as u64,
                "Monitoring check completed"
            );
        }
        Ok(Err(e)) => {
            error!(
                job = %kind,
                trigger = %trigger,
                error = %e,
                duration_ms = duration.as_millis() as u64,
                "Monitoring check failed"
            );
        }
        Err(panic) => {
            error!(
                job = %kind,
                trigger = %trigger,
                panic = %panic_message(panic.as_ref()),
                "Monitoring check panicked"
            );
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
