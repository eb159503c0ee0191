//! Prometheus metrics for the scheduler module

use super::jobs::{JobKind, Trigger};
use lazy_static::lazy_static;
use prometheus::{CounterVec, GaugeVec, HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Scheduler metrics collection
pub struct SchedulerMetrics {
    /// Check invocations by job and trigger
    pub invocations_total: IntCounterVec,

    /// Failed check invocations by job
    pub failures_total: IntCounterVec,

    /// Check duration in seconds
    pub invocation_duration: HistogramVec,

    /// Live timer handles by job and handle type
    pub live_timers: GaugeVec,

    /// Scheduler lifecycle operations (initialize, stop_all, restart_job...)
    pub lifecycle_total: CounterVec,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self {
            invocations_total: IntCounterVec::new(
                Opts::new(
                    "isp_monitor_check_invocations_total",
                    "Total number of monitoring check invocations",
                ),
                &["job", "trigger"],
            )
            .expect("valid metric definition"),

            failures_total: IntCounterVec::new(
                Opts::new(
                    "isp_monitor_check_failures_total",
                    "Total number of failed monitoring check invocations",
                ),
                &["job"],
            )
            .expect("valid metric definition"),

            invocation_duration: HistogramVec::new(
                HistogramOpts::new(
                    "isp_monitor_check_duration_seconds",
                    "Monitoring check duration in seconds",
                )
                .buckets(vec![0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
                &["job"],
            )
            .expect("valid metric definition"),

            live_timers: GaugeVec::new(
                Opts::new(
                    "isp_monitor_live_timers",
                    "Live timer handles per job and handle type",
                ),
                &["job", "handle"],
            )
            .expect("valid metric definition"),

            lifecycle_total: CounterVec::new(
                Opts::new(
                    "isp_monitor_scheduler_lifecycle_total",
                    "Scheduler lifecycle operations",
                ),
                &["operation"],
            )
            .expect("valid metric definition"),
        }
    }

    pub fn record_invocation(&self, kind: JobKind, trigger: Trigger) {
        self.invocations_total
            .with_label_values(&[kind.as_ref(), trigger.as_ref()])
            .inc();
    }

    pub fn record_completion(&self, kind: JobKind, success: bool, duration_secs: f64) {
        if !success {
            self.failures_total.with_label_values(&[kind.as_ref()]).inc();
        }
        self.invocation_duration
            .with_label_values(&[kind.as_ref()])
            .observe(duration_secs);
    }

    pub fn set_live_timers(&self, kind: JobKind, recurring: bool, initial_delay: bool) {
        self.live_timers
            .with_label_values(&[kind.as_ref(), "recurring"])
            .set(if recurring { 1.0 } else { 0.0 });
        self.live_timers
            .with_label_values(&[kind.as_ref(), "initial_delay"])
            .set(if initial_delay { 1.0 } else { 0.0 });
    }

    pub fn record_lifecycle(&self, operation: &str) {
        self.lifecycle_total.with_label_values(&[operation]).inc();
    }

    /// Register every collector with `registry`. Already-registered
    /// collectors are not an error.
    pub fn register(&self, registry: &prometheus::Registry) -> Result<(), prometheus::Error> {
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(self.invocations_total.clone()),
            Box::new(self.failures_total.clone()),
            Box::new(self.invocation_duration.clone()),
            Box::new(self.live_timers.clone()),
            Box::new(self.lifecycle_total.clone()),
        ];

        for collector in collectors {
            match registry.register(collector) {
                Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

impl Default for SchedulerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

lazy_static! {
    /// Global scheduler metrics instance
    pub static ref SCHEDULER_METRICS: SchedulerMetrics = SchedulerMetrics::new();
}
