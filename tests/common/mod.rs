//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use isp_monitor::scheduler::{check_fn, CheckError, JobKind, MonitorCheck, MonitorChecks};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Invocation counters, one per job kind
#[derive(Clone, Default)]
pub struct Counters {
    signal_warning: Arc<AtomicUsize>,
    signal_recap: Arc<AtomicUsize>,
    offline_check: Arc<AtomicUsize>,
}

impl Counters {
    pub fn counter(&self, kind: JobKind) -> Arc<AtomicUsize> {
        match kind {
            JobKind::SignalWarning => self.signal_warning.clone(),
            JobKind::SignalRecap => self.signal_recap.clone(),
            JobKind::OfflineCheck => self.offline_check.clone(),
        }
    }

    pub fn get(&self, kind: JobKind) -> usize {
        self.counter(kind).load(Ordering::SeqCst)
    }
}

/// A check that counts its invocations and succeeds
pub fn counting_check(counter: Arc<AtomicUsize>) -> Arc<dyn MonitorCheck> {
    check_fn(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    })
}

/// A check that counts its invocations and always fails
pub fn failing_check(counter: Arc<AtomicUsize>) -> Arc<dyn MonitorCheck> {
    check_fn(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CheckError::Failed("ACS unreachable".to_string()))
        }
    })
}

/// Counting checks for all three kinds
pub fn counting_checks() -> (MonitorChecks, Counters) {
    let counters = Counters::default();
    let checks = MonitorChecks::from_fn(|kind| counting_check(counters.counter(kind)));
    (checks, counters)
}

/// Log events captured by [`capture_logs`]
#[derive(Clone, Default)]
pub struct LogCapture {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl LogCapture {
    pub fn warnings(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, _)| *level == Level::WARN)
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Route the calling thread's events into this capture
    pub fn attach(&self) -> tracing::subscriber::DefaultGuard {
        tracing::subscriber::set_default(tracing_subscriber::registry().with(self.clone()))
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.events
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{:?}", value);
        }
    }
}

/// Capture log events on the current thread until the guard is dropped
pub fn capture_logs() -> (LogCapture, tracing::subscriber::DefaultGuard) {
    let capture = LogCapture::default();
    let guard = capture.attach();
    (capture, guard)
}
