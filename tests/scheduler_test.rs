//! Comprehensive tests for the monitoring scheduler

mod common;

use common::{capture_logs, counting_check, counting_checks, failing_check, Counters, LogCapture};
use isp_monitor::scheduler::{
    check_fn, JobKind, JobPhase, MonitorScheduler, SchedulerStatus,
};
use isp_monitor::settings::MemorySettings;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, OnceLock, Weak};
use std::time::Duration;

fn scheduler_with(settings: Arc<MemorySettings>) -> (MonitorScheduler, Counters) {
    let (checks, counters) = counting_checks();
    let scheduler = MonitorScheduler::new(settings, checks).expect("Failed to create scheduler");
    (scheduler, counters)
}

/// Every kind on a one second interval, so ticks come long before any warm-up
fn fast_settings() -> Arc<MemorySettings> {
    let settings = Arc::new(MemorySettings::new());
    for kind in JobKind::ALL {
        settings.set(kind.interval_key(), json!(1_000));
    }
    settings
}

fn handles(status: &SchedulerStatus, kind: JobKind) -> (bool, bool) {
    let job = status.job(kind);
    (job.has_interval, job.has_initial_timeout)
}

#[tokio::test(start_paused = true)]
async fn test_initialize_arms_all_jobs() {
    let (scheduler, _) = scheduler_with(Arc::new(MemorySettings::new()));

    scheduler.initialize();

    let status = scheduler.get_status();
    assert!(status.initialized);
    for kind in JobKind::ALL {
        assert_eq!(handles(&status, kind), (true, true), "{} should be armed", kind);
        assert_eq!(status.job(kind).phase, JobPhase::Armed);
        assert_eq!(
            status.job(kind).active_interval_ms,
            Some(kind.default_interval().as_millis() as u64)
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_disabled_job_has_no_handles() {
    let settings = Arc::new(MemorySettings::new());
    settings.set("offlineCheck_notification_enable", json!(false));
    let (scheduler, _) = scheduler_with(settings);

    scheduler.initialize();

    let status = scheduler.get_status();
    assert_eq!(handles(&status, JobKind::OfflineCheck), (false, false));
    assert_eq!(status.offline_check.phase, JobPhase::Stopped);
    assert_eq!(handles(&status, JobKind::SignalWarning), (true, true));
    assert_eq!(handles(&status, JobKind::SignalRecap), (true, true));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_job_never_runs() {
    let settings = fast_settings();
    settings.set("signalRecap_notification_enable", json!("false"));
    let (scheduler, counters) = scheduler_with(settings);

    scheduler.initialize();
    tokio::time::sleep(Duration::from_secs(400)).await;

    assert_eq!(counters.get(JobKind::SignalRecap), 0);
    assert!(counters.get(JobKind::SignalWarning) > 0);
    assert!(counters.get(JobKind::OfflineCheck) > 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_clears_everything() {
    let (scheduler, _) = scheduler_with(Arc::new(MemorySettings::new()));

    scheduler.initialize();
    scheduler.stop_all();

    let status = scheduler.get_status();
    assert!(!status.initialized);
    assert!(status.is_idle());
    for kind in JobKind::ALL {
        assert_eq!(status.job(kind).phase, JobPhase::Stopped);
        assert_eq!(status.job(kind).active_interval_ms, None);
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_all_when_idle_is_noop() {
    let (scheduler, _) = scheduler_with(Arc::new(MemorySettings::new()));

    scheduler.stop_all();
    scheduler.stop_all();

    let status = scheduler.get_status();
    assert!(!status.initialized);
    assert!(status.is_idle());
}

#[tokio::test(start_paused = true)]
async fn test_no_ticks_after_stop_all() {
    let (scheduler, counters) = scheduler_with(fast_settings());

    scheduler.initialize();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    scheduler.stop_all();
    let before = counters.get(JobKind::SignalWarning);

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(before, 2);
    assert_eq!(counters.get(JobKind::SignalWarning), before);
}

#[tokio::test(start_paused = true)]
async fn test_no_orphans_after_any_sequence() {
    let (scheduler, counters) = scheduler_with(fast_settings());

    scheduler.initialize();
    scheduler.restart_job(JobKind::SignalRecap);
    scheduler.restart_all();
    scheduler.initialize();
    scheduler.restart_job(JobKind::OfflineCheck);
    scheduler.stop_all();

    assert!(scheduler.get_status().is_idle());

    tokio::time::sleep(Duration::from_secs(600)).await;
    for kind in JobKind::ALL {
        assert_eq!(counters.get(kind), 0, "{} ran after stop_all", kind);
    }
}

#[tokio::test(start_paused = true)]
async fn test_double_initialize_is_idempotent() {
    let (once, once_counters) = scheduler_with(fast_settings());
    let (twice, twice_counters) = scheduler_with(fast_settings());

    let (capture, _guard) = capture_logs();
    once.initialize();
    twice.initialize();
    twice.initialize();

    let a = once.get_status();
    let b = twice.get_status();
    assert_eq!(a.initialized, b.initialized);
    for kind in JobKind::ALL {
        assert_eq!(handles(&a, kind), handles(&b, kind));
        assert_eq!(a.job(kind).phase, b.job(kind).phase);
        assert_eq!(a.job(kind).active_interval_ms, b.job(kind).active_interval_ms);
    }
    assert!(capture
        .warnings()
        .iter()
        .any(|m| m.contains("already initialized")));

    tokio::time::sleep(Duration::from_millis(3_500)).await;
    assert_eq!(once_counters.get(JobKind::SignalWarning), 3);
    assert_eq!(twice_counters.get(JobKind::SignalWarning), 3);
}

#[tokio::test(start_paused = true)]
async fn test_failing_check_keeps_ticking() {
    let settings = fast_settings();
    let failures = Arc::new(AtomicUsize::new(0));
    let (mut checks, counters) = counting_checks();
    checks.signal_recap = failing_check(failures.clone());

    let scheduler = MonitorScheduler::new(settings, checks).unwrap();
    scheduler.initialize();

    tokio::time::sleep(Duration::from_millis(4_500)).await;

    assert_eq!(failures.load(Ordering::SeqCst), 4);
    assert_eq!(handles(&scheduler.get_status(), JobKind::SignalRecap), (true, true));
    assert_eq!(counters.get(JobKind::SignalWarning), 4);
    assert_eq!(counters.get(JobKind::OfflineCheck), 4);
    assert_eq!(counters.get(JobKind::SignalRecap), 0);
}

#[tokio::test(start_paused = true)]
async fn test_warm_up_delays() {
    let (scheduler, counters) = scheduler_with(Arc::new(MemorySettings::new()));
    scheduler.initialize();

    tokio::time::sleep(Duration::from_secs(9)).await;
    assert_eq!(counters.get(JobKind::SignalWarning), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(counters.get(JobKind::SignalWarning), 1);
    assert_eq!(counters.get(JobKind::SignalRecap), 0);

    let status = scheduler.get_status();
    assert_eq!(status.signal_warning.phase, JobPhase::Running);
    assert!(!status.signal_warning.warm_up_pending);
    assert!(status.signal_warning.has_initial_timeout);
    assert_eq!(status.signal_recap.phase, JobPhase::Armed);

    tokio::time::sleep(Duration::from_secs(290)).await;
    assert_eq!(counters.get(JobKind::SignalRecap), 1);
    assert_eq!(counters.get(JobKind::OfflineCheck), 1);
    assert_eq!(counters.get(JobKind::SignalWarning), 1);
}

#[tokio::test(start_paused = true)]
async fn test_restart_picks_up_new_settings() {
    let settings = Arc::new(MemorySettings::new());
    let (scheduler, _) = scheduler_with(settings.clone());
    scheduler.initialize();

    settings.set("signalWarning_interval", json!("7200000"));
    settings.set("offlineCheck_notification_enable", json!(false));

    // Live read, before any restart
    let current = scheduler.get_current_settings();
    assert_eq!(current.signal_warning.interval_ms, 7_200_000);
    assert_eq!(current.signal_warning.interval_hours, 2);
    assert!(!current.offline_check.enabled);

    // Running timers still use the old values
    let status = scheduler.get_status();
    assert_eq!(status.signal_warning.active_interval_ms, Some(36_000_000));
    assert!(status.offline_check.has_interval);

    scheduler.restart_all();

    let status = scheduler.get_status();
    assert!(status.initialized);
    assert_eq!(status.signal_warning.active_interval_ms, Some(7_200_000));
    assert_eq!(handles(&status, JobKind::OfflineCheck), (false, false));
}

#[tokio::test(start_paused = true)]
async fn test_restart_job_while_not_initialized() {
    let (scheduler, _) = scheduler_with(Arc::new(MemorySettings::new()));

    scheduler.restart_job(JobKind::SignalWarning);

    let status = scheduler.get_status();
    assert!(!status.initialized);
    assert_eq!(handles(&status, JobKind::SignalWarning), (true, true));
    assert_eq!(handles(&status, JobKind::SignalRecap), (false, false));
    assert_eq!(handles(&status, JobKind::OfflineCheck), (false, false));
}

#[tokio::test(start_paused = true)]
async fn test_restart_job_only_touches_that_job() {
    let settings = fast_settings();
    let (scheduler, counters) = scheduler_with(settings.clone());
    scheduler.initialize();

    settings.set("signalRecap_interval", json!(2_000));
    scheduler.restart_job(JobKind::SignalRecap);

    let status = scheduler.get_status();
    assert_eq!(status.signal_recap.active_interval_ms, Some(2_000));
    assert_eq!(status.signal_warning.active_interval_ms, Some(1_000));

    tokio::time::sleep(Duration::from_millis(4_500)).await;
    assert_eq!(counters.get(JobKind::SignalRecap), 2);
    assert_eq!(counters.get(JobKind::SignalWarning), 4);
}

#[tokio::test(start_paused = true)]
async fn test_restart_unknown_job_is_logged_noop() {
    let (scheduler, _) = scheduler_with(Arc::new(MemorySettings::new()));
    scheduler.initialize();
    let before = scheduler.get_status();

    let (capture, _guard) = capture_logs();
    let restarted = scheduler.restart_job_by_name("not_a_real_kind");

    assert!(!restarted);
    assert_eq!(scheduler.get_status(), before);
    assert!(capture
        .warnings()
        .iter()
        .any(|m| m.contains("Unknown monitoring job")));
}

#[tokio::test(start_paused = true)]
async fn test_restart_job_by_name() {
    let (scheduler, _) = scheduler_with(Arc::new(MemorySettings::new()));

    assert!(scheduler.restart_job_by_name("offlineCheck"));
    assert_eq!(handles(&scheduler.get_status(), JobKind::OfflineCheck), (true, true));
}

#[tokio::test(start_paused = true)]
async fn test_restart_all_from_inside_check() {
    let settings = Arc::new(MemorySettings::new());
    settings.set("signalWarning_interval", json!(1_000));

    let slot: Arc<OnceLock<Weak<MonitorScheduler>>> = Arc::new(OnceLock::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let (mut checks, _) = counting_checks();
    let (inner_slot, inner_calls) = (slot.clone(), calls.clone());
    checks.signal_warning = check_fn(move || {
        let slot = inner_slot.clone();
        let calls = inner_calls.clone();
        async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                if let Some(scheduler) = slot.get().and_then(Weak::upgrade) {
                    scheduler.restart_all();
                }
            }
            Ok(())
        }
    });

    let scheduler = Arc::new(MonitorScheduler::new(settings, checks).unwrap());
    slot.set(Arc::downgrade(&scheduler)).unwrap();
    scheduler.initialize();

    // Tick at 1s restarts everything; the new timer ticks at 2s and 3s
    tokio::time::sleep(Duration::from_millis(3_500)).await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    let status = scheduler.get_status();
    assert!(status.initialized);
    assert_eq!(handles(&status, JobKind::SignalWarning), (true, true));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_restart_all_is_serialized() {
    let (scheduler, _) = scheduler_with(Arc::new(MemorySettings::new()));
    scheduler.initialize();

    let capture = LogCapture::default();
    let barrier = Barrier::new(4);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let _guard = capture.attach();
                barrier.wait();
                for _ in 0..25 {
                    scheduler.restart_all();
                }
            });
        }
    });

    assert!(
        capture.warnings().is_empty(),
        "unexpected warnings: {:?}",
        capture.warnings()
    );
    let status = scheduler.get_status();
    assert!(status.initialized);
    for kind in JobKind::ALL {
        assert_eq!(handles(&status, kind), (true, true));
    }
    scheduler.stop_all();
}

#[tokio::test(start_paused = true)]
async fn test_in_flight_check_completes_after_stop() {
    let settings = Arc::new(MemorySettings::new());
    settings.set("signalWarning_interval", json!(1_000));

    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let (mut checks, _) = counting_checks();
    let (s, f) = (started.clone(), finished.clone());
    checks.signal_warning = check_fn(move || {
        let (s, f) = (s.clone(), f.clone());
        async move {
            s.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(5)).await;
            f.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let scheduler = MonitorScheduler::new(settings, checks).unwrap();
    scheduler.start_job(JobKind::SignalWarning);

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    scheduler.stop_all();
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 0);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_slow_checks_may_overlap() {
    let settings = Arc::new(MemorySettings::new());
    settings.set("offlineCheck_interval", json!(1_000));

    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (mut checks, _) = counting_checks();
    let (i, p) = (in_flight.clone(), peak.clone());
    checks.offline_check = check_fn(move || {
        let (i, p) = (i.clone(), p.clone());
        async move {
            let now = i.fetch_add(1, Ordering::SeqCst) + 1;
            p.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(2_500)).await;
            i.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    });

    let scheduler = MonitorScheduler::new(settings, checks).unwrap();
    scheduler.start_job(JobKind::OfflineCheck);

    tokio::time::sleep(Duration::from_millis(4_200)).await;
    assert!(peak.load(Ordering::SeqCst) >= 2);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_interval_falls_back_to_default() {
    let settings = Arc::new(MemorySettings::new());
    settings.set("signalRecap_interval", json!("every now and then"));
    settings.set("offlineCheck_interval", json!(0));
    let (scheduler, _) = scheduler_with(settings);

    scheduler.initialize();

    let status = scheduler.get_status();
    assert_eq!(status.signal_recap.active_interval_ms, Some(21_600_000));
    assert_eq!(status.offline_check.active_interval_ms, Some(43_200_000));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_scheduler_cancels_timers() {
    let settings = Arc::new(MemorySettings::new());
    settings.set("signalWarning_interval", json!(1_000));
    let counter = Arc::new(AtomicUsize::new(0));
    let (mut checks, _) = counting_checks();
    checks.signal_warning = counting_check(counter.clone());

    let scheduler = MonitorScheduler::new(settings, checks).unwrap();
    scheduler.initialize();
    drop(scheduler);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(counter.load(Ordering::SeqCst), 0);
}
