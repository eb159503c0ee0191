//! Prometheus registry shared by the daemon

use crate::scheduler::SCHEDULER_METRICS;
use lazy_static::lazy_static;
use prometheus::{Encoder, Registry, TextEncoder};

lazy_static! {
    /// Registry scraped by `GET /metrics`
    pub static ref PROMETHEUS_REGISTRY: Registry = Registry::new();
}

/// Register every collector of the crate (idempotent)
pub fn init_metrics() -> Result<(), prometheus::Error> {
    SCHEDULER_METRICS.register(&PROMETHEUS_REGISTRY)
}

/// Encode the registry in the Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = PROMETHEUS_REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::from("# Error encoding metrics\n");
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics output is not UTF-8: {}", e);
        String::from("# Error encoding metrics\n")
    })
}
