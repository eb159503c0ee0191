use anyhow::Context;
use isp_monitor::{
    api::{build_router, AppState},
    config::{ChecksConfig, Config, ObservabilityConfig},
    scheduler::{HttpCheck, MonitorCheck, MonitorChecks, MonitorScheduler, NoopCheck},
    settings::JsonFileSettings,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        eprintln!("Using default configuration");
        Config::default()
    });

    init_tracing(&config.observability);

    tracing::info!("Starting ISP monitor v{}", env!("CARGO_PKG_VERSION"));

    if config.observability.prometheus_enabled {
        if let Err(e) = isp_monitor::metrics::init_metrics() {
            tracing::warn!("Failed to initialize metrics: {}", e);
            tracing::warn!("Continuing without metrics");
        } else {
            tracing::info!("Prometheus metrics initialized");
        }
    } else {
        tracing::info!("Prometheus metrics disabled in configuration");
    }

    // Settings store shared with the ISP application
    let settings = Arc::new(JsonFileSettings::new(&config.settings.path));
    tracing::info!(path = %config.settings.path.display(), "Settings store ready");

    let checks = build_checks(&config.checks)?;

    // Monitoring scheduler
    let scheduler = Arc::new(
        MonitorScheduler::new(settings.clone(), checks).context("failed to build scheduler")?,
    );
    scheduler.initialize();

    let app = build_router(AppState::new(scheduler.clone(), settings));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Admin API listening on http://{}", addr);
    tracing::info!("   Status: http://{}/api/monitoring/status", addr);
    tracing::info!("   Settings: http://{}/api/monitoring/settings", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("admin API server error")?;

    tracing::info!("Shutting down gracefully...");
    scheduler.stop_all();
    Ok(())
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("isp_monitor={},tower_http=info", observability.log_level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    if observability.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn build_checks(config: &ChecksConfig) -> anyhow::Result<MonitorChecks> {
    let mut failure = None;
    let checks = MonitorChecks::from_fn(|kind| -> Arc<dyn MonitorCheck> {
        match config.url(kind) {
            Some(url) => match HttpCheck::new(kind, url, config.timeout()) {
                Ok(check) => {
                    tracing::info!(job = %kind, url = url, "Check delegated to host endpoint");
                    Arc::new(check)
                }
                Err(e) => {
                    failure.get_or_insert(e);
                    Arc::new(NoopCheck::new(kind))
                }
            },
            None => {
                tracing::warn!(job = %kind, "No check endpoint configured, job will only log");
                Arc::new(NoopCheck::new(kind))
            }
        }
    });

    match failure {
        Some(e) => Err(e).context("failed to build check client"),
        None => Ok(checks),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
