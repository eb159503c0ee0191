//! Monitoring checks run by the scheduler.
//!
//! The scheduler only decides when a check runs. What a check does (query
//! the ACS for RX power, look for devices that stopped informing, send the
//! WhatsApp recap) belongs to the host application, which supplies one
//! [`MonitorCheck`] per job kind.

use super::error::CheckError;
use super::jobs::JobKind;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// An asynchronous, zero-argument monitoring operation
#[async_trait]
pub trait MonitorCheck: Send + Sync {
    async fn run(&self) -> Result<(), CheckError>;
}

/// Check built from a closure
pub struct FnCheck {
    f: Box<dyn Fn() -> BoxFuture<'static, Result<(), CheckError>> + Send + Sync>,
}

#[async_trait]
impl MonitorCheck for FnCheck {
    async fn run(&self) -> Result<(), CheckError> {
        (self.f)().await
    }
}

/// Wrap an async closure as a check
pub fn check_fn<F, Fut>(f: F) -> Arc<dyn MonitorCheck>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), CheckError>> + Send + 'static,
{
    Arc::new(FnCheck {
        f: Box::new(move || Box::pin(f())),
    })
}

/// The three checks, one per job kind
#[derive(Clone)]
pub struct MonitorChecks {
    pub signal_warning: Arc<dyn MonitorCheck>,
    pub signal_recap: Arc<dyn MonitorCheck>,
    pub offline_check: Arc<dyn MonitorCheck>,
}

impl MonitorChecks {
    pub fn new(
        signal_warning: Arc<dyn MonitorCheck>,
        signal_recap: Arc<dyn MonitorCheck>,
        offline_check: Arc<dyn MonitorCheck>,
    ) -> Self {
        Self {
            signal_warning,
            signal_recap,
            offline_check,
        }
    }

    /// Build all three checks from one factory
    pub fn from_fn(mut make: impl FnMut(JobKind) -> Arc<dyn MonitorCheck>) -> Self {
        Self::new(
            make(JobKind::SignalWarning),
            make(JobKind::SignalRecap),
            make(JobKind::OfflineCheck),
        )
    }

    pub fn get(&self, kind: JobKind) -> Arc<dyn MonitorCheck> {
        match kind {
            JobKind::SignalWarning => self.signal_warning.clone(),
            JobKind::SignalRecap => self.signal_recap.clone(),
            JobKind::OfflineCheck => self.offline_check.clone(),
        }
    }
}

/// Delegates a job to an HTTP endpoint of the host application.
///
/// POSTs `{"job": <kind>}`; any 2xx answer is a success.
pub struct HttpCheck {
    client: reqwest::Client,
    kind: JobKind,
    url: String,
}

impl HttpCheck {
    pub fn new(kind: JobKind, url: impl Into<String>, timeout: Duration) -> Result<Self, CheckError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(CheckError::from)?;

        Ok(Self {
            client,
            kind,
            url: url.into(),
        })
    }
}

#[async_trait]
impl MonitorCheck for HttpCheck {
    async fn run(&self) -> Result<(), CheckError> {
        debug!(job = %self.kind, url = %self.url, "Calling check endpoint");

        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "job": self.kind }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckError::Http {
                status: status.as_u16(),
                url: self.url.clone(),
            });
        }
        Ok(())
    }
}

/// Check that only logs; used for kinds without a configured endpoint
pub struct NoopCheck {
    kind: JobKind,
}

impl NoopCheck {
    pub fn new(kind: JobKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl MonitorCheck for NoopCheck {
    async fn run(&self) -> Result<(), CheckError> {
        debug!(job = %self.kind, "No check endpoint configured, skipping");
        Ok(())
    }
}
