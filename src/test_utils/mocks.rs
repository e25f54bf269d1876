//! Mock provider for exercising the poll loop without a portal.

use crate::error::ProviderError;
use crate::model::{SolarStatus, SolarStatusProvider};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// One scripted answer of [`MockProvider`].
#[derive(Debug, Clone)]
pub enum MockResponse {
    Status(SolarStatus),
    /// Fails with the given HTTP status
    Fail(u16),
    /// Never answers within the given time
    Hang(Duration),
}

/// Provider replaying a script of responses, one per call.
///
/// Once the script runs out every call fails with 503.
pub struct MockProvider {
    site: String,
    interval: Duration,
    script: VecDeque<MockResponse>,
    call_count: Arc<AtomicUsize>,
}

impl MockProvider {
    pub fn new(site: impl Into<String>, script: Vec<MockResponse>) -> Self {
        Self {
            site: site.into(),
            interval: Duration::from_millis(10),
            script: script.into(),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Handle to the number of `fetch_status` calls made so far.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait]
impl SolarStatusProvider for MockProvider {
    fn site(&self) -> &str {
        &self.site
    }

    fn poll_interval(&self) -> Duration {
        self.interval
    }

    async fn fetch_status(&mut self) -> Result<SolarStatus, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front().unwrap_or(MockResponse::Fail(503)) {
            MockResponse::Status(status) => Ok(status),
            MockResponse::Fail(code) => Err(ProviderError::http_status(
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                "mock failure".to_string(),
            )),
            MockResponse::Hang(duration) => {
                tokio::time::sleep(duration).await;
                Ok(SolarStatus::default())
            }
        }
    }
}

/// Status with every figure set, energies derived from `energy_today`.
pub fn status(power_now: f64, energy_today: f64) -> SolarStatus {
    SolarStatus {
        power_now,
        energy_today,
        energy_month: energy_today,
        energy_year: energy_today,
        energy_total: energy_today * 100.0,
    }
}
