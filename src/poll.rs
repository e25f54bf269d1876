//! Per-site poll loop.
//!
//! Every cycle fetches one status from the provider, folds it into the
//! site's daily series and publishes the result. A failed cycle publishes
//! nothing, so the gauges keep their last good values. The loop never
//! backs off: it sleeps the provider's interval after every cycle.

use crate::aggregation::Aggregator;
use crate::error::PollError;
use crate::metrics::SolarMetrics;
use crate::model::{Snapshot, SolarStatusProvider};
use chrono::{Local, NaiveDate};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling,
    Success,
    Failed,
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PollState::Idle => "idle",
            PollState::Polling => "polling",
            PollState::Success => "success",
            PollState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

pub struct SitePoller {
    provider: Box<dyn SolarStatusProvider>,
    aggregator: Aggregator,
    metrics: Arc<SolarMetrics>,
    cycle_timeout: Duration,
    state: PollState,
}

impl SitePoller {
    pub fn new(
        provider: Box<dyn SolarStatusProvider>,
        aggregator: Aggregator,
        metrics: Arc<SolarMetrics>,
        cycle_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            aggregator,
            metrics,
            cycle_timeout,
            state: PollState::Idle,
        }
    }

    pub fn site(&self) -> &str {
        self.provider.site()
    }

    #[cfg(test)]
    pub fn state(&self) -> PollState {
        self.state
    }

    fn transition(&mut self, next: PollState) {
        tracing::trace!(site = %self.provider.site(), from = %self.state, to = %next, "Poll state");
        self.state = next;
    }

    /// Runs one fetch, aggregate and publish cycle for `today`.
    pub async fn run_cycle(&mut self, today: NaiveDate) -> Result<Snapshot, PollError> {
        self.transition(PollState::Polling);
        let result = self.poll_and_publish(today).await;
        self.transition(if result.is_ok() {
            PollState::Success
        } else {
            PollState::Failed
        });
        result
    }

    async fn poll_and_publish(&mut self, today: NaiveDate) -> Result<Snapshot, PollError> {
        let status = time::timeout(self.cycle_timeout, self.provider.fetch_status())
            .await
            .map_err(|_| PollError::Timeout(self.cycle_timeout.as_secs()))??;
        tracing::debug!(site = %self.provider.site(), "{:?}", status);

        let snapshot = self.aggregator.update(today, &status)?;
        self.metrics.publish(self.provider.site(), &snapshot);
        Ok(snapshot)
    }

    /// Polls forever at the provider's interval.
    pub async fn run(mut self) {
        let interval = self.provider.poll_interval();
        tracing::info!(site = %self.site(), "Polling every {:?}", interval);
        loop {
            self.tick(Local::now().date_naive()).await;
            time::sleep(interval).await;
        }
    }

    async fn tick(&mut self, today: NaiveDate) {
        match self.run_cycle(today).await {
            Ok(snapshot) => tracing::info!(
                site = %self.site(),
                power_now = snapshot.power_now,
                energy_today = snapshot.energy_today,
                "Successfully retrieved status"
            ),
            Err(e) if e.is_storage() => {
                tracing::error!(site = %self.site(), "Failed to update daily series: {:?}", e)
            }
            Err(e) => tracing::warn!(site = %self.site(), "Failed to poll: {:?}", e),
        }
        self.transition(PollState::Idle);
    }
}
