use crate::error::ProviderError;
use async_trait::async_trait;
use std::time::Duration;

use super::SolarStatus;

/// Trait for protocol clients that fetch a site's status from a portal.
///
/// Each implementor speaks one portal's API and owns whatever session
/// state that API needs. The state is re-derived on every fetch, so a
/// client never depends on a session surviving between polls.
#[async_trait]
pub trait SolarStatusProvider: Send {
    /// Identifier of the site this client polls.
    fn site(&self) -> &str;

    /// Pause between the end of one poll and the start of the next.
    fn poll_interval(&self) -> Duration;

    /// Fetches the current status in canonical units.
    ///
    /// # Returns
    /// - `Ok(SolarStatus)` with every field populated
    /// - `Err` describing why the poll failed; partial records are never returned
    async fn fetch_status(&mut self) -> Result<SolarStatus, ProviderError>;
}
