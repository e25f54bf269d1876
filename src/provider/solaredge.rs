//! SolarEdge monitoring API client.
//!
//! A single GET of `/site/{pid}/overview` authenticated with an `api_key`
//! query parameter. Figures are already in W and Wh.

use crate::error::{ParseError, ProviderError};
use crate::model::{SolarStatus, SolarStatusProvider};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_derive::Deserialize;
use std::time::Duration;

use super::client::{http_client, parse_json, read_body};
use super::SiteSettings;

pub const DEFAULT_BASE_URL: &str = "https://monitoringapi.solaredge.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Deserialize, Debug)]
struct OverviewResponse {
    overview: Overview,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Overview {
    current_power: CurrentPower,
    last_day_data: EnergyData,
    last_month_data: EnergyData,
    last_year_data: EnergyData,
    life_time_data: EnergyData,
}

#[derive(Deserialize, Debug)]
struct CurrentPower {
    power: f64,
}

#[derive(Deserialize, Debug)]
struct EnergyData {
    energy: f64,
}

fn parse_overview(body: &str) -> Result<SolarStatus, ParseError> {
    let overview = parse_json::<OverviewResponse>(body)?.overview;
    Ok(SolarStatus {
        power_now: overview.current_power.power,
        energy_today: overview.last_day_data.energy,
        energy_month: overview.last_month_data.energy,
        energy_year: overview.last_year_data.energy,
        energy_total: overview.life_time_data.energy,
    })
}

pub struct SolarEdgeProvider {
    settings: SiteSettings,
    http: HttpClient,
    base_url: String,
    api_key: String,
    pid: String,
}

impl SolarEdgeProvider {
    pub fn new(
        settings: SiteSettings,
        api_key: String,
        pid: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            settings,
            http: http_client(REQUEST_TIMEOUT)?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            pid,
        })
    }
}

#[async_trait]
impl SolarStatusProvider for SolarEdgeProvider {
    fn site(&self) -> &str {
        &self.settings.site
    }

    fn poll_interval(&self) -> Duration {
        self.settings.interval
    }

    async fn fetch_status(&mut self) -> Result<SolarStatus, ProviderError> {
        let response = self
            .http
            .get(format!("{}/site/{}/overview", self.base_url, self.pid))
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await?;
        let body = read_body(response).await.inspect_err(|e| {
            if e.is_rate_limited() {
                tracing::warn!(site = %self.settings.site, "SolarEdge API rate limit reached");
            }
        })?;
        Ok(parse_overview(&body)?)
    }
}
