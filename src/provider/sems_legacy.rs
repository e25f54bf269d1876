//! SEMS portal, v1 detail API.
//!
//! Same login and session handling as [`super::sems`], but the v1 detail
//! response carries a string `code` and an `inverter` array instead of the
//! flat KPI object. The v1 schema has no yearly figure.

use crate::error::{ParseError, ProviderError};
use crate::model::units::from_kilo;
use crate::model::{SolarStatus, SolarStatusProvider};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_derive::Deserialize;
use std::time::Duration;

use super::client::{http_client, parse_json};
use super::sems::{fetch_detail, login, SemsSession, DEFAULT_BASE_URL, REQUEST_TIMEOUT};
use super::SiteSettings;

const DETAIL_API: &str = "v1/PowerStation/GetMonitorDetailByPowerstationId";

#[derive(Deserialize, Debug)]
struct DetailResponse {
    #[serde(default)]
    msg: String,
    code: String,
    data: Option<DetailData>,
}

#[derive(Deserialize, Debug)]
struct DetailData {
    #[serde(default)]
    inverter: Vec<Inverter>,
}

/// `out_pac` in W, energies in kWh.
#[derive(Deserialize, Debug)]
struct Inverter {
    out_pac: f64,
    eday: f64,
    emonth: f64,
    etotal: f64,
}

fn parse_detail(body: &str) -> Result<SolarStatus, ParseError> {
    let detail: DetailResponse = parse_json(body)?;
    if detail.code != "0" {
        return Err(ParseError::unexpected(format!(
            "failed to retrieve status: code {} {}",
            detail.code, detail.msg
        )));
    }
    let inverter = detail
        .data
        .and_then(|data| data.inverter.into_iter().next())
        .ok_or_else(|| ParseError::empty_array("inverter"))?;

    Ok(SolarStatus {
        power_now: inverter.out_pac,
        energy_today: from_kilo(inverter.eday),
        energy_month: from_kilo(inverter.emonth),
        energy_year: 0.0,
        energy_total: from_kilo(inverter.etotal),
    })
}

pub struct SemsLegacyProvider {
    settings: SiteSettings,
    http: HttpClient,
    base_url: String,
    account: String,
    password: String,
    session: Option<SemsSession>,
}

impl SemsLegacyProvider {
    pub fn new(
        settings: SiteSettings,
        account: String,
        password: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            settings,
            http: http_client(REQUEST_TIMEOUT)?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            account,
            password,
            session: None,
        })
    }
}

#[async_trait]
impl SolarStatusProvider for SemsLegacyProvider {
    fn site(&self) -> &str {
        &self.settings.site
    }

    fn poll_interval(&self) -> Duration {
        self.settings.interval
    }

    async fn fetch_status(&mut self) -> Result<SolarStatus, ProviderError> {
        let session = login(&self.http, &self.base_url, &self.account, &self.password).await?;
        let session = self.session.insert(session);
        let body = fetch_detail(&self.http, &self.base_url, DETAIL_API, session).await?;
        Ok(parse_detail(&body)?)
    }
}
