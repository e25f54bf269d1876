//! Ginlong (Solis) portal client.
//!
//! Form login to `validateLogin.json` yields a `JSESSIONID` cookie, which
//! the plant detail request must carry. Energies are reported in kWh.

use crate::error::{ParseError, ProviderError};
use crate::model::units::from_kilo;
use crate::model::{SolarStatus, SolarStatusProvider};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client as HttpClient;
use serde_derive::Deserialize;
use std::time::Duration;

use super::client::{cookie_header, find_cookie, http_client, parse_json, read_body};
use super::SiteSettings;

pub const DEFAULT_BASE_URL: &str = "https://m.ginlong.com";
const SESSION_COOKIE: &str = "JSESSIONID";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize, Debug)]
struct PlantDetailResponse {
    result: PlantDetailResult,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlantDetailResult {
    plant_all_wapper: PlantAllWrapper,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlantAllWrapper {
    plant_data: PlantData,
}

/// `power` in W, energies in kWh.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PlantData {
    power: f64,
    energy_today: f64,
    energy_month: f64,
    energy_year: f64,
    energy_total: f64,
}

fn parse_plant_detail(body: &str) -> Result<SolarStatus, ParseError> {
    let data = parse_json::<PlantDetailResponse>(body)?
        .result
        .plant_all_wapper
        .plant_data;
    Ok(SolarStatus {
        power_now: data.power,
        energy_today: from_kilo(data.energy_today),
        energy_month: from_kilo(data.energy_month),
        energy_year: from_kilo(data.energy_year),
        energy_total: from_kilo(data.energy_total),
    })
}

pub struct GinlongProvider {
    settings: SiteSettings,
    http: HttpClient,
    base_url: String,
    username: String,
    password: String,
    pid: String,
    session: Option<String>,
}

impl GinlongProvider {
    pub fn new(
        settings: SiteSettings,
        username: String,
        password: String,
        pid: String,
        base_url: Option<String>,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            settings,
            http: http_client(REQUEST_TIMEOUT)?,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            username,
            password,
            pid,
            session: None,
        })
    }

    async fn login(&self) -> Result<String, ProviderError> {
        tracing::debug!("Logging in as user [{}]", self.username);
        let response = self
            .http
            .post(format!("{}/cpro/login/validateLogin.json", self.base_url))
            .form(&[
                ("userName", self.username.as_str()),
                ("userNameDisplay", self.username.as_str()),
                ("password", self.password.as_str()),
                ("lan", "2"),
                ("userType", "C"),
            ])
            .send()
            .await?;
        let session = find_cookie(&response, SESSION_COOKIE);
        read_body(response).await?;
        session.ok_or_else(|| {
            ProviderError::authentication(format!("no {SESSION_COOKIE} cookie in login response"))
        })
    }
}

#[async_trait]
impl SolarStatusProvider for GinlongProvider {
    fn site(&self) -> &str {
        &self.settings.site
    }

    fn poll_interval(&self) -> Duration {
        self.settings.interval
    }

    async fn fetch_status(&mut self) -> Result<SolarStatus, ProviderError> {
        let session = self.login().await?;
        let session = self.session.insert(session);

        let response = self
            .http
            .post(format!(
                "{}/cpro/epc/plantDetail/showPlantDetailAjax.json",
                self.base_url
            ))
            .header(COOKIE, cookie_header(SESSION_COOKIE, session)?)
            .form(&[("plantId", self.pid.as_str())])
            .send()
            .await?;
        let body = read_body(response).await?;
        Ok(parse_plant_detail(&body)?)
    }
}
