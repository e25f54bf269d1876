//! Omnik portal client.
//!
//! The landing page `/Terminal/TerminalMain.aspx` hands out an
//! `ASP.NET_SessionId` cookie; the AJAX endpoint then returns a JSON array
//! whose first element holds string magnitudes such as `"12.3 kWh"`.
//! Portals in the field run self-signed certificates.

use crate::error::{ParseError, ProviderError};
use crate::model::units::parse_magnitude;
use crate::model::{SolarStatus, SolarStatusProvider};
use async_trait::async_trait;
use reqwest::header::COOKIE;
use reqwest::Client as HttpClient;
use serde_derive::Deserialize;
use std::time::Duration;

use super::client::{cookie_header, find_cookie, insecure_http_client, parse_json, read_body};
use super::SiteSettings;

const SESSION_COOKIE: &str = "ASP.NET_SessionId";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Deserialize, Debug)]
struct TerminalStatus {
    nowpower: String,
    daypower: String,
    monthpower: String,
    #[serde(default)]
    yearpower: String,
    allpower: String,
}

fn parse_terminal(body: &str) -> Result<SolarStatus, ParseError> {
    let terminal = parse_json::<Vec<TerminalStatus>>(body)?
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::empty_array("terminal status"))?;

    let energy_year = parse_magnitude(&terminal.yearpower).unwrap_or_else(|e| {
        tracing::debug!("Ignoring yearly figure: {}", e);
        0.0
    });

    Ok(SolarStatus {
        power_now: parse_magnitude(&terminal.nowpower)?,
        energy_today: parse_magnitude(&terminal.daypower)?,
        energy_month: parse_magnitude(&terminal.monthpower)?,
        energy_year,
        energy_total: parse_magnitude(&terminal.allpower)?,
    })
}

pub struct OmnikProvider {
    settings: SiteSettings,
    http: HttpClient,
    base_url: String,
    pid: String,
    cookie: Option<String>,
}

impl OmnikProvider {
    pub fn new(settings: SiteSettings, base_url: String, pid: String) -> Result<Self, ProviderError> {
        Ok(Self {
            settings,
            http: insecure_http_client(REQUEST_TIMEOUT)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            pid,
            cookie: None,
        })
    }

    async fn open_session(&mut self) -> Result<(), ProviderError> {
        let response = self
            .http
            .get(format!("{}/Terminal/TerminalMain.aspx", self.base_url))
            .query(&[("pid", self.pid.as_str())])
            .send()
            .await?;
        self.cookie = find_cookie(&response, SESSION_COOKIE);
        if self.cookie.is_none() {
            tracing::warn!(site = %self.settings.site, "No {} cookie from landing page", SESSION_COOKIE);
        }
        Ok(())
    }
}

#[async_trait]
impl SolarStatusProvider for OmnikProvider {
    fn site(&self) -> &str {
        &self.settings.site
    }

    fn poll_interval(&self) -> Duration {
        self.settings.interval
    }

    async fn fetch_status(&mut self) -> Result<SolarStatus, ProviderError> {
        self.open_session().await?;

        let random = format!("{:.6}", rand::random::<f32>());
        let mut request = self
            .http
            .get(format!("{}/AjaxService.ashx", self.base_url))
            .query(&[
                ("ac", "upTerminalMain"),
                ("psid", self.pid.as_str()),
                ("random", random.as_str()),
            ]);
        if let Some(cookie) = &self.cookie {
            request = request.header(COOKIE, cookie_header(SESSION_COOKIE, cookie)?);
        }

        let body = read_body(request.send().await?).await?;
        Ok(parse_terminal(&body)?)
    }
}
