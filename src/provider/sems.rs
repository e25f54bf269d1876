//! SEMS portal client.
//!
//! Login is a form post of `account` / `pwd` to `/Home/Login`. The portal
//! answers with an `ASP.NET_SessionId` cookie and a JSON body whose
//! `data.redirect` path ends in the power station token. The detail request
//! is a form post to `/GopsApi/Post` whose `str` field wraps the API name
//! and the token; it must carry the session cookie.
//!
//! The current detail API returns a flat `data.kpi` object in kW / kWh.

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

pub const DEFAULT_BASE_URL: &str = "https://www.semsportal.com";
pub(crate) const SESSION_COOKIE: &str = "ASP.NET_SessionId";
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const DETAIL_API: &str = "v2/PowerStation/GetMonitorDetailByPowerstationId";

/// Session obtained from one login; replaced on every poll.
#[derive(Debug, Clone, PartialEq)]
pub struct SemsSession {
    pub token: String,
    pub cookie: String,
}

#[derive(Deserialize, Debug)]
struct LoginResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    data: Option<LoginData>,
}

#[derive(Deserialize, Debug)]
struct LoginData {
    #[serde(default)]
    redirect: String,
}

/// Logs in with `account` / `password` and returns a fresh session.
pub(crate) async fn login(
    http: &HttpClient,
    base_url: &str,
    account: &str,
    password: &str,
) -> Result<SemsSession, ProviderError> {
    tracing::debug!("Logging in as user [{}]", account);
    let response = http
        .post(format!("{base_url}/Home/Login"))
        .form(&[("account", account), ("pwd", password)])
        .send()
        .await?;
    let cookie = find_cookie(&response, SESSION_COOKIE);
    let body = read_body(response).await?;

    let login: LoginResponse = parse_json(&body).map_err(|e| {
        ProviderError::authentication(format!("unexpected login response for [{account}]: {e}"))
    })?;
    if login.code != 0 {
        return Err(ProviderError::authentication(format!(
            "failed to log in as user [{account}]: code {} {}",
            login.code, login.msg
        )));
    }
    let cookie = cookie.ok_or_else(|| {
        ProviderError::authentication(format!("no {SESSION_COOKIE} cookie in login response"))
    })?;
    let token = login
        .data
        .as_ref()
        .and_then(|data| data.redirect.rsplit('/').next())
        .unwrap_or_default()
        .to_string();
    if token.is_empty() {
        return Err(ProviderError::authentication("no token in login redirect"));
    }

    tracing::debug!("Successfully logged in as user [{}]", account);
    Ok(SemsSession { token, cookie })
}

/// Posts a detail request for `api` with the session's token and cookie.
pub(crate) async fn fetch_detail(
    http: &HttpClient,
    base_url: &str,
    api: &str,
    session: &SemsSession,
) -> Result<String, ProviderError> {
    let request = serde_json::json!({
        "api": api,
        "param": { "powerStationId": session.token },
    })
    .to_string();

    let response = http
        .post(format!("{base_url}/GopsApi/Post"))
        .query(&[("s", api)])
        .header(COOKIE, cookie_header(SESSION_COOKIE, &session.cookie)?)
        .form(&[("str", request.as_str())])
        .send()
        .await?;
    read_body(response).await
}

#[derive(Deserialize, Debug)]
struct DetailResponse {
    #[serde(rename = "hasError", default)]
    has_error: bool,
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<DetailData>,
}

#[derive(Deserialize, Debug)]
struct DetailData {
    kpi: Kpi,
}

/// Power station KPIs; `pac` in W, every energy figure in kWh.
#[derive(Deserialize, Debug)]
struct Kpi {
    pac: f64,
    // today's generation
    power: f64,
    month_generation: f64,
    year_generation: f64,
    total_power: f64,
}

fn parse_detail(body: &str) -> Result<SolarStatus, ParseError> {
    let detail: DetailResponse = parse_json(body)?;
    if detail.has_error || detail.code != 0 {
        return Err(ParseError::unexpected(format!(
            "failed to retrieve status: code {} {}",
            detail.code, detail.msg
        )));
    }
    let kpi = detail
        .data
        .ok_or_else(|| ParseError::unexpected("missing data"))?
        .kpi;

    Ok(SolarStatus {
        power_now: kpi.pac,
        energy_today: from_kilo(kpi.power),
        energy_month: from_kilo(kpi.month_generation),
        energy_year: from_kilo(kpi.year_generation),
        energy_total: from_kilo(kpi.total_power),
    })
}

pub struct SemsProvider {
    settings: SiteSettings,
    http: HttpClient,
    base_url: String,
    account: String,
    password: String,
    session: Option<SemsSession>,
}

impl SemsProvider {
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
impl SolarStatusProvider for SemsProvider {
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
