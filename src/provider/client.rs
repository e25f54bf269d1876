//! HTTP plumbing shared by the portal clients.

use crate::error::{ParseError, ProviderError};
use reqwest::header::HeaderValue;
use reqwest::{Client as HttpClient, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Builds a client whose every request is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<HttpClient, ProviderError> {
    Ok(HttpClient::builder()
        .timeout(timeout)
        .user_agent("solar-exporter")
        .build()?)
}

/// Same as [`http_client`] but accepting self-signed portal certificates.
pub fn insecure_http_client(timeout: Duration) -> Result<HttpClient, ProviderError> {
    Ok(HttpClient::builder()
        .timeout(timeout)
        .user_agent("solar-exporter")
        .danger_accept_invalid_certs(true)
        .build()?)
}

/// Reads the body of a successful response, or turns the status into an error.
pub async fn read_body(response: Response) -> Result<String, ProviderError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ProviderError::http_status(status, body))
    }
}

/// Value of the cookie `name` set by `response`, if any.
pub fn find_cookie(response: &Response, name: &str) -> Option<String> {
    response
        .cookies()
        .find(|cookie| cookie.name() == name && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_string())
}

/// `Cookie` header carrying a single session cookie.
pub fn cookie_header(name: &str, value: &str) -> Result<HeaderValue, ProviderError> {
    HeaderValue::from_str(&format!("{name}={value}"))
        .map_err(|e| ProviderError::authentication(format!("unusable session cookie: {e}")))
}

pub fn parse_json<T: DeserializeOwned>(body: &str) -> Result<T, ParseError> {
    Ok(serde_json::from_str(body)?)
}
