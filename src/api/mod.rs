//! HTTP client for the inventory backend.

use std::str::FromStr;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    AdvancedSearchFilters, AdvancedSearchResponse, AueExpiration, DashboardStats,
    DeviceSearchResponse, SecurityAlerts, UserSearchResponse,
};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("fleetview/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API URL '{0}'")]
    InvalidUrl(String),

    #[error("invalid header '{0}', expected 'Key: Value'")]
    InvalidHeader(String),

    #[error("could not set up proxy: {0}")]
    Proxy(#[source] reqwest::Error),

    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Text shown inside a failed panel.
    pub fn detail(&self) -> String {
        match self {
            Self::Status { detail, .. } => detail.clone(),
            Self::Transport(e) if e.is_timeout() => "Request timed out".to_string(),
            Self::Transport(e) if e.is_connect() => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }

    /// Uniform inline error, `Error: <detail>`.
    pub fn display_message(&self) -> String {
        format!("Error: {}", self.detail())
    }
}

#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            proxy: None,
            header: None,
        }
    }
}

/// Splits `Key: Value` into a header pair.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), ApiError> {
    let invalid = || ApiError::InvalidHeader(raw.to_string());
    let (key, value) = raw.split_once(':').ok_or_else(invalid)?;
    let key = HeaderName::from_str(key.trim()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((key, value))
}

/// Parses the base URL and guarantees a trailing slash so endpoint paths join under it.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let mut url = Url::parse(raw.trim()).map_err(|_| ApiError::InvalidUrl(raw.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl(raw.to_string()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Pulls `detail` out of an error body, falling back to the status reason.
fn error_detail(status: StatusCode, body: &[u8]) -> String {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());
    match detail {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        Some(Value::String(_)) | Some(Value::Null) | None => status
            .canonical_reason()
            .map(|r| format!("{r} ({})", status.as_u16()))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
        Some(other) => other.to_string(),
    }
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base = parse_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            HeaderValue::from_static(USER_AGENT),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        if let Some(raw) = config.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (key, value) = parse_header(raw)?;
            headers.append(key, value);
        }

        let mut builder = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs.max(1)));
        if let Some(proxy) = config.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(ApiError::Proxy)?);
        }
        let client = builder.build().map_err(ApiError::Client)?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(path)
            .map_err(|_| ApiError::InvalidUrl(format!("{}{path}", self.base)))?;
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Sends the request and fails on a non-success status; the body is returned undecoded.
    async fn send_raw(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint(path, query)?;
        log::debug!("{method} {url}");
        let response = self.client.request(method, url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let detail = error_detail(status, &body);
            log::warn!("{path} returned {}: {detail}", status.as_u16());
            return Err(ApiError::Status {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(body.to_vec())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let body = self.send_raw(method, path, query).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, query).await
    }

    fn force_query(force: bool) -> Vec<(&'static str, String)> {
        if force {
            vec![("force_refresh", "true".to_string())]
        } else {
            Vec::new()
        }
    }

    pub async fn stats(&self) -> Result<DashboardStats, ApiError> {
        self.get("api/dashboard/stats", &[]).await
    }

    pub async fn aue_expiration(&self, force: bool) -> Result<AueExpiration, ApiError> {
        self.get("api/dashboard/aue-expiration", &Self::force_query(force))
            .await
    }

    pub async fn security_alerts(&self, force: bool) -> Result<SecurityAlerts, ApiError> {
        self.get("api/dashboard/security-alerts", &Self::force_query(force))
            .await
    }

    /// The body is opaque; only the status matters.
    pub async fn refresh_widgets(&self) -> Result<(), ApiError> {
        self.send_raw(Method::POST, "api/dashboard/refresh-widgets", &[])
            .await?;
        Ok(())
    }

    pub async fn search_devices(&self, query: &str) -> Result<DeviceSearchResponse, ApiError> {
        self.get("api/combined/search", &[("query", query.to_string())])
            .await
    }

    pub async fn advanced_search(
        &self,
        filters: &AdvancedSearchFilters,
    ) -> Result<AdvancedSearchResponse, ApiError> {
        self.get("api/devices/advanced-search", &filters.query_pairs())
            .await
    }

    pub async fn search_users(&self, query: &str) -> Result<UserSearchResponse, ApiError> {
        self.get("api/user/search", &[("query", query.to_string())])
            .await
    }
}
