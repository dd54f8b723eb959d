//! Drive HTTP transport.
//!
//! [`DriveTransport`] is the seam between a drive client and the network: a
//! client builds [`ApiRequest`]s against relative endpoint paths and gets back
//! the decoded JSON body plus any `Set-Cookie` values. Tests substitute a
//! scripted transport.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, ORIGIN, REFERER, SET_COOKIE, USER_AGENT};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::http_client::HttpClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
}

/// One drive API call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: ApiMethod,
    /// Endpoint path relative to the transport's base URL.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: ApiMethod::Get,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: ApiMethod::Post,
            path: path.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    /// Add a query parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: impl ToString) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Value of query parameter `name`.
    #[must_use]
    pub fn query_value(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Decoded response of a drive API call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApiResponse {
    /// Raw `Set-Cookie` header values, in order.
    pub set_cookies: Vec<String>,
    pub body: Value,
}

impl ApiResponse {
    #[must_use]
    pub fn json(body: Value) -> Self {
        Self {
            set_cookies: Vec::new(),
            body,
        }
    }
}

#[async_trait]
pub trait DriveTransport: Send + Sync {
    /// Send `request` authenticated with `cookie`.
    async fn send(&self, request: &ApiRequest, cookie: &str) -> Result<ApiResponse>;
}

/// Fixed request profile of one drive's web API.
#[derive(Debug, Clone)]
pub struct DriveEndpoint {
    pub base_url: &'static str,
    pub user_agent: &'static str,
    pub referer: &'static str,
    pub origin: &'static str,
    /// Query parameters sent with every request.
    pub fixed_query: &'static [(&'static str, &'static str)],
}

/// [`DriveTransport`] over the shared HTTP client.
pub struct HttpTransport {
    client: HttpClient,
    endpoint: DriveEndpoint,
    headers: HeaderMap,
}

impl HttpTransport {
    pub fn new(client: HttpClient, endpoint: DriveEndpoint) -> Result<Self> {
        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|e| Error::InvalidInput(format!("bad header value: {e}")))
        };
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, header(endpoint.user_agent)?);
        headers.insert(REFERER, header(endpoint.referer)?);
        headers.insert(ORIGIN, header(endpoint.origin)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(Self {
            client,
            endpoint,
            headers,
        })
    }
}

#[async_trait]
impl DriveTransport for HttpTransport {
    #[instrument(skip(self, request, cookie), fields(path = %request.path))]
    async fn send(&self, request: &ApiRequest, cookie: &str) -> Result<ApiResponse> {
        let url = format!("{}{}", self.endpoint.base_url, request.path);
        let method = match request.method {
            ApiMethod::Get => Method::GET,
            ApiMethod::Post => Method::POST,
        };

        let mut builder = self
            .client
            .inner()
            .request(method, &url)
            .headers(self.headers.clone())
            .query(self.endpoint.fixed_query)
            .query(&request.query);
        if !cookie.is_empty() {
            let value = HeaderValue::from_str(cookie)
                .map_err(|e| Error::InvalidInput(format!("cookie is not a valid header value: {e}")))?;
            builder = builder.header(COOKIE, value);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(ToString::to_string)
            .collect();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), len = bytes.len(), "Drive response");

        if !status.is_success() {
            // The API reports auth and quota failures as JSON on 4xx
            return Err(api_error(&bytes).unwrap_or(Error::Status {
                url,
                status: status.as_u16(),
            }));
        }

        Ok(ApiResponse {
            set_cookies,
            body: serde_json::from_slice(&bytes)?,
        })
    }
}

/// Application error carried in a response body, if the body has a non-zero `code`.
pub(crate) fn api_error(bytes: &[u8]) -> Option<Error> {
    let body: Value = serde_json::from_slice(bytes).ok()?;
    body_error(&body)
}

pub(crate) fn body_error(body: &Value) -> Option<Error> {
    let code = body.get("code")?.as_i64()?;
    if code == 0 {
        return None;
    }
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some(Error::Api { code, message })
}
