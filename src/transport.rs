//! HTTP transport for the ingestion control-plane API.
//!
//! Every boundary call goes through [`Transport::request`], which owns the base address, the JSON
//! headers and the success check. The actual network I/O sits behind [`HttpClient`] so tests can
//! script responses without a server.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Failures surfaced by boundary calls.
///
/// `Display` is the exact text shown to the operator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The boundary answered with a non-success status.
    #[error("{status} {status_text}: {body}")]
    Status {
        status: u16,
        status_text: String,
        body: String,
    },
    /// The request could not be sent or its response could not be read.
    #[error("{0}")]
    Network(String),
    /// A success response whose body is not the expected shape.
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid request body: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Lower-cased header names.
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub status_text: String,
    pub body: String,
}

impl HttpResponse {
    /// Build a response, deriving the status text from the code's canonical reason.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let status_text = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            status_text,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network seam: executes one request and returns the raw response.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send + 'a>>;
}

/// Production client backed by reqwest. No timeout and no retry are configured.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new(user_agent: &str) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = match request.method {
                HttpMethod::Get => self.client.get(&request.url),
                HttpMethod::Post => self.client.post(&request.url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|e| ApiError::Network(e.to_string()))?;

            Ok(HttpResponse {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
                body,
            })
        })
    }
}

/// Per-call overrides for [`Transport::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<serde_json::Value>,
    pub headers: BTreeMap<String, String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: HttpMethod::Get,
            body: None,
            headers: BTreeMap::new(),
        }
    }
}

impl RequestOptions {
    pub fn post() -> Self {
        Self {
            method: HttpMethod::Post,
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }
}

#[derive(Clone)]
pub struct Transport {
    base_url: String,
    client: Arc<dyn HttpClient>,
}

impl Transport {
    pub fn new(base_url: &str, client: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Perform one request against `base_url + path` and decode the JSON body.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        opts: RequestOptions,
    ) -> Result<T, ApiError> {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        headers.extend(opts.headers);

        let body = opts
            .body
            .map(|b| serde_json::to_string(&b))
            .transpose()
            .map_err(|e| ApiError::Encode(e.to_string()))?;

        let request = HttpRequest {
            method: opts.method,
            url: format!("{}{}", self.base_url, path),
            headers,
            body,
        };
        tracing::debug!(method = request.method.as_str(), url = %request.url, "api request");

        let response = self.client.execute(request).await?;
        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status,
                status_text: response.status_text,
                body: response.body,
            });
        }

        serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}
