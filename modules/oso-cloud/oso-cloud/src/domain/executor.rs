//! Resilient request executor.
//!
//! Each call is sent to the primary host with a bounded retry budget. If it
//! still fails with a transport error, a `400` or a `5xx`, and the endpoint is
//! on the fallback allow-list, the same request is rebuilt once against the
//! fallback host. The final response is then either returned as raw bytes
//! or turned into an [`OsoCloudError::Api`].

use bytes::Bytes;
use oso_cloud_sdk::OsoCloudError;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use uuid::Uuid;

use super::fallback::{is_fallback_endpoint, status_triggers_fallback};
use super::offset::OffsetTracker;
use super::request::RequestDescriptor;
use crate::config::{OsoCloudConfig, RetryConfig};

/// Offset token header, sent on every request and returned by writes.
pub const OFFSET_HEADER: &str = "OsoOffset";
/// Correlation id echoed into API errors.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

const API_VERSION_HEADER: &str = "x-osoapiversion";
const INSTANCE_ID_HEADER: &str = "x-oso-instance-id";
const USER_AGENT_VALUE: &str = concat!("Oso Cloud (rust; rv:", env!("CARGO_PKG_VERSION"), ")");

#[derive(Debug, Clone, Copy)]
enum Host {
    Primary,
    Fallback,
}

impl Host {
    fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Fallback => "fallback",
        }
    }
}

#[derive(Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Sends [`RequestDescriptor`]s to Oso Cloud.
#[derive(Debug)]
pub struct Executor {
    http: reqwest::Client,
    primary_url: String,
    fallback_url: Option<String>,
    headers: HeaderMap,
    retry: RetryConfig,
    offset: OffsetTracker,
}

impl Executor {
    /// # Errors
    ///
    /// [`OsoCloudError::Config`] if the API key cannot be sent as a header or
    /// the HTTP client cannot be built.
    pub fn new(config: &OsoCloudConfig) -> Result<Self, OsoCloudError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| OsoCloudError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            primary_url: config.url.clone(),
            fallback_url: config.fallback_url.clone().filter(|url| !url.is_empty()),
            headers: default_headers(&config.api_key)?,
            retry: config.retry,
            offset: OffsetTracker::default(),
        })
    }

    #[must_use]
    pub fn offset(&self) -> &OffsetTracker {
        &self.offset
    }

    /// Deliver `request` and return the body of a successful response.
    ///
    /// # Errors
    ///
    /// - [`OsoCloudError::Transport`] if no host could be reached
    /// - [`OsoCloudError::Api`] for a final status outside `200..400`
    /// - [`OsoCloudError::Serialize`] if the URL cannot be built
    pub async fn execute(&self, request: &RequestDescriptor) -> Result<Bytes, OsoCloudError> {
        let url = request.url(&self.primary_url)?;
        let mut outcome = self.send_with_retry(&url, request).await;

        if let Some(fallback_url) = &self.fallback_url
            && is_fallback_endpoint(request)
            && needs_fallback(&outcome)
        {
            tracing::warn!(
                method = %request.method(),
                path = request.path(),
                reason = %describe(&outcome),
                "primary Oso Cloud request failed, trying fallback"
            );
            let url = request.url(fallback_url)?;
            outcome = self.send(&url, request, Host::Fallback, 0).await;
        }

        let response = outcome.map_err(transport_error)?;
        self.finish(request, response).await
    }

    async fn send_with_retry(
        &self,
        url: &str,
        request: &RequestDescriptor,
    ) -> reqwest::Result<Response> {
        let mut attempt = 0;
        loop {
            let outcome = self.send(url, request, Host::Primary, attempt).await;
            if attempt >= self.retry.max_retries || !should_retry(&outcome) {
                return outcome;
            }
            tokio::time::sleep(self.retry.backoff(attempt)).await;
            attempt += 1;
        }
    }

    async fn send(
        &self,
        url: &str,
        request: &RequestDescriptor,
        host: Host,
        attempt: u32,
    ) -> reqwest::Result<Response> {
        tracing::debug!(
            method = %request.method(),
            path = request.path(),
            host = host.as_str(),
            attempt,
            "sending Oso Cloud request"
        );
        let mut builder = self
            .http
            .request(request.method().clone(), url)
            .headers(self.headers.clone());
        if let Some(offset) = self.offset.current() {
            builder = builder.header(OFFSET_HEADER, offset);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.clone());
        }
        builder.send().await
    }

    async fn finish(
        &self,
        request: &RequestDescriptor,
        response: Response,
    ) -> Result<Bytes, OsoCloudError> {
        let status = response.status();
        let request_id = header_string(response.headers(), REQUEST_ID_HEADER);
        let offset = header_string(response.headers(), OFFSET_HEADER);
        let body = response.bytes().await.map_err(transport_error)?;

        if !(200..400).contains(&status.as_u16()) {
            return Err(api_error(status, &body, request_id));
        }
        if request.is_mutation()
            && let Some(token) = offset
        {
            self.offset.advance(token);
        }
        Ok(body)
    }
}

fn default_headers(api_key: &SecretString) -> Result<HeaderMap, OsoCloudError> {
    let mut authorization = HeaderValue::try_from(format!("Bearer {}", api_key.expose_secret()))
        .map_err(|_| OsoCloudError::Config("API key is not a valid header value".to_owned()))?;
    authorization.set_sensitive(true);
    let instance_id = HeaderValue::try_from(Uuid::new_v4().to_string())
        .map_err(|e| OsoCloudError::Config(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, authorization);
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(
        HeaderName::from_static(API_VERSION_HEADER),
        HeaderValue::from_static("0"),
    );
    headers.insert(HeaderName::from_static(INSTANCE_ID_HEADER), instance_id);
    Ok(headers)
}

/// Retry policy of the primary host: connection failures, timeouts, `429`
/// and every `5xx` except `501`.
fn should_retry(outcome: &reqwest::Result<Response>) -> bool {
    match outcome {
        Ok(response) => {
            let status = response.status();
            status == StatusCode::TOO_MANY_REQUESTS
                || (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
        }
        Err(e) => e.is_connect() || e.is_timeout(),
    }
}

fn needs_fallback(outcome: &reqwest::Result<Response>) -> bool {
    match outcome {
        Ok(response) => status_triggers_fallback(response.status()),
        Err(_) => true,
    }
}

fn describe(outcome: &reqwest::Result<Response>) -> String {
    match outcome {
        Ok(response) => response.status().to_string(),
        Err(e) => e.to_string(),
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn transport_error(e: reqwest::Error) -> OsoCloudError {
    OsoCloudError::Transport(e.to_string())
}

fn api_error(status: StatusCode, body: &[u8], request_id: Option<String>) -> OsoCloudError {
    let message = match serde_json::from_slice::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) if body.is_empty() => status.to_string(),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    };
    OsoCloudError::Api {
        status: status.as_u16(),
        message,
        request_id,
    }
}
