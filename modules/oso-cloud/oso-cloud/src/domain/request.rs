//! Replayable request descriptions.

use bytes::Bytes;
use oso_cloud_sdk::OsoCloudError;
use reqwest::Method;
use serde::Serialize;

/// Largest request body the client will send.
pub const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Everything needed to build an HTTP request against any host.
///
/// The body is serialized once and shared between attempts, so a request
/// can be rebuilt for a retry or for the fallback host.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: &'static str,
    body: Option<Bytes>,
    query: Vec<(String, String)>,
    mutation: bool,
}

impl RequestDescriptor {
    #[must_use]
    pub fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path, None)
    }

    /// A `POST` carrying `body` as JSON.
    ///
    /// # Errors
    ///
    /// [`OsoCloudError::Serialize`] if `body` cannot be serialized, or
    /// [`OsoCloudError::PayloadTooLarge`] if it exceeds [`MAX_BODY_SIZE`].
    pub fn post(path: &'static str, body: &impl Serialize) -> Result<Self, OsoCloudError> {
        Ok(Self::new(Method::POST, path, Some(encode_body(body)?)))
    }

    /// A `DELETE` carrying `body` as JSON.
    ///
    /// # Errors
    ///
    /// As [`post`](Self::post).
    pub fn delete(path: &'static str, body: &impl Serialize) -> Result<Self, OsoCloudError> {
        Ok(Self::new(Method::DELETE, path, Some(encode_body(body)?)))
    }

    fn new(method: Method, path: &'static str, body: Option<Bytes>) -> Self {
        Self {
            method,
            path,
            body,
            query: Vec::new(),
            mutation: false,
        }
    }

    #[must_use]
    pub fn with_query(mut self, params: Vec<(String, String)>) -> Self {
        self.query = params;
        self
    }

    /// Mark the request as a write: it never falls back and its response
    /// advances the causal offset.
    #[must_use]
    pub fn mutating(mut self) -> Self {
        self.mutation = true;
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &'static str {
        self.path
    }

    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn is_mutation(&self) -> bool {
        self.mutation
    }

    /// Absolute URL of this request against `base_url`.
    ///
    /// # Errors
    ///
    /// [`OsoCloudError::Serialize`] if the query parameters cannot be encoded.
    pub fn url(&self, base_url: &str) -> Result<String, OsoCloudError> {
        let base = base_url.trim_end_matches('/');
        if self.query.is_empty() {
            return Ok(format!("{base}/api{}", self.path));
        }
        let query = serde_urlencoded::to_string(&self.query)
            .map_err(|e| OsoCloudError::Serialize(e.to_string()))?;
        Ok(format!("{base}/api{}?{query}", self.path))
    }
}

fn encode_body(body: &impl Serialize) -> Result<Bytes, OsoCloudError> {
    let bytes = serde_json::to_vec(body).map_err(|e| OsoCloudError::Serialize(e.to_string()))?;
    if bytes.len() > MAX_BODY_SIZE {
        return Err(OsoCloudError::PayloadTooLarge {
            size: bytes.len(),
            max: MAX_BODY_SIZE,
        });
    }
    Ok(Bytes::from(bytes))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn url_joins_base_and_api_prefix() {
        let req = RequestDescriptor::get("/policy_metadata");

        assert_eq!(
            req.url("https://api.osohq.com/").unwrap(),
            "https://api.osohq.com/api/policy_metadata"
        );
    }

    #[test]
    fn url_encodes_query_parameters() {
        let req = RequestDescriptor::get("/facts").with_query(vec![
            ("predicate".to_owned(), "has_role".to_owned()),
            ("args.0.id".to_owned(), "alice smith".to_owned()),
        ]);

        assert_eq!(
            req.url("http://localhost:8080").unwrap(),
            "http://localhost:8080/api/facts?predicate=has_role&args.0.id=alice+smith"
        );
    }

    #[test]
    fn body_is_reusable_across_attempts() {
        let req = RequestDescriptor::post("/authorize", &json!({"action": "read"})).unwrap();
        let first = req.body().cloned();
        let second = req.clone().body().cloned();

        assert_eq!(first, second);
        assert_eq!(first.unwrap(), Bytes::from_static(br#"{"action":"read"}"#));
        assert!(!req.is_mutation());
    }

    #[test]
    fn oversized_body_fails_before_sending() {
        let huge = "x".repeat(MAX_BODY_SIZE);
        let err = RequestDescriptor::post("/facts", &json!({"src": huge})).unwrap_err();

        assert!(matches!(
            err,
            OsoCloudError::PayloadTooLarge { max: MAX_BODY_SIZE, .. }
        ));
    }
}
