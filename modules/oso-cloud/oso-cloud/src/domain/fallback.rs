//! Which requests may be replayed against the fallback host, and when.

use reqwest::StatusCode;

use super::request::RequestDescriptor;

/// `(path suffix, method)` pairs of the read-only endpoints a fallback host
/// can serve.
const FALLBACK_ENDPOINTS: &[(&str, &str)] = &[
    ("/authorize", "POST"),
    ("/authorize_resources", "POST"),
    ("/list", "POST"),
    ("/actions", "POST"),
    ("/evaluate_query", "POST"),
    ("/evaluate_query_local", "POST"),
    ("/authorize_query", "POST"),
    ("/list_query", "POST"),
    ("/actions_query", "POST"),
    ("/facts", "GET"),
    ("/policy_metadata", "GET"),
];

/// Whether `request` is on the fallback allow-list. Writes never are.
pub fn is_fallback_endpoint(request: &RequestDescriptor) -> bool {
    !request.is_mutation()
        && FALLBACK_ENDPOINTS.iter().any(|(suffix, method)| {
            request.path().ends_with(suffix) && request.method().as_str() == *method
        })
}

/// Whether a primary response status warrants a fallback attempt.
///
/// `400` counts: evaluation failures on the primary have surfaced as `400`.
/// Any other `4xx`, and every `3xx`, is returned to the caller as-is.
pub fn status_triggers_fallback(status: StatusCode) -> bool {
    status == StatusCode::BAD_REQUEST || status.is_server_error()
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn read_endpoints_are_eligible() {
        let body = json!({});
        for path in ["/authorize", "/list", "/actions", "/evaluate_query", "/list_query"] {
            let req = RequestDescriptor::post(path, &body).unwrap();
            assert!(is_fallback_endpoint(&req), "{path}");
        }
        assert!(is_fallback_endpoint(&RequestDescriptor::get("/facts")));
        assert!(is_fallback_endpoint(&RequestDescriptor::get("/policy_metadata")));
    }

    #[test]
    fn writes_are_never_eligible() {
        let body = json!({});
        let insert = RequestDescriptor::post("/facts", &body).unwrap().mutating();
        let delete = RequestDescriptor::delete("/facts", &body).unwrap().mutating();
        let batch = RequestDescriptor::post("/batch", &body).unwrap().mutating();
        let policy = RequestDescriptor::post("/policy", &body).unwrap().mutating();

        for req in [insert, delete, batch, policy] {
            assert!(!is_fallback_endpoint(&req), "{}", req.path());
        }
    }

    #[test]
    fn method_must_match() {
        let post_facts = RequestDescriptor::post("/facts", &json!({})).unwrap();
        assert!(!is_fallback_endpoint(&post_facts));
    }

    #[test]
    fn status_classification() {
        assert!(status_triggers_fallback(StatusCode::BAD_REQUEST));
        assert!(status_triggers_fallback(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(status_triggers_fallback(StatusCode::SERVICE_UNAVAILABLE));

        assert!(!status_triggers_fallback(StatusCode::OK));
        assert!(!status_triggers_fallback(StatusCode::MULTIPLE_CHOICES));
        assert!(!status_triggers_fallback(StatusCode::UNAUTHORIZED));
        assert!(!status_triggers_fallback(StatusCode::NOT_FOUND));
        assert!(!status_triggers_fallback(StatusCode::TOO_MANY_REQUESTS));
    }
}
