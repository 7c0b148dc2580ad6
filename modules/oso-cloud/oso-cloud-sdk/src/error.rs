//! Error types for the Oso Cloud SDK.

/// Errors detected while composing or decoding a query.
///
/// Builder operations never fail eagerly: the first error is stored in the
/// [`QueryBuilder`](crate::QueryBuilder) and returned by whichever evaluation
/// method is called next. The type is `Clone` so the stored error can be
/// handed out without consuming the builder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// `in_values` referenced a variable that no call in the query uses.
    #[error("can only constrain variables that are used in the query (variable `{id}`)")]
    UnknownVariable { id: String },

    /// `in_values` was called twice for the same variable.
    #[error("can only set values on each variable once (variable `{id}`)")]
    AlreadyConstrained { id: String },

    /// A query argument had an empty type or id.
    #[error("invalid query argument: {reason}")]
    InvalidArgument { reason: String },

    /// A map selector must group by exactly one variable.
    #[error("map selectors must have exactly one entry (got {len})")]
    MultiKeyMapUnsupported { len: usize },

    /// A selector shape that cannot be decoded in its position.
    #[error("unsupported selector shape: {shape}")]
    UnsupportedSelectorShape { shape: &'static str },

    /// The same variable was bound to more than one output column.
    #[error("found a duplicated {var_type} variable; a query variable may not be selected more than once")]
    DuplicatedVariable { var_type: String },

    /// A grouping key variable was absent from a result row.
    #[error("result row is missing a binding for variable `{id}`")]
    MissingBinding { id: String },
}

/// Errors returned by Oso Cloud client calls.
#[derive(Debug, thiserror::Error)]
pub enum OsoCloudError {
    /// The query could not be built or its results could not be decoded.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// A fact or value argument was malformed.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// The service answered with a non-success status.
    #[error("Oso Cloud error: {message}{}", request_id_suffix(.request_id.as_deref()))]
    Api {
        status: u16,
        message: String,
        request_id: Option<String>,
    },

    /// The service could not be reached (connection failure, timeout, ...).
    #[error("transport error: {0}")]
    Transport(String),

    /// The serialized request body exceeds the client-side cap.
    #[error("request payload too large (body size: {size} bytes, max: {max} bytes)")]
    PayloadTooLarge { size: usize, max: usize },

    /// The request body could not be serialized.
    #[error("failed to serialize request: {0}")]
    Serialize(String),

    /// The response body could not be deserialized.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The client was misconfigured.
    #[error("configuration error: {0}")]
    Config(String),
}

impl OsoCloudError {
    /// HTTP status of a server-reported error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Correlation id echoed by the service for a server-reported error.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        match self {
            Self::Api { request_id, .. } => request_id.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the service could not be reached at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

fn request_id_suffix(request_id: Option<&str>) -> String {
    request_id.map_or_else(String::new, |id| format!(" (Request ID: {id})"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn api_error_includes_request_id() {
        let err = OsoCloudError::Api {
            status: 422,
            message: "bad fact".to_owned(),
            request_id: Some("req-123".to_owned()),
        };

        assert_eq!(err.to_string(), "Oso Cloud error: bad fact (Request ID: req-123)");
        assert_eq!(err.status(), Some(422));
        assert_eq!(err.request_id(), Some("req-123"));
    }

    #[test]
    fn api_error_without_request_id() {
        let err = OsoCloudError::Api {
            status: 500,
            message: "boom".to_owned(),
            request_id: None,
        };

        assert_eq!(err.to_string(), "Oso Cloud error: boom");
        assert!(!err.is_transport());
    }

    #[test]
    fn query_error_converts_transparently() {
        let err: OsoCloudError = QueryError::AlreadyConstrained {
            id: "var_abc".to_owned(),
        }
        .into();

        assert_eq!(
            err.to_string(),
            "can only set values on each variable once (variable `var_abc`)"
        );
        assert_eq!(err.status(), None);
    }
}
