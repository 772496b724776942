use thiserror::Error;

/// Failures at the upstream boundary: transport, HTTP status, or a remote
/// error indicator in an otherwise well-formed response.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bridge answered with an explicit error message.
    #[error("{call} failed: {message}")]
    Api { call: String, message: String },

    #[error("rate limited on {call} (retry after {retry_after_secs}s)")]
    RateLimited { call: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {call}")]
    UnexpectedStatus { call: String, status: u16 },

    /// The response body could not be parsed as JSON.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Failures while decoding an upstream payload into canonical entities.
///
/// Only structural problems fail: a record without an identifier or a
/// payload of the wrong kind. Every other field degrades to its default.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("{entity} record {index} has no id")]
    MissingId { entity: &'static str, index: usize },

    #[error("{entity} record {index} is not a JSON object")]
    NotAnObject { entity: &'static str, index: usize },

    #[error("expected a list of {entity} records, got {found}")]
    NotAList {
        entity: &'static str,
        found: &'static str,
    },

    #[error("expected a {entity} object, got {found}")]
    UnexpectedPayload {
        entity: &'static str,
        found: &'static str,
    },
}
