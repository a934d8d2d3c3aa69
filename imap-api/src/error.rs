/// Error types for backend access
use thiserror::Error;

/// Main error type for backend calls
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Unexpected status {status} from {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    /// Failed to decode a response body
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL or path could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The backend ran the request but reported a logical failure
    #[error("Backend error for query {query}: {message}")]
    Backend { query: String, message: String },

    /// Payload was well-formed JSON but violated a domain rule
    #[error(transparent)]
    Core(#[from] imap_core::Error),
}

/// Type alias for Results using ApiError
pub type Result<T> = std::result::Result<T, ApiError>;
