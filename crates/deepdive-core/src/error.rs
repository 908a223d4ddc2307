use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the answering backend.
///
/// Every variant counts as "backend unreachable": the session answers from
/// the offline table and flips connectivity to offline.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Connection refused, DNS failure, timeout, or a broken body stream
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with a non-2xx status
    #[error("server error: {0}")]
    Status(StatusCode),
    /// The body was not valid JSON
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine config directory")]
    NoConfigDir,
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Invalid(String),
}
