use thiserror::Error;

use crate::probe::payloads::PayloadCategory;

pub type Result<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid input: {0}")]
    Input(String),

    #[error("Baseline request failed: {0}")]
    Baseline(NetworkError),

    #[error("Error testing {test} on parameter '{parameter}' with payload '{category}': {source}")]
    Probe {
        test: ProbeKind,
        parameter: String,
        category: PayloadCategory,
        source: NetworkError,
    },

    #[error("{0}")]
    Tls(#[from] TlsFailure),

    #[error("Scan cancelled: {skipped} probe(s) not attempted")]
    Cancelled { skipped: usize },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Coarse classification used to decide fatal-vs-isolated handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Network,
    Tls,
    Probe,
    Other,
}

impl ScanError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Input(_) => ErrorKind::Input,
            Self::Baseline(_) => ErrorKind::Network,
            Self::Tls(_) => ErrorKind::Tls,
            Self::Probe { .. } | Self::Cancelled { .. } => ErrorKind::Probe,
            _ => ErrorKind::Other,
        }
    }

    pub fn exit_code(&self) -> i32 {
        2
    }
}

/// Which sub-probe a failed request belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    SqlInjection,
    Xss,
}

impl std::fmt::Display for ProbeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SqlInjection => write!(f, "SQL injection"),
            Self::Xss => write!(f, "XSS"),
        }
    }
}

/// Transport failure of a single HTTP request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Too many redirects: {0}")]
    TooManyRedirects(String),

    #[error("Error reading response body: {0}")]
    Body(String),

    #[error("Request error: {0}")]
    Request(String),

    #[error("Request not sent: scan cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            Self::Timeout(message)
        } else if err.is_redirect() {
            Self::TooManyRedirects(message)
        } else if err.is_connect() {
            Self::Connect(message)
        } else if err.is_body() || err.is_decode() {
            Self::Body(message)
        } else {
            Self::Request(message)
        }
    }
}

/// Failure of the TLS certificate check. The display form is the issue
/// string recorded in `ssl_info.issues`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TlsFailure {
    #[error("SSL Error: {0}")]
    Handshake(String),

    #[error("Connection error: {0}")]
    Connect(String),

    #[error("Connection error: timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Error: {0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn tls_failures_render_categorized_prefixes() {
        assert!(TlsFailure::Handshake("bad cert".into())
            .to_string()
            .starts_with("SSL Error: "));
        assert!(TlsFailure::Connect("refused".into())
            .to_string()
            .starts_with("Connection error: "));
        assert!(TlsFailure::Timeout(Duration::from_secs(5))
            .to_string()
            .starts_with("Connection error: "));
    }

    #[test]
    fn probe_error_names_parameter_and_payload() {
        let err = ScanError::Probe {
            test: ProbeKind::SqlInjection,
            parameter: "id".into(),
            category: PayloadCategory::SqlTime,
            source: NetworkError::Timeout("operation timed out".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("'id'"));
        assert!(msg.contains("sql_time"));
        assert!(msg.contains("Timeout error"));
        assert_eq!(err.kind(), ErrorKind::Probe);
    }

    #[test]
    fn baseline_failure_is_a_network_error() {
        let err = ScanError::Baseline(NetworkError::Connect("refused".into()));
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
