//! Target resolution: turns the raw input URL into an immutable `Target`.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ScanError};

/// Drop trailing slashes from a bare URL. URLs carrying a query are left
/// untouched so parameter values keep their exact form.
pub fn strip_trailing_slashes(raw: &str) -> &str {
    let trimmed = raw.trim_end_matches('/');
    if raw.contains('?') || trimmed.ends_with(':') {
        raw
    } else {
        trimmed
    }
}

/// URL scheme accepted as a scan target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn is_secure(self) -> bool {
        matches!(self, Self::Https)
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Http => 80,
            Self::Https => 443,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Https => write!(f, "https"),
        }
    }
}

/// A parsed scan target. Created once from input and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub scheme: Scheme,
    pub host: String,
    pub port: u16,
    pub path: String,
    /// Query parameters in order of appearance; duplicate names keep the
    /// first occurrence.
    pub params: Vec<(String, String)>,
}

impl Target {
    /// Parse a raw URL. Only `http://` and `https://` are accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        let scheme = if lower.starts_with("https://") {
            Scheme::Https
        } else if lower.starts_with("http://") {
            Scheme::Http
        } else {
            return Err(ScanError::Input(format!(
                "unsupported URL '{trimmed}': must start with http:// or https://"
            )));
        };

        let url = Url::parse(trimmed)
            .map_err(|e| ScanError::Input(format!("malformed URL '{trimmed}': {e}")))?;
        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ScanError::Input(format!("URL '{trimmed}' has no host")))?
            .to_string();
        let port = url.port().unwrap_or_else(|| scheme.default_port());

        let mut params: Vec<(String, String)> = Vec::new();
        for (name, value) in url.query_pairs() {
            if !params.iter().any(|(existing, _)| existing.as_str() == name) {
                params.push((name.into_owned(), value.into_owned()));
            }
        }

        Ok(Self {
            scheme,
            host,
            port,
            path: url.path().to_string(),
            params,
        })
    }

    /// Current value of a query parameter, if present.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Names of the query parameters, in discovery order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(n, _)| n.as_str())
    }

    /// The target URL without its query string.
    pub fn base_url(&self) -> Result<Url> {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        let raw = if self.port == self.scheme.default_port() {
            format!("{}://{}{}", self.scheme, host, self.path)
        } else {
            format!("{}://{}:{}{}", self.scheme, host, self.port, self.path)
        };
        Url::parse(&raw).map_err(|e| ScanError::Input(format!("cannot rebuild URL: {e}")))
    }
}
