use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScanError};
use crate::findings::policy::Policy;
use crate::inspect::fingerprint::VersionRule;

/// Top-level configuration from `.hawkscan.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpSettings,
    #[serde(default)]
    pub thresholds: Thresholds,
    #[serde(default)]
    pub probe: ProbeSettings,
    #[serde(default)]
    pub policy: Policy,
    /// Outdated-version threshold table.
    #[serde(default = "VersionRule::defaults")]
    pub versions: Vec<VersionRule>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpSettings::default(),
            thresholds: Thresholds::default(),
            probe: ProbeSettings::default(),
            policy: Policy::default(),
            versions: VersionRule::defaults(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Timeout for the baseline and every probe request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout for the TLS certificate check.
    #[serde(default = "default_tls_timeout_secs")]
    pub tls_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Response bodies are truncated to this many bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,
}

fn default_timeout_secs() -> u64 {
    8
}

fn default_tls_timeout_secs() -> u64 {
    5
}

fn default_max_redirects() -> usize {
    10
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36"
        .into()
}

fn default_max_body_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            tls_timeout_secs: default_tls_timeout_secs(),
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl HttpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tls_timeout(&self) -> Duration {
        Duration::from_secs(self.tls_timeout_secs)
    }
}

/// Heuristic cut-offs used by the response comparator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Relative body-length change that counts as significant.
    #[serde(default = "default_length_change_ratio")]
    pub length_change_ratio: f64,
    /// Jaccard similarity below which a probe response "differs".
    #[serde(default = "default_similarity")]
    pub similarity: f64,
}

fn default_length_change_ratio() -> f64 {
    0.10
}

fn default_similarity() -> f64 {
    0.70
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            length_change_ratio: default_length_change_ratio(),
            similarity: default_similarity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Parameters probed when the target URL has no query string.
    #[serde(default = "default_parameters")]
    pub default_parameters: Vec<String>,
}

fn default_parameters() -> Vec<String> {
    ["id", "title", "search", "q", "name"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            default_parameters: default_parameters(),
        }
    }
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let unit = 0.0..=1.0;
        if !unit.contains(&self.thresholds.length_change_ratio) {
            return Err(ScanError::Config(format!(
                "thresholds.length_change_ratio must be within [0, 1], got {}",
                self.thresholds.length_change_ratio
            )));
        }
        if !unit.contains(&self.thresholds.similarity) {
            return Err(ScanError::Config(format!(
                "thresholds.similarity must be within [0, 1], got {}",
                self.thresholds.similarity
            )));
        }
        if self.http.timeout_secs == 0 || self.http.tls_timeout_secs == 0 {
            return Err(ScanError::Config("timeouts must be at least 1 second".into()));
        }
        if self.http.max_body_bytes == 0 {
            return Err(ScanError::Config("http.max_body_bytes must be positive".into()));
        }
        if self.probe.default_parameters.is_empty() {
            return Err(ScanError::Config(
                "probe.default_parameters must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# hawkscan configuration

[http]
# Timeout in seconds for the baseline and each probe request.
timeout_secs = 8
# Connect timeout in seconds for the TLS certificate check.
tls_timeout_secs = 5
max_redirects = 10
# Response bodies beyond this many bytes are discarded.
max_body_bytes = 10485760

[thresholds]
# Relative body-length change that marks a SQLi probe as suspicious.
length_change_ratio = 0.10
# Token similarity below which a probe response is considered different.
similarity = 0.70

[probe]
# Parameters probed when the URL has no query string.
default_parameters = ["id", "title", "search", "q", "name"]

[policy]
# Minimum severity to fail the scan (info, low, medium, high, critical).
fail_on = "high"

# Finding categories to ignore entirely.
# ignore = ["missing_critical_headers"]

# Outdated-version thresholds. A banner is outdated when its version is in
# `series` (if given) and below `minimum`.
[[versions]]
product = "Apache"
series = "2.4"
minimum = "2.4.50"

[[versions]]
product = "nginx"
series = "1"
minimum = "1.18.0"

[[versions]]
product = "PHP"
minimum = "7.4.0"
"#
    }
}
