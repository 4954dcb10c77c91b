pub mod aggregate;

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::findings::policy::PolicyVerdict;
use crate::findings::Finding;
use crate::probe::compare::ComparisonResult;
use crate::probe::payloads::PayloadCategory;
use crate::probe::InjectionMode;
use crate::target::Target;
use crate::transport::CertificateInfo;

/// Complete scan report. Always produced, even when the scan degrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub scan_id: Uuid,
    /// Input URL as given.
    pub url: String,
    /// `None` when the input could not be parsed.
    pub target: Option<Target>,
    pub scanned_at: DateTime<Utc>,
    /// Baseline response headers. Names are lower-cased as delivered by the
    /// HTTP stack, so the server's own casing is not preserved; use
    /// `security_headers` for canonical names.
    pub headers: BTreeMap<String, String>,
    pub technologies: Vec<String>,
    pub outdated: Vec<String>,
    pub security_headers: BTreeMap<String, String>,
    pub missing_security_headers: Vec<String>,
    pub ssl_info: SslInfo,
    pub vuln_tests: VulnTests,
    pub findings: Vec<Finding>,
    pub verdict: PolicyVerdict,
    pub errors: Vec<String>,
}

impl ScanReport {
    pub fn finding(&self, category: crate::findings::FindingCategory) -> Option<&Finding> {
        self.findings.iter().find(|f| f.category == category)
    }

    pub fn suspected_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.suspected)
    }
}

/// TLS posture of the target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslInfo {
    pub valid: bool,
    pub issues: Vec<String>,
    /// Leaf certificate fields; `null` when no handshake completed.
    pub certificate: Option<CertificateInfo>,
}

/// Results of the active probes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VulnTests {
    /// Parameters probed, in order.
    pub parameters: Vec<String>,
    pub sql_injection: Vec<SqlProbeRecord>,
    pub sql_injection_suspected: bool,
    pub xss: Vec<XssProbeRecord>,
    pub xss_suspected: bool,
    pub missing_critical_headers: Vec<String>,
    pub missing_critical_headers_suspected: bool,
}

/// One SQLi probe and how its response compared to the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlProbeRecord {
    pub parameter: String,
    pub category: PayloadCategory,
    pub payload: String,
    pub mode: InjectionMode,
    pub status: u16,
    pub length: usize,
    pub latency_ms: u128,
    pub comparison: ComparisonResult,
    pub suspected: bool,
}

/// One XSS probe and whether its payload came back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XssProbeRecord {
    pub parameter: String,
    pub category: PayloadCategory,
    pub payload: String,
    pub status: u16,
    pub direct_reflected: bool,
    pub partial_reflected: bool,
    pub suspected: bool,
}
