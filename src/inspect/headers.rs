use std::collections::BTreeMap;

/// The audited security headers, in report order.
pub const SECURITY_HEADERS: [&str; 6] = [
    "Content-Security-Policy",
    "Strict-Transport-Security",
    "X-Content-Type-Options",
    "X-Frame-Options",
    "X-XSS-Protection",
    "Referrer-Policy",
];

/// Headers whose absence raises the `missing_critical_headers` finding.
pub const CRITICAL_HEADERS: [&str; 3] = [
    "Content-Security-Policy",
    "Strict-Transport-Security",
    "X-Frame-Options",
];

/// Outcome of the security-header audit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderAudit {
    /// Present headers keyed by canonical name.
    pub present: BTreeMap<String, String>,
    pub missing: Vec<String>,
    /// Subset of `missing` that is critical.
    pub missing_critical: Vec<String>,
}

/// Check the baseline response headers for the six security headers.
/// Header names are compared case-insensitively.
pub fn audit(headers: &BTreeMap<String, String>) -> HeaderAudit {
    let mut result = HeaderAudit::default();
    for name in SECURITY_HEADERS {
        let value = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone());
        match value {
            Some(v) => {
                result.present.insert(name.to_string(), v);
            }
            None => {
                result.missing.push(name.to_string());
                if CRITICAL_HEADERS.contains(&name) {
                    result.missing_critical.push(name.to_string());
                }
            }
        }
    }
    result
}
