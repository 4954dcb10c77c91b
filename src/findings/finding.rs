use serde::{Deserialize, Serialize};

use crate::probe::compare::ComparisonResult;
use crate::probe::payloads::PayloadCategory;

/// One scan-level conclusion for a finding category.
///
/// Every scan produces one `Finding` per category. `suspected` is true
/// exactly when `evidence` is non-empty; use [`Finding::from_evidence`] so
/// the two can never disagree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    /// Human-readable category name.
    pub title: String,
    pub suspected: bool,
    pub severity: Severity,
    /// One-line description of the outcome.
    pub message: String,
    /// Observations backing the finding.
    pub evidence: Vec<Evidence>,
    /// Suggested remediation.
    pub remediation: Option<String>,
    /// CWE identifier (if applicable).
    pub cwe_id: Option<String>,
}

impl Finding {
    pub fn from_evidence(category: FindingCategory, evidence: Vec<Evidence>) -> Self {
        let suspected = !evidence.is_empty();
        let message = if suspected {
            format!("{} suspected ({} observation(s))", category, evidence.len())
        } else {
            format!("No indication of {}", category.to_string().to_lowercase())
        };
        Self {
            category,
            title: category.to_string(),
            suspected,
            severity: category.severity(),
            message,
            evidence,
            remediation: Some(category.remediation().into()),
            cwe_id: category.cwe_id().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" => Some(Self::Info),
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    SqlInjection,
    Xss,
    MissingCriticalHeaders,
    OutdatedComponent,
    TlsIssue,
}

impl FindingCategory {
    /// Stable identifier, matching the serialized form.
    pub fn id(self) -> &'static str {
        match self {
            Self::SqlInjection => "sql_injection",
            Self::Xss => "xss",
            Self::MissingCriticalHeaders => "missing_critical_headers",
            Self::OutdatedComponent => "outdated_component",
            Self::TlsIssue => "tls_issue",
        }
    }

    pub fn severity(self) -> Severity {
        match self {
            Self::SqlInjection | Self::Xss => Severity::High,
            Self::OutdatedComponent | Self::TlsIssue => Severity::Medium,
            Self::MissingCriticalHeaders => Severity::Low,
        }
    }

    pub fn cwe_id(self) -> Option<&'static str> {
        match self {
            Self::SqlInjection => Some("CWE-89"),
            Self::Xss => Some("CWE-79"),
            Self::MissingCriticalHeaders => Some("CWE-693"),
            Self::OutdatedComponent => Some("CWE-1104"),
            Self::TlsIssue => Some("CWE-295"),
        }
    }

    pub fn remediation(self) -> &'static str {
        match self {
            Self::SqlInjection => {
                "Use parameterized queries or prepared statements; never concatenate \
                 request parameters into SQL."
            }
            Self::Xss => {
                "HTML-encode untrusted input on output and deploy a restrictive \
                 Content-Security-Policy."
            }
            Self::MissingCriticalHeaders => {
                "Send Content-Security-Policy, Strict-Transport-Security and \
                 X-Frame-Options on every response."
            }
            Self::OutdatedComponent => {
                "Upgrade the identified server software and stop advertising exact \
                 versions in response headers."
            }
            Self::TlsIssue => "Serve the site over HTTPS with a valid, trusted certificate.",
        }
    }
}

impl std::fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SqlInjection => write!(f, "SQL Injection"),
            Self::Xss => write!(f, "Cross-Site Scripting"),
            Self::MissingCriticalHeaders => write!(f, "Missing Critical Headers"),
            Self::OutdatedComponent => write!(f, "Outdated Component"),
            Self::TlsIssue => write!(f, "TLS Issue"),
        }
    }
}

/// Evidence supporting a finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    SqlProbe {
        parameter: String,
        category: PayloadCategory,
        payload: String,
        comparison: ComparisonResult,
    },
    XssProbe {
        parameter: String,
        category: PayloadCategory,
        payload: String,
        direct_reflected: bool,
        partial_reflected: bool,
    },
    MissingHeader {
        name: String,
    },
    OutdatedBanner {
        banner: String,
    },
    TlsIssue {
        issue: String,
    },
}

impl Evidence {
    pub fn describe(&self) -> String {
        match self {
            Self::SqlProbe {
                parameter,
                payload,
                comparison,
                ..
            } => {
                let mut reasons = Vec::new();
                if let Some(sig) = &comparison.matched_signature {
                    reasons.push(format!("database error '{sig}'"));
                }
                if comparison.significant_length_change {
                    reasons.push(format!("length changed by {}", comparison.length_diff));
                }
                if comparison.response_differs_significantly {
                    if let Some(sim) = comparison.textual_similarity {
                        reasons.push(format!("similarity {sim:.2}"));
                    }
                }
                format!("'{parameter}' = {payload:?}: {}", reasons.join(", "))
            }
            Self::XssProbe {
                parameter,
                payload,
                direct_reflected,
                ..
            } => {
                let how = if *direct_reflected {
                    "reflected verbatim"
                } else {
                    "partially reflected"
                };
                format!("'{parameter}' = {payload:?}: {how}")
            }
            Self::MissingHeader { name } => format!("missing header {name}"),
            Self::OutdatedBanner { banner } => format!("outdated banner {banner:?}"),
            Self::TlsIssue { issue } => issue.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_evidence_means_not_suspected() {
        let finding = Finding::from_evidence(FindingCategory::Xss, vec![]);
        assert!(!finding.suspected);
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.cwe_id.as_deref(), Some("CWE-79"));
    }

    #[test]
    fn evidence_makes_finding_suspected() {
        let finding = Finding::from_evidence(
            FindingCategory::MissingCriticalHeaders,
            vec![Evidence::MissingHeader {
                name: "X-Frame-Options".into(),
            }],
        );
        assert!(finding.suspected);
        assert!(finding.message.contains("1 observation"));
    }

    #[test]
    fn category_ids_match_serde() {
        for category in [
            FindingCategory::SqlInjection,
            FindingCategory::Xss,
            FindingCategory::MissingCriticalHeaders,
            FindingCategory::OutdatedComponent,
            FindingCategory::TlsIssue,
        ] {
            let json = serde_json::to_value(category).unwrap();
            assert_eq!(json, category.id());
        }
    }

    #[test]
    fn evidence_is_tagged_by_kind() {
        let json = serde_json::to_value(Evidence::TlsIssue {
            issue: "Not using HTTPS".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "tls_issue");
        assert_eq!(json["issue"], "Not using HTTPS");
    }
}
