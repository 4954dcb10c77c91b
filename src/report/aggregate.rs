//! Incremental report assembly.
//!
//! `ScanAccumulator` is owned by the orchestrator and handed by `&mut` to
//! each stage. Stages only append; `finish` turns the collected evidence
//! into findings without making any further judgment.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use crate::error::ScanError;
use crate::findings::policy::Policy;
use crate::findings::{Evidence, Finding, FindingCategory};
use crate::inspect::{Banner, HeaderAudit};
use crate::target::Target;

use super::{ScanReport, SqlProbeRecord, SslInfo, VulnTests, XssProbeRecord};

pub struct ScanAccumulator {
    url: String,
    target: Option<Target>,
    headers: BTreeMap<String, String>,
    banners: Vec<Banner>,
    audit: Option<HeaderAudit>,
    ssl_info: SslInfo,
    parameters: Vec<String>,
    sql: Vec<SqlProbeRecord>,
    xss: Vec<XssProbeRecord>,
    errors: Vec<String>,
}

impl ScanAccumulator {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            target: None,
            headers: BTreeMap::new(),
            banners: Vec::new(),
            audit: None,
            ssl_info: SslInfo::default(),
            parameters: Vec::new(),
            sql: Vec::new(),
            xss: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn set_target(&mut self, target: Target) {
        self.target = Some(target);
    }

    pub fn record_error(&mut self, error: ScanError) {
        warn!(kind = ?error.kind(), error = %error, "recorded scan error");
        self.errors.push(error.to_string());
    }

    pub fn record_ssl(&mut self, info: SslInfo) {
        self.ssl_info = info;
    }

    pub fn record_headers(&mut self, headers: BTreeMap<String, String>) {
        self.headers = headers;
    }

    pub fn record_header_audit(&mut self, audit: HeaderAudit) {
        self.audit = Some(audit);
    }

    pub fn record_banners(&mut self, banners: Vec<Banner>) {
        self.banners.extend(banners);
    }

    pub fn record_parameters(&mut self, parameters: &[String]) {
        self.parameters = parameters.to_vec();
    }

    pub fn record_sql(&mut self, record: SqlProbeRecord) {
        self.sql.push(record);
    }

    pub fn record_xss(&mut self, record: XssProbeRecord) {
        self.xss.push(record);
    }

    /// Fold the collected evidence into the final report.
    pub fn finish(self, policy: &Policy) -> ScanReport {
        let audit = self.audit.unwrap_or_default();

        let sql_evidence: Vec<Evidence> = self
            .sql
            .iter()
            .filter(|r| r.suspected)
            .map(|r| Evidence::SqlProbe {
                parameter: r.parameter.clone(),
                category: r.category,
                payload: r.payload.clone(),
                comparison: r.comparison.clone(),
            })
            .collect();
        let xss_evidence: Vec<Evidence> = self
            .xss
            .iter()
            .filter(|r| r.suspected)
            .map(|r| Evidence::XssProbe {
                parameter: r.parameter.clone(),
                category: r.category,
                payload: r.payload.clone(),
                direct_reflected: r.direct_reflected,
                partial_reflected: r.partial_reflected,
            })
            .collect();
        let header_evidence: Vec<Evidence> = audit
            .missing_critical
            .iter()
            .map(|name| Evidence::MissingHeader { name: name.clone() })
            .collect();
        let outdated: Vec<String> = self
            .banners
            .iter()
            .filter(|b| b.outdated)
            .map(|b| b.value.clone())
            .collect();
        let outdated_evidence: Vec<Evidence> = outdated
            .iter()
            .map(|banner| Evidence::OutdatedBanner {
                banner: banner.clone(),
            })
            .collect();
        let tls_evidence: Vec<Evidence> = self
            .ssl_info
            .issues
            .iter()
            .map(|issue| Evidence::TlsIssue {
                issue: issue.clone(),
            })
            .collect();

        let findings = vec![
            Finding::from_evidence(FindingCategory::SqlInjection, sql_evidence),
            Finding::from_evidence(FindingCategory::Xss, xss_evidence),
            Finding::from_evidence(FindingCategory::MissingCriticalHeaders, header_evidence),
            Finding::from_evidence(FindingCategory::OutdatedComponent, outdated_evidence),
            Finding::from_evidence(FindingCategory::TlsIssue, tls_evidence),
        ];
        let suspected = |category: FindingCategory| {
            findings
                .iter()
                .any(|f| f.category == category && f.suspected)
        };

        let vuln_tests = VulnTests {
            parameters: self.parameters,
            sql_injection_suspected: suspected(FindingCategory::SqlInjection),
            sql_injection: self.sql,
            xss_suspected: suspected(FindingCategory::Xss),
            xss: self.xss,
            missing_critical_headers_suspected: suspected(FindingCategory::MissingCriticalHeaders),
            missing_critical_headers: audit.missing_critical,
        };
        let verdict = policy.evaluate(&findings);

        ScanReport {
            scan_id: Uuid::new_v4(),
            url: self.url,
            target: self.target,
            scanned_at: Utc::now(),
            headers: self.headers,
            technologies: self.banners.iter().map(|b| b.value.clone()).collect(),
            outdated,
            security_headers: audit.present,
            missing_security_headers: audit.missing,
            ssl_info: self.ssl_info,
            vuln_tests,
            findings,
            verdict,
            errors: self.errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::inspect::headers;
    use crate::probe::compare::ComparisonResult;
    use crate::probe::payloads::PayloadCategory;
    use crate::probe::InjectionMode;

    fn comparison(suspected: bool) -> ComparisonResult {
        ComparisonResult {
            length_diff: if suspected { 500 } else { 0 },
            significant_length_change: suspected,
            textual_similarity: Some(1.0),
            response_differs_significantly: false,
            error_signature_matched: false,
            matched_signature: None,
            body_changed: suspected,
        }
    }

    fn sql_record(suspected: bool) -> SqlProbeRecord {
        SqlProbeRecord {
            parameter: "id".into(),
            category: PayloadCategory::SqlTrue,
            payload: "' OR '1'='1".into(),
            mode: InjectionMode::Replace,
            status: 200,
            length: 100,
            latency_ms: 5,
            comparison: comparison(suspected),
            suspected,
        }
    }

    #[test]
    fn empty_accumulator_has_no_suspicions() {
        let report = ScanAccumulator::new("https://example.com").finish(&Policy::default());
        assert_eq!(report.findings.len(), 5);
        assert!(report.findings.iter().all(|f| !f.suspected));
        assert!(!report.vuln_tests.sql_injection_suspected);
        assert!(!report.vuln_tests.missing_critical_headers_suspected);
        assert!(report.verdict.pass);
    }

    #[test]
    fn suspected_flag_follows_evidence() {
        let mut acc = ScanAccumulator::new("https://example.com/?id=1");
        acc.record_sql(sql_record(false));
        acc.record_sql(sql_record(true));
        let report = acc.finish(&Policy::default());

        assert!(report.vuln_tests.sql_injection_suspected);
        assert_eq!(report.vuln_tests.sql_injection.len(), 2);
        let finding = report.finding(FindingCategory::SqlInjection).unwrap();
        assert_eq!(finding.evidence.len(), 1);
        assert!(!report.verdict.pass);
    }

    #[test]
    fn errors_are_appended_in_order() {
        let mut acc = ScanAccumulator::new("https://example.com");
        acc.record_error(ScanError::Baseline(NetworkError::Connect("refused".into())));
        acc.record_error(ScanError::Input("second".into()));
        let report = acc.finish(&Policy::default());
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("Baseline request failed"));
        assert_eq!(report.errors[1], "Invalid input: second");
    }

    #[test]
    fn header_audit_feeds_report_sections() {
        let mut acc = ScanAccumulator::new("https://example.com");
        acc.record_header_audit(headers::audit(&BTreeMap::new()));
        let report = acc.finish(&Policy::default());
        assert_eq!(report.missing_security_headers.len(), 6);
        assert_eq!(report.vuln_tests.missing_critical_headers.len(), 3);
        assert!(report.vuln_tests.missing_critical_headers_suspected);
    }

    #[test]
    fn outdated_banners_are_listed_separately() {
        let mut acc = ScanAccumulator::new("https://example.com");
        acc.record_banners(vec![
            Banner {
                header: "Server".into(),
                value: "nginx/1.16.0".into(),
                product: Some("nginx".into()),
                version: Some("1.16.0".into()),
                outdated: true,
            },
            Banner {
                header: "X-Powered-By".into(),
                value: "Express".into(),
                product: None,
                version: None,
                outdated: false,
            },
        ]);
        let report = acc.finish(&Policy::default());
        assert_eq!(report.technologies, vec!["nginx/1.16.0", "Express"]);
        assert_eq!(report.outdated, vec!["nginx/1.16.0"]);
        assert!(report.finding(FindingCategory::OutdatedComponent).unwrap().suspected);
    }
}
