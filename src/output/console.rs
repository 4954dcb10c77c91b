use crate::findings::Severity;
use crate::report::ScanReport;

/// Errors listed before the summary is cut short with a count.
const MAX_LISTED_ERRORS: usize = 3;

/// Short plain-text summary of a report, one statement per line.
pub fn summary(report: &ScanReport) -> String {
    let mut lines = Vec::new();

    if !report.errors.is_empty() {
        lines.push(format!(
            "Scan encountered {} error(s):",
            report.errors.len()
        ));
        for error in report.errors.iter().take(MAX_LISTED_ERRORS) {
            lines.push(format!("- {error}"));
        }
        if report.errors.len() > MAX_LISTED_ERRORS {
            lines.push(format!(
                "- And {} more error(s)...",
                report.errors.len() - MAX_LISTED_ERRORS
            ));
        }
        // Nothing was fetched, so the remaining sections would be empty.
        if report.target.is_none() || report.headers.is_empty() {
            return lines.join("\n");
        }
    }

    if report.technologies.is_empty() {
        lines.push("No specific server technologies were identified.".to_string());
    } else {
        lines.push(format!(
            "Detected technologies: {}",
            report.technologies.join(", ")
        ));
    }
    if !report.outdated.is_empty() {
        lines.push(format!(
            "Potentially outdated software: {}",
            report.outdated.join(", ")
        ));
    }

    let tests = &report.vuln_tests;
    if tests.sql_injection_suspected {
        lines.push("WARNING: SQL Injection vulnerability potentially detected!".to_string());
    }
    if tests.xss_suspected {
        lines.push(
            "WARNING: Cross-Site Scripting (XSS) vulnerability potentially detected!".to_string(),
        );
    }
    if !report.missing_security_headers.is_empty() {
        lines.push(format!(
            "Missing security headers: {}",
            report.missing_security_headers.join(", ")
        ));
    }
    if report.outdated.is_empty() && !tests.sql_injection_suspected && !tests.xss_suspected {
        lines.push("No obvious security issues detected in this basic scan.".to_string());
    }

    lines.join("\n")
}

/// Render the report for a terminal: target, summary, TLS state, suspected
/// findings and the policy verdict.
pub fn render(report: &ScanReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n  Target: {}\n\n", report.url));
    for line in summary(report).lines() {
        output.push_str(&format!("  {line}\n"));
    }
    output.push('\n');

    if report.ssl_info.valid {
        output.push_str("  TLS: certificate accepted\n");
    } else {
        for issue in &report.ssl_info.issues {
            output.push_str(&format!("  TLS: {issue}\n"));
        }
    }
    output.push('\n');

    let mut suspected: Vec<_> = report.suspected_findings().collect();
    suspected.sort_by(|a, b| b.severity.cmp(&a.severity));

    if suspected.is_empty() {
        output.push_str("  No suspected vulnerabilities.\n\n");
    } else {
        output.push_str(&format!(
            "  {} suspected finding(s):\n\n",
            suspected.len()
        ));
        for finding in &suspected {
            let severity_tag = match finding.severity {
                Severity::Critical => "[CRITICAL]",
                Severity::High => "[HIGH]    ",
                Severity::Medium => "[MEDIUM]  ",
                Severity::Low => "[LOW]     ",
                Severity::Info => "[INFO]    ",
            };
            output.push_str(&format!(
                "  {} {} {}\n",
                severity_tag,
                finding.category.id(),
                finding.message
            ));
            for evidence in finding.evidence.iter().take(5) {
                output.push_str(&format!("           - {}\n", evidence.describe()));
            }
            if finding.evidence.len() > 5 {
                output.push_str(&format!(
                    "           - ... {} more\n",
                    finding.evidence.len() - 5
                ));
            }
            if let Some(remediation) = &finding.remediation {
                output.push_str(&format!("           fix: {}\n", remediation));
            }
            output.push('\n');
        }
    }

    // Verdict
    let verdict = &report.verdict;
    let status = if verdict.pass { "PASS" } else { "FAIL" };
    output.push_str(&format!(
        "  Result: {} (threshold: {}, highest: {})\n\n",
        status,
        verdict.fail_threshold,
        verdict
            .highest_severity
            .map(|s| s.to_string())
            .unwrap_or_else(|| "none".into()),
    ));

    output
}
