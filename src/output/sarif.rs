use crate::error::Result;
use crate::findings::Severity;
use crate::report::ScanReport;

use serde_json::{json, Value};

/// Render suspected findings as SARIF 2.1.0.
///
/// Each suspected finding becomes one result located at the scanned URL;
/// its evidence is carried in the result's property bag.
pub fn render(report: &ScanReport) -> Result<String> {
    let suspected: Vec<_> = report.suspected_findings().collect();

    let rules: Vec<Value> = suspected
        .iter()
        .map(|finding| {
            let mut rule = json!({
                "id": finding.category.id(),
                "name": finding.title,
                "shortDescription": { "text": finding.title },
                "defaultConfiguration": {
                    "level": severity_to_sarif_level(finding.severity),
                },
            });
            if let Some(cwe) = &finding.cwe_id {
                rule["properties"] = json!({
                    "tags": [cwe],
                });
            }
            rule
        })
        .collect();

    let results: Vec<Value> = suspected
        .iter()
        .map(|f| {
            let evidence: Vec<String> = f.evidence.iter().map(|e| e.describe()).collect();
            let mut result = json!({
                "ruleId": f.category.id(),
                "level": severity_to_sarif_level(f.severity),
                "message": { "text": f.message },
                "locations": [{
                    "physicalLocation": {
                        "artifactLocation": {
                            "uri": report.url,
                        },
                    },
                }],
                "properties": {
                    "evidence": evidence,
                },
            });

            if let Some(remediation) = &f.remediation {
                result["fixes"] = json!([{
                    "description": { "text": remediation },
                }]);
            }

            result
        })
        .collect();

    let sarif = json!({
        "$schema": "https://docs.oasis-open.org/sarif/sarif/v2.1.0/errata01/os/schemas/sarif-schema-2.1.0.json",
        "version": "2.1.0",
        "runs": [{
            "tool": {
                "driver": {
                    "name": "hawkscan",
                    "version": env!("CARGO_PKG_VERSION"),
                    "semanticVersion": env!("CARGO_PKG_VERSION"),
                    "rules": rules,
                },
            },
            "results": results,
            "automationDetails": {
                "id": format!("hawkscan/{}", report.scan_id),
            },
        }],
    });

    let output = serde_json::to_string_pretty(&sarif)?;
    Ok(output)
}

fn severity_to_sarif_level(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "error",
        Severity::Medium => "warning",
        Severity::Low | Severity::Info => "note",
    }
}
