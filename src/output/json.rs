use crate::error::Result;
use crate::report::ScanReport;

use serde::Serialize;

#[derive(Serialize)]
struct JsonReport<'a> {
    url: &'a str,
    raw_results: &'a ScanReport,
    summary: String,
}

/// Render the full report as JSON, alongside the plain-text summary.
pub fn render(report: &ScanReport) -> Result<String> {
    let wrapped = JsonReport {
        url: &report.url,
        raw_results: report,
        summary: super::console::summary(report),
    };
    let json = serde_json::to_string_pretty(&wrapped)?;
    Ok(json)
}
