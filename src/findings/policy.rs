use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{Finding, FindingCategory, Severity};

/// Policy verdict: the final pass/fail decision over suspected findings
/// after removing ignored categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyVerdict {
    pub pass: bool,
    pub suspected_findings: usize,
    pub effective_findings: usize,
    pub highest_severity: Option<Severity>,
    pub fail_threshold: Severity,
}

/// Policy configuration loaded from `.hawkscan.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    /// Minimum severity to fail the scan.
    #[serde(default = "default_fail_on")]
    pub fail_on: Severity,
    /// Finding categories to ignore entirely.
    #[serde(default)]
    pub ignore: HashSet<FindingCategory>,
}

fn default_fail_on() -> Severity {
    Severity::High
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            fail_on: default_fail_on(),
            ignore: HashSet::new(),
        }
    }
}

impl Policy {
    /// Evaluate findings against this policy and produce a verdict.
    pub fn evaluate(&self, findings: &[Finding]) -> PolicyVerdict {
        let suspected: Vec<&Finding> = findings.iter().filter(|f| f.suspected).collect();
        let effective: Vec<Severity> = suspected
            .iter()
            .filter(|f| !self.ignore.contains(&f.category))
            .map(|f| f.severity)
            .collect();

        let highest = effective.iter().copied().max();
        let failed = effective.iter().any(|&sev| sev >= self.fail_on);

        PolicyVerdict {
            pass: !failed,
            suspected_findings: suspected.len(),
            effective_findings: effective.len(),
            highest_severity: highest,
            fail_threshold: self.fail_on,
        }
    }
}
