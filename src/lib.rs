//! hawkscan: lightweight, unauthenticated web-vulnerability prober.
//!
//! Grabs server banners, audits TLS and security headers, and probes query
//! parameters for reflected XSS and SQL-injection indicators. Every scan
//! yields one structured [`ScanReport`]; network trouble degrades the report
//! instead of failing it.
//!
//! # Quick Start
//!
//! ```no_run
//! use hawkscan::{scan, ScanOptions};
//!
//! let options = ScanOptions::default();
//! let report = scan("https://example.com/?id=1", &options).unwrap();
//! println!(
//!     "SQLi suspected: {}, XSS suspected: {}",
//!     report.vuln_tests.sql_injection_suspected, report.vuln_tests.xss_suspected
//! );
//! ```

pub mod cancel;
pub mod config;
pub mod error;
pub mod findings;
pub mod inspect;
pub mod output;
pub mod probe;
pub mod report;
pub mod scanner;
pub mod target;
pub mod transport;

use std::path::PathBuf;
use std::time::Duration;

use cancel::CancelToken;
use config::Config;
use error::Result;
use output::OutputFormat;

pub use report::ScanReport;
pub use scanner::Scanner;

/// Options for a scan invocation.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Path to config file (defaults to `.hawkscan.toml` in the working dir).
    pub config_path: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
    /// CLI override for fail_on threshold.
    pub fail_on_override: Option<findings::Severity>,
    /// Overall time budget for the scan.
    pub deadline: Option<Duration>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            config_path: None,
            format: OutputFormat::Console,
            fail_on_override: None,
            deadline: None,
        }
    }
}

/// Load configuration and run a complete scan against `url`.
///
/// Only configuration and client-construction problems are returned as
/// errors; everything that happens during the scan lands in the report.
pub fn scan(url: &str, options: &ScanOptions) -> Result<ScanReport> {
    let config_path = options
        .config_path
        .clone()
        .unwrap_or_else(|| PathBuf::from(".hawkscan.toml"));
    let mut config = Config::load(&config_path)?;

    // Apply CLI override
    if let Some(fail_on) = options.fail_on_override {
        config.policy.fail_on = fail_on;
    }

    let mut scanner = Scanner::new(config)?;
    if let Some(budget) = options.deadline {
        scanner = scanner.with_cancel_token(CancelToken::with_deadline(budget));
    }
    Ok(scanner.run(url))
}

/// Render a scan report in the specified format.
pub fn render_report(report: &ScanReport, format: OutputFormat) -> Result<String> {
    output::render(report, format)
}
