//! Banner grabbing from `Server` / `X-Powered-By` and outdated-version
//! lookup against an injectable threshold table.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use semver::Version;
use serde::{Deserialize, Serialize};

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+\.\d+(\.\d+)?").unwrap());

/// Products recognised in banners even without a threshold rule.
const KNOWN_PRODUCTS: &[&str] = &["Apache", "nginx", "PHP", "Microsoft-IIS"];

/// Banner headers inspected, in report order.
const BANNER_HEADERS: &[&str] = &["Server", "X-Powered-By"];

/// A product is outdated when its version falls inside `series` (when set)
/// and is below `minimum`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRule {
    pub product: String,
    /// Dotted version prefix, e.g. `"2.4"` or `"1"`.
    #[serde(default)]
    pub series: Option<String>,
    pub minimum: Version,
}

impl VersionRule {
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                product: "Apache".into(),
                series: Some("2.4".into()),
                minimum: Version::new(2, 4, 50),
            },
            Self {
                product: "nginx".into(),
                series: Some("1".into()),
                minimum: Version::new(1, 18, 0),
            },
            Self {
                product: "PHP".into(),
                series: None,
                minimum: Version::new(7, 4, 0),
            },
        ]
    }

    fn applies_to(&self, version: &Version) -> bool {
        let Some(series) = &self.series else {
            return true;
        };
        let parts = [version.major, version.minor, version.patch];
        let mut count = 0;
        for (i, raw) in series.split('.').enumerate() {
            match (raw.parse::<u64>(), parts.get(i)) {
                (Ok(want), Some(&have)) if want == have => count += 1,
                _ => return false,
            }
        }
        count > 0
    }
}

/// One identified banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    /// Header the banner came from.
    pub header: String,
    /// Header value, verbatim.
    pub value: String,
    pub product: Option<String>,
    pub version: Option<String>,
    pub outdated: bool,
}

/// Identify banners in the baseline response headers.
pub fn identify(headers: &BTreeMap<String, String>, rules: &[VersionRule]) -> Vec<Banner> {
    BANNER_HEADERS
        .iter()
        .filter_map(|&name| {
            let value = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)?;
            let product = infer_product(value, rules);
            let version = extract_version(value);
            let outdated = match (&product, &version) {
                (Some(p), Some(v)) => is_outdated(p, v, rules),
                _ => false,
            };
            Some(Banner {
                header: name.to_string(),
                value: value.clone(),
                product,
                version,
                outdated,
            })
        })
        .collect()
}

/// The product whose name occurs earliest in the banner (case-insensitive).
pub fn infer_product(banner: &str, rules: &[VersionRule]) -> Option<String> {
    let lower = banner.to_lowercase();
    KNOWN_PRODUCTS
        .iter()
        .copied()
        .chain(rules.iter().map(|r| r.product.as_str()))
        .filter_map(|product| {
            lower
                .find(&product.to_lowercase())
                .map(|pos| (pos, product))
        })
        .min_by_key(|&(pos, _)| pos)
        .map(|(_, product)| product.to_string())
}

/// First `major.minor[.patch]` substring of the banner.
pub fn extract_version(banner: &str) -> Option<String> {
    VERSION_RE.find(banner).map(|m| m.as_str().to_string())
}

/// Whether `product` at `version` is below its threshold. Unparseable
/// versions and products without a rule are never outdated.
pub fn is_outdated(product: &str, version: &str, rules: &[VersionRule]) -> bool {
    let Some(version) = parse_version(version) else {
        return false;
    };
    rules
        .iter()
        .filter(|r| r.product.eq_ignore_ascii_case(product))
        .any(|r| r.applies_to(&version) && version < r.minimum)
}

fn parse_version(raw: &str) -> Option<Version> {
    let mut parts = raw.split('.').map(|p| p.parse::<u64>().ok());
    let major = parts.next()??;
    let minor = parts.next()??;
    let patch = match parts.next() {
        Some(p) => p?,
        None => 0,
    };
    Some(Version::new(major, minor, patch))
}
