//! Baseline-vs-probe response comparison.
//!
//! Three independent signals feed the SQLi verdict: a relative body-length
//! change, a drop in token-level Jaccard similarity, and database error
//! fingerprints. XSS uses verbatim and marker-based reflection.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::Thresholds;
use crate::transport::HttpResponse;

use super::payloads::PayloadCatalog;

/// Reference response every probe is compared against.
#[derive(Debug, Clone)]
pub struct Baseline {
    pub length: usize,
    pub body_hash: String,
    tokens: HashSet<String>,
}

impl Baseline {
    pub fn from_response(resp: &HttpResponse) -> Self {
        Self {
            length: resp.length,
            body_hash: resp.body_hash.clone(),
            tokens: tokenize(&resp.body),
        }
    }
}

/// Outcome of comparing one SQLi probe response with the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// `len(probe) - len(baseline)` in bytes.
    pub length_diff: i64,
    pub significant_length_change: bool,
    /// `None` when either body has no tokens.
    pub textual_similarity: Option<f64>,
    pub response_differs_significantly: bool,
    pub error_signature_matched: bool,
    pub matched_signature: Option<String>,
    /// Body hash differs from the baseline's.
    pub body_changed: bool,
}

impl ComparisonResult {
    pub fn suspected(&self) -> bool {
        self.error_signature_matched
            || self.significant_length_change
            || self.response_differs_significantly
    }
}

/// Outcome of checking one XSS probe response for reflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub direct_reflected: bool,
    pub partial_reflected: bool,
}

impl Reflection {
    pub fn suspected(&self) -> bool {
        self.direct_reflected || self.partial_reflected
    }
}

/// Scores probe responses using configured thresholds and fingerprints.
pub struct Comparator {
    thresholds: Thresholds,
    signatures: Vec<(String, String)>,
    markers: Vec<String>,
}

impl Comparator {
    pub fn new(thresholds: Thresholds, catalog: &PayloadCatalog) -> Self {
        Self {
            thresholds,
            signatures: catalog
                .error_signatures
                .iter()
                .map(|s| (s.clone(), s.to_lowercase()))
                .collect(),
            markers: catalog
                .reflection_markers
                .iter()
                .map(|m| m.to_lowercase())
                .collect(),
        }
    }

    pub fn compare(&self, baseline: &Baseline, probe: &HttpResponse) -> ComparisonResult {
        let length_diff = probe.length as i64 - baseline.length as i64;
        let textual_similarity = jaccard(&baseline.tokens, &tokenize(&probe.body));
        let lower = probe.body.to_lowercase();
        let matched_signature = self
            .signatures
            .iter()
            .find(|(_, needle)| lower.contains(needle.as_str()))
            .map(|(original, _)| original.clone());

        ComparisonResult {
            length_diff,
            significant_length_change: significant_length_change(
                baseline.length,
                probe.length,
                self.thresholds.length_change_ratio,
            ),
            textual_similarity,
            response_differs_significantly: textual_similarity
                .is_some_and(|s| s < self.thresholds.similarity),
            error_signature_matched: matched_signature.is_some(),
            matched_signature,
            body_changed: probe.body_hash != baseline.body_hash,
        }
    }

    pub fn reflection(&self, payload: &str, body: &str) -> Reflection {
        let payload_lower = payload.to_lowercase();
        let body_lower = body.to_lowercase();
        Reflection {
            direct_reflected: body.contains(payload),
            partial_reflected: self.markers.iter().any(|m| {
                payload_lower.contains(m.as_str()) && body_lower.contains(m.as_str())
            }),
        }
    }
}

/// Lower-cased, whitespace-delimited token set.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// `|a ∩ b| / |a ∪ b|`, or `None` if either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> Option<f64> {
    if a.is_empty() || b.is_empty() {
        return None;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    Some(intersection as f64 / union as f64)
}

/// `|probe - baseline| > ratio * baseline`; always false for an empty
/// baseline.
pub fn significant_length_change(baseline: usize, probe: usize, ratio: f64) -> bool {
    if baseline == 0 {
        return false;
    }
    let diff = (probe as f64 - baseline as f64).abs();
    diff > ratio * baseline as f64
}
