//! Network boundary of the scanner.
//!
//! The engine only talks to the outside world through `Transport` (plain
//! HTTP GETs) and `TlsProbe` (a TLS handshake that exposes the peer
//! certificate). Production code uses `ReqwestTransport` and `RustlsProbe`;
//! tests substitute in-memory doubles.

pub mod http;
pub mod tls;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use url::Url;

use crate::error::{NetworkError, TlsFailure};

pub use http::ReqwestTransport;
pub use tls::{CertificateInfo, RustlsProbe};

/// An outgoing GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL without query string.
    pub url: Url,
    /// Query parameters, sent in this order.
    pub query: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// The full URL with the query list encoded onto it.
    pub fn full_url(&self) -> Url {
        let mut url = self.url.clone();
        url.set_query(None);
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        url
    }
}

/// A completed HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are lower-cased; repeated headers are joined with ", ".
    pub headers: BTreeMap<String, String>,
    pub body: String,
    /// Body length in bytes.
    pub length: usize,
    /// Hex SHA-256 of the body.
    pub body_hash: String,
    pub latency_ms: u128,
}

impl HttpResponse {
    pub fn new(status: u16, headers: BTreeMap<String, String>, body: String, latency_ms: u128) -> Self {
        let body_hash = hex::encode(Sha256::digest(body.as_bytes()));
        Self {
            status,
            headers,
            length: body.len(),
            body,
            body_hash,
            latency_ms,
        }
    }
}

/// Issues HTTP GET requests. Redirects are followed by the implementation.
pub trait Transport: Send + Sync {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        (**self).get(request)
    }
}

/// Performs a TLS handshake and returns the peer's leaf certificate.
pub trait TlsProbe: Send + Sync {
    fn peer_certificate(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<CertificateInfo, TlsFailure>;
}

impl<T: TlsProbe + ?Sized> TlsProbe for Arc<T> {
    fn peer_certificate(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<CertificateInfo, TlsFailure> {
        (**self).peer_certificate(host, port, timeout)
    }
}
