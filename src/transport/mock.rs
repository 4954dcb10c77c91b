//! In-memory transport doubles for unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{NetworkError, TlsFailure};

use super::{CertificateInfo, HttpRequest, HttpResponse, TlsProbe, Transport};

type Responder = dyn Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync;

/// Records every request and answers through a closure.
pub struct MockTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(
        responder: impl Fn(&HttpRequest) -> Result<HttpResponse, NetworkError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answers 200 with the given headers and body.
    pub fn fixed(headers: &[(&str, &str)], body: &str) -> Self {
        let headers = header_map(headers);
        let body = body.to_string();
        Self::new(move |_| Ok(HttpResponse::new(200, headers.clone(), body.clone(), 1)))
    }

    pub fn calls(&self) -> Vec<HttpRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

impl Transport for MockTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, NetworkError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        (self.responder)(request)
    }
}

/// Returns a canned TLS outcome and counts handshakes.
pub struct MockTls {
    outcome: Result<CertificateInfo, TlsFailure>,
    calls: Mutex<usize>,
}

impl MockTls {
    pub fn ok() -> Self {
        let mut issuer = BTreeMap::new();
        issuer.insert("CN".to_string(), "Test CA".to_string());
        let mut subject = BTreeMap::new();
        subject.insert("CN".to_string(), "example.com".to_string());
        Self::with(Ok(CertificateInfo {
            issuer,
            subject,
            not_before: "Jan  1 00:00:00 2024 +00:00".into(),
            not_after: "Jan  1 00:00:00 2030 +00:00".into(),
        }))
    }

    pub fn failing(failure: TlsFailure) -> Self {
        Self::with(Err(failure))
    }

    fn with(outcome: Result<CertificateInfo, TlsFailure>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }
}

impl TlsProbe for MockTls {
    fn peer_certificate(
        &self,
        _host: &str,
        _port: u16,
        _timeout: Duration,
    ) -> Result<CertificateInfo, TlsFailure> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls += 1;
        }
        self.outcome.clone()
    }
}

pub fn header_map(headers: &[(&str, &str)]) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
        .collect()
}
