use std::collections::BTreeMap;
use std::io::Read;
use std::time::Instant;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::redirect::Policy;

use crate::config::HttpSettings;
use crate::error::{NetworkError, Result, ScanError};

use super::{HttpRequest, HttpResponse, Transport};

/// Blocking `reqwest` client shared by every request of a scan.
pub struct ReqwestTransport {
    client: Client,
    max_body_bytes: u64,
}

impl ReqwestTransport {
    /// Build a client with browser-like default headers and the configured
    /// redirect limit.
    pub fn new(settings: &HttpSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|e| ScanError::Config(format!("invalid user_agent: {e}")))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::limited(settings.max_redirects))
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ScanError::Client(e.to_string()))?;

        Ok(Self {
            client,
            max_body_bytes: settings.max_body_bytes,
        })
    }
}

impl Transport for ReqwestTransport {
    fn get(&self, request: &HttpRequest) -> std::result::Result<HttpResponse, NetworkError> {
        let started = Instant::now();
        let url = request.full_url();
        let response = self.client.get(url.clone()).timeout(request.timeout).send()?;

        let status = response.status().as_u16();
        let mut headers: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in response.headers() {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        // Oversized bodies are truncated, not rejected.
        let mut raw = Vec::new();
        response
            .take(self.max_body_bytes)
            .read_to_end(&mut raw)
            .map_err(|e| NetworkError::Body(e.to_string()))?;
        let body = String::from_utf8_lossy(&raw).into_owned();
        let latency_ms = started.elapsed().as_millis();
        tracing::trace!(%url, status, latency_ms, bytes = raw.len(), "response received");

        Ok(HttpResponse::new(status, headers, body, latency_ms))
    }
}
