use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{Result, ScanError};
use crate::inspect::{fingerprint, headers, tls};
use crate::probe::compare::{Baseline, Comparator};
use crate::probe::payloads::PayloadCatalog;
use crate::probe::{self, ProbeEngine};
use crate::report::aggregate::ScanAccumulator;
use crate::report::ScanReport;
use crate::target::Target;
use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, RustlsProbe, TlsProbe, Transport};

/// Runs complete scans with one shared HTTP client.
pub struct Scanner {
    config: Config,
    catalog: PayloadCatalog,
    transport: Box<dyn Transport>,
    tls: Box<dyn TlsProbe>,
    cancel: CancelToken,
}

impl Scanner {
    /// Scanner backed by `reqwest` and `rustls`.
    pub fn new(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::new(&config.http)?;
        let tls = RustlsProbe::new()?;
        Ok(Self::with_backends(config, Box::new(transport), Box::new(tls)))
    }

    /// Scanner with caller-supplied network backends.
    pub fn with_backends(
        config: Config,
        transport: Box<dyn Transport>,
        tls: Box<dyn TlsProbe>,
    ) -> Self {
        Self {
            config,
            catalog: PayloadCatalog::default(),
            transport,
            tls,
            cancel: CancelToken::new(),
        }
    }

    /// Replace the built-in payload and fingerprint catalogs.
    pub fn with_catalog(mut self, catalog: PayloadCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Handle that cancels scans run by this scanner.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan one URL. Never fails: every problem ends up in `errors` or
    /// `ssl_info.issues` of the returned report.
    pub fn run(&self, url: &str) -> ScanReport {
        let mut acc = ScanAccumulator::new(url);

        let target = match Target::parse(url) {
            Ok(target) => target,
            Err(e) => {
                acc.record_error(e);
                return acc.finish(&self.config.policy);
            }
        };
        info!(url, host = %target.host, params = target.params.len(), "starting scan");
        acc.set_target(target.clone());

        acc.record_ssl(tls::check(
            self.tls.as_ref(),
            &target,
            self.config.http.tls_timeout(),
            &self.cancel,
        ));

        let baseline = match self.fetch_baseline(&target) {
            Ok(resp) => resp,
            Err(e) => {
                warn!(url, "baseline failed, skipping probes");
                acc.record_error(e);
                return acc.finish(&self.config.policy);
            }
        };

        acc.record_header_audit(headers::audit(&baseline.headers));
        acc.record_banners(fingerprint::identify(
            &baseline.headers,
            &self.config.versions,
        ));
        acc.record_headers(baseline.headers.clone());

        let parameters =
            probe::candidate_parameters(&target, &self.config.probe.default_parameters);
        acc.record_parameters(&parameters);

        let engine = ProbeEngine::new(
            self.transport.as_ref(),
            &self.catalog,
            Comparator::new(self.config.thresholds, &self.catalog),
            &self.config.http,
            &self.cancel,
        );
        engine.run(
            &target,
            &parameters,
            &Baseline::from_response(&baseline),
            &mut acc,
        );

        let report = acc.finish(&self.config.policy);
        info!(
            url,
            suspected = report.verdict.suspected_findings,
            errors = report.errors.len(),
            pass = report.verdict.pass,
            "scan finished"
        );
        report
    }

    /// Reference GET with the target's own parameters.
    fn fetch_baseline(&self, target: &Target) -> Result<HttpResponse> {
        self.cancel.check().map_err(ScanError::Baseline)?;
        let request = HttpRequest {
            url: target.base_url()?,
            query: target.params.clone(),
            timeout: self.cancel.clamp(self.config.http.timeout()),
        };
        self.transport.get(&request).map_err(ScanError::Baseline)
    }
}
