//! Injection probe engine.
//!
//! For every candidate parameter the engine sends the SQLi catalog and then
//! the XSS catalog, one request at a time, and hands each response to the
//! comparator. Results and failures go straight into the accumulator; a
//! failed request never stops the loop.

pub mod compare;
pub mod payloads;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::HttpSettings;
use crate::error::{ProbeKind, ScanError};
use crate::report::aggregate::ScanAccumulator;
use crate::report::{SqlProbeRecord, XssProbeRecord};
use crate::target::Target;
use crate::transport::{HttpRequest, Transport};

use compare::{Baseline, Comparator};
use payloads::{PayloadCatalog, ProbePayload};

/// How a payload is combined with the parameter's current value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionMode {
    /// Original value followed by the payload.
    Append,
    /// Payload only; the original value is discarded.
    Replace,
}

/// One payload aimed at one parameter of the target.
#[derive(Debug, Clone, Copy)]
pub struct ProbeRequest<'a> {
    pub parameter: &'a str,
    pub payload: &'a ProbePayload,
    pub mode: InjectionMode,
}

impl ProbeRequest<'_> {
    /// Query list for this probe. Other parameters keep their values and
    /// position; a parameter the target lacks is appended at the end.
    pub fn query(&self, target: &Target) -> Vec<(String, String)> {
        let mut query = target.params.clone();
        match query.iter_mut().find(|(name, _)| name == self.parameter) {
            Some((_, value)) => {
                *value = match self.mode {
                    InjectionMode::Append => format!("{value}{}", self.payload.value),
                    InjectionMode::Replace => self.payload.value.clone(),
                };
            }
            None => query.push((self.parameter.to_string(), self.payload.value.clone())),
        }
        query
    }
}

/// Parameters to probe: the target's own, else the configured defaults.
pub fn candidate_parameters(target: &Target, defaults: &[String]) -> Vec<String> {
    if target.params.is_empty() {
        defaults.to_vec()
    } else {
        target.param_names().map(str::to_string).collect()
    }
}

/// Drives the parameter × payload loop against one target.
pub struct ProbeEngine<'a> {
    transport: &'a dyn Transport,
    catalog: &'a PayloadCatalog,
    comparator: Comparator,
    http: &'a HttpSettings,
    cancel: &'a CancelToken,
}

impl<'a> ProbeEngine<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        catalog: &'a PayloadCatalog,
        comparator: Comparator,
        http: &'a HttpSettings,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            transport,
            catalog,
            comparator,
            http,
            cancel,
        }
    }

    /// Probe every parameter. Stops early only on cancellation, which is
    /// recorded as a single error.
    pub fn run(
        &self,
        target: &Target,
        parameters: &[String],
        baseline: &Baseline,
        acc: &mut ScanAccumulator,
    ) {
        let total = parameters.len() * self.catalog.probes_per_parameter();
        let mut attempted = 0usize;

        for parameter in parameters {
            let sql_mode = if target.param(parameter).is_some() {
                InjectionMode::Append
            } else {
                InjectionMode::Replace
            };
            let plan = self
                .catalog
                .sql
                .iter()
                .map(|p| (p, sql_mode))
                .chain(self.catalog.xss.iter().map(|p| (p, InjectionMode::Replace)));

            for (payload, mode) in plan {
                if self.cancel.is_cancelled() {
                    acc.record_error(ScanError::Cancelled {
                        skipped: total - attempted,
                    });
                    return;
                }
                attempted += 1;
                let probe = ProbeRequest {
                    parameter,
                    payload,
                    mode,
                };
                if payload.category.is_sql() {
                    self.probe_sql(target, probe, baseline, acc);
                } else {
                    self.probe_xss(target, probe, acc);
                }
            }
        }
    }

    fn request(&self, target: &Target, probe: ProbeRequest<'_>) -> Result<HttpRequest, ScanError> {
        Ok(HttpRequest {
            url: target.base_url()?,
            query: probe.query(target),
            timeout: self.cancel.clamp(self.http.timeout()),
        })
    }

    fn probe_sql(
        &self,
        target: &Target,
        probe: ProbeRequest<'_>,
        baseline: &Baseline,
        acc: &mut ScanAccumulator,
    ) {
        let outcome = self
            .request(target, probe)
            .and_then(|req| self.send(&req, ProbeKind::SqlInjection, probe));
        let response = match outcome {
            Ok(resp) => resp,
            Err(e) => return acc.record_error(e),
        };

        let comparison = self.comparator.compare(baseline, &response);
        let suspected = comparison.suspected();
        debug!(
            parameter = probe.parameter,
            category = %probe.payload.category,
            length = response.length,
            length_diff = comparison.length_diff,
            similarity = ?comparison.textual_similarity,
            suspected,
            "sql probe"
        );
        acc.record_sql(SqlProbeRecord {
            parameter: probe.parameter.to_string(),
            category: probe.payload.category,
            payload: probe.payload.value.clone(),
            mode: probe.mode,
            status: response.status,
            length: response.length,
            latency_ms: response.latency_ms,
            comparison,
            suspected,
        });
    }

    fn probe_xss(&self, target: &Target, probe: ProbeRequest<'_>, acc: &mut ScanAccumulator) {
        let outcome = self
            .request(target, probe)
            .and_then(|req| self.send(&req, ProbeKind::Xss, probe));
        let response = match outcome {
            Ok(resp) => resp,
            Err(e) => return acc.record_error(e),
        };

        let reflection = self.comparator.reflection(&probe.payload.value, &response.body);
        debug!(
            parameter = probe.parameter,
            category = %probe.payload.category,
            direct = reflection.direct_reflected,
            partial = reflection.partial_reflected,
            "xss probe"
        );
        acc.record_xss(XssProbeRecord {
            parameter: probe.parameter.to_string(),
            category: probe.payload.category,
            payload: probe.payload.value.clone(),
            status: response.status,
            direct_reflected: reflection.direct_reflected,
            partial_reflected: reflection.partial_reflected,
            suspected: reflection.suspected(),
        });
    }

    fn send(
        &self,
        request: &HttpRequest,
        test: ProbeKind,
        probe: ProbeRequest<'_>,
    ) -> Result<crate::transport::HttpResponse, ScanError> {
        self.transport.get(request).map_err(|source| ScanError::Probe {
            test,
            parameter: probe.parameter.to_string(),
            category: probe.payload.category,
            source,
        })
    }
}
