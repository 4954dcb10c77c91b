use std::time::Duration;

use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::report::SslInfo;
use crate::target::Target;
use crate::transport::TlsProbe;

/// Issue recorded for plain-HTTP targets.
pub const NOT_HTTPS: &str = "Not using HTTPS";

/// Check the target's TLS certificate. Plain-HTTP targets short-circuit
/// without touching the network; failures become issues, never errors.
pub fn check(
    probe: &dyn TlsProbe,
    target: &Target,
    timeout: Duration,
    cancel: &CancelToken,
) -> SslInfo {
    if !target.scheme.is_secure() {
        return SslInfo {
            valid: false,
            issues: vec![NOT_HTTPS.to_string()],
            certificate: None,
        };
    }

    if let Err(e) = cancel.check() {
        return SslInfo {
            valid: false,
            issues: vec![format!("Error: {e}")],
            certificate: None,
        };
    }

    match probe.peer_certificate(&target.host, target.port, cancel.clamp(timeout)) {
        Ok(certificate) => {
            debug!(host = %target.host, subject = ?certificate.subject, "certificate retrieved");
            SslInfo {
                valid: true,
                issues: Vec::new(),
                certificate: Some(certificate),
            }
        }
        Err(failure) => {
            warn!(host = %target.host, error = %failure, "TLS check failed");
            SslInfo {
                valid: false,
                issues: vec![failure.to_string()],
                certificate: None,
            }
        }
    }
}
