//! Passive inspection: TLS certificate, security headers and banners.

pub mod fingerprint;
pub mod headers;
pub mod tls;

pub use fingerprint::{Banner, VersionRule};
pub use headers::HeaderAudit;
