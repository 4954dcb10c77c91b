use std::collections::BTreeMap;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore};
use serde::{Deserialize, Serialize};
use x509_parser::objects::{oid2abbrev, oid_registry};
use x509_parser::prelude::{parse_x509_certificate, X509Name};

use crate::error::TlsFailure;

use super::TlsProbe;

/// Fields read from the peer's leaf certificate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Issuer attributes keyed by short name (`CN`, `O`, `C`, ...).
    pub issuer: BTreeMap<String, String>,
    pub subject: BTreeMap<String, String>,
    #[serde(rename = "notBefore")]
    pub not_before: String,
    #[serde(rename = "notAfter")]
    pub not_after: String,
}

/// Blocking TLS handshake over a std `TcpStream`, verified against the
/// bundled web PKI roots.
pub struct RustlsProbe {
    config: Arc<ClientConfig>,
}

impl RustlsProbe {
    pub fn new() -> Result<Self, TlsFailure> {
        let roots = RootCertStore {
            roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
        };
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| TlsFailure::Other(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();
        Ok(Self {
            config: Arc::new(config),
        })
    }

    fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream, TlsFailure> {
        let addrs = (host, port)
            .to_socket_addrs()
            .map_err(|e| TlsFailure::Connect(format!("cannot resolve {host}: {e}")))?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        Err(match last_err {
            Some(e) if is_timeout(&e) => TlsFailure::Timeout(timeout),
            Some(e) => TlsFailure::Connect(e.to_string()),
            None => TlsFailure::Connect(format!("no addresses found for {host}")),
        })
    }
}

impl TlsProbe for RustlsProbe {
    fn peer_certificate(
        &self,
        host: &str,
        port: u16,
        timeout: Duration,
    ) -> Result<CertificateInfo, TlsFailure> {
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        let server_name = ServerName::try_from(bare_host.to_string())
            .map_err(|e| TlsFailure::Handshake(format!("invalid server name {bare_host}: {e}")))?;

        let deadline = Instant::now() + timeout;
        let mut tcp = Self::connect(bare_host, port, timeout)?;
        let mut conn = ClientConnection::new(Arc::clone(&self.config), server_name)
            .map_err(|e| TlsFailure::Other(e.to_string()))?;

        // One budget for the whole handshake, so a trickling peer cannot
        // stretch it by resetting the per-read timeout.
        while conn.is_handshaking() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(TlsFailure::Timeout(timeout));
            }
            tcp.set_read_timeout(Some(remaining))
                .and_then(|_| tcp.set_write_timeout(Some(remaining)))
                .map_err(|e| TlsFailure::Other(e.to_string()))?;

            while conn.wants_write() {
                conn.write_tls(&mut tcp)
                    .map_err(|e| io_failure(e, timeout))?;
            }
            if conn.is_handshaking() && conn.wants_read() {
                let read = conn
                    .read_tls(&mut tcp)
                    .map_err(|e| io_failure(e, timeout))?;
                if read == 0 {
                    return Err(TlsFailure::Connect(
                        "connection closed during handshake".into(),
                    ));
                }
                conn.process_new_packets()
                    .map_err(|e| TlsFailure::Handshake(e.to_string()))?;
            }
        }

        let der = conn
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| TlsFailure::Handshake("peer sent no certificate".into()))?;
        let (_, cert) = parse_x509_certificate(der.as_ref())
            .map_err(|e| TlsFailure::Other(format!("unparseable certificate: {e}")))?;

        Ok(CertificateInfo {
            issuer: name_attributes(cert.issuer()),
            subject: name_attributes(cert.subject()),
            not_before: cert.validity().not_before.to_string(),
            not_after: cert.validity().not_after.to_string(),
        })
    }
}

fn name_attributes(name: &X509Name<'_>) -> BTreeMap<String, String> {
    let registry = oid_registry();
    let mut attrs = BTreeMap::new();
    for attr in name.iter_attributes() {
        let Ok(value) = attr.as_str() else {
            continue;
        };
        let key = oid2abbrev(attr.attr_type(), registry)
            .map(str::to_string)
            .unwrap_or_else(|_| attr.attr_type().to_id_string());
        attrs.entry(key).or_insert_with(|| value.to_string());
    }
    attrs
}

fn io_failure(err: io::Error, timeout: Duration) -> TlsFailure {
    if is_timeout(&err) {
        TlsFailure::Timeout(timeout)
    } else if err.kind() == io::ErrorKind::InvalidData {
        TlsFailure::Handshake(err.to_string())
    } else {
        TlsFailure::Connect(err.to_string())
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;

    #[test]
    fn refused_connection_is_a_connection_error() {
        // Bind then drop to get a port with nothing listening on it.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let probe = RustlsProbe::new().unwrap();
        let err = probe
            .peer_certificate("127.0.0.1", port, Duration::from_secs(2))
            .unwrap_err();
        assert!(err.to_string().starts_with("Connection error: "), "{err}");
    }

    #[test]
    fn trickling_peer_hits_overall_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            // Handshake record header announcing 16 KiB, then one byte at a time.
            let mut bytes = vec![0x16, 0x03, 0x03, 0x40, 0x00];
            bytes.extend(std::iter::repeat(0u8).take(60));
            for byte in bytes {
                if stream.write_all(&[byte]).is_err() {
                    return;
                }
                std::thread::sleep(Duration::from_millis(100));
            }
        });

        let probe = RustlsProbe::new().unwrap();
        let started = Instant::now();
        let err = probe
            .peer_certificate("127.0.0.1", port, Duration::from_secs(1))
            .unwrap_err();
        assert_eq!(err, TlsFailure::Timeout(Duration::from_secs(1)));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[test]
    fn certificate_serializes_with_validity_keys() {
        let info = CertificateInfo {
            not_before: "a".into(),
            not_after: "b".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["notBefore"], "a");
        assert_eq!(json["notAfter"], "b");
    }
}
