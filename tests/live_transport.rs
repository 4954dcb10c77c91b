//! End-to-end scans against a loopback HTTP server.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use hawkscan::config::{Config, HttpSettings};
use hawkscan::error::NetworkError;
use hawkscan::transport::{HttpRequest, ReqwestTransport, Transport};
use hawkscan::Scanner;

const BODY: &str = "<html><body>Welcome to the catalog</body></html>";

/// Run `handler` for every connection, each on its own thread, until the
/// test process exits.
fn spawn_server(handler: fn(TcpStream)) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            thread::spawn(move || handler(stream));
        }
    });
    port
}

/// Consume the request head; false if the client went away first.
fn read_head(stream: &mut TcpStream) -> bool {
    let mut buf = [0u8; 4096];
    let mut request = Vec::new();
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return false,
            Ok(n) => request.extend_from_slice(&buf[..n]),
        }
    }
    true
}

fn catalog_page(mut stream: TcpStream) {
    if !read_head(&mut stream) {
        return;
    }
    let response = format!(
        "HTTP/1.1 200 OK\r\nServer: nginx/1.16.0\r\nX-Frame-Options: DENY\r\n\
         Content-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        BODY.len(),
        BODY
    );
    let _ = stream.write_all(response.as_bytes());
}

/// Advertises and streams 4 MiB of filler.
fn huge_page(mut stream: TcpStream) {
    if !read_head(&mut stream) {
        return;
    }
    let chunk = vec![b'a'; 64 * 1024];
    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        64 * chunk.len()
    );
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }
    for _ in 0..64 {
        if stream.write_all(&chunk).is_err() {
            return;
        }
    }
}

fn redirect_loop(mut stream: TcpStream) {
    if !read_head(&mut stream) {
        return;
    }
    let _ = stream.write_all(
        b"HTTP/1.1 302 Found\r\nLocation: /again\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
    );
}

fn stalled_page(mut stream: TcpStream) {
    if !read_head(&mut stream) {
        return;
    }
    thread::sleep(Duration::from_secs(3));
    let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok");
}

fn request_to(port: u16, timeout: Duration) -> HttpRequest {
    HttpRequest {
        url: format!("http://127.0.0.1:{port}/").parse().unwrap(),
        query: Vec::new(),
        timeout,
    }
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn reqwest_transport_reads_headers_and_body() {
    let port = spawn_server(catalog_page);
    let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();
    let mut request = request_to(port, HttpSettings::default().timeout());
    request.query = vec![("id".into(), "1' OR '1'='1".into())];

    let response = transport.get(&request).unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.body, BODY);
    assert_eq!(response.length, BODY.len());
    assert_eq!(
        response.headers.get("server").map(String::as_str),
        Some("nginx/1.16.0")
    );
}

#[test]
fn oversized_body_is_truncated_to_cap() {
    let port = spawn_server(huge_page);
    let settings = HttpSettings {
        max_body_bytes: 1024 * 1024,
        ..HttpSettings::default()
    };
    let transport = ReqwestTransport::new(&settings).unwrap();

    let response = transport
        .get(&request_to(port, settings.timeout()))
        .unwrap();
    assert_eq!(response.status, 200);
    assert_eq!(response.length, 1024 * 1024);
}

#[test]
fn redirect_loop_is_classified() {
    let port = spawn_server(redirect_loop);
    let settings = HttpSettings {
        max_redirects: 3,
        ..HttpSettings::default()
    };
    let transport = ReqwestTransport::new(&settings).unwrap();

    let err = transport
        .get(&request_to(port, settings.timeout()))
        .unwrap_err();
    assert!(matches!(err, NetworkError::TooManyRedirects(_)), "{err:?}");
}

#[test]
fn slow_server_is_a_timeout() {
    let port = spawn_server(stalled_page);
    let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();

    let err = transport
        .get(&request_to(port, Duration::from_secs(1)))
        .unwrap_err();
    assert!(matches!(err, NetworkError::Timeout(_)), "{err:?}");
}

#[test]
fn refused_connection_is_a_network_error() {
    let port = free_port();
    let transport = ReqwestTransport::new(&HttpSettings::default()).unwrap();

    let err = transport
        .get(&request_to(port, HttpSettings::default().timeout()))
        .unwrap_err();
    assert!(matches!(err, NetworkError::Connect(_) | NetworkError::Request(_)));
}

#[test]
fn full_scan_over_loopback() {
    let port = spawn_server(catalog_page);
    let scanner = Scanner::new(Config::default()).unwrap();
    let report = scanner.run(&format!("http://127.0.0.1:{port}/?id=1"));

    assert!(report.errors.is_empty(), "{:?}", report.errors);
    assert_eq!(report.technologies, vec!["nginx/1.16.0"]);
    assert_eq!(report.outdated, vec!["nginx/1.16.0"]);
    assert_eq!(report.ssl_info.issues, vec!["Not using HTTPS"]);
    assert_eq!(report.missing_security_headers.len(), 5);
    assert_eq!(
        report.vuln_tests.missing_critical_headers,
        vec!["Content-Security-Policy", "Strict-Transport-Security"]
    );
    // Raw header names arrive lower-cased; the audit reports canonical ones.
    assert!(report.headers.contains_key("x-frame-options"));
    assert!(report.security_headers.contains_key("X-Frame-Options"));
    assert_eq!(report.vuln_tests.sql_injection.len(), 10);
    assert_eq!(report.vuln_tests.xss.len(), 8);
    assert!(!report.vuln_tests.sql_injection_suspected);
    assert!(!report.vuln_tests.xss_suspected);
}
