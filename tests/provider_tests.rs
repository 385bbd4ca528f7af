//! ExternalApiProvider tests against a local stub HTTP server

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use geolocator::config::ProviderKind;
use geolocator::identity::Identity;
use geolocator::services::GeoLookup;
use geolocator::services::geoip::ExternalApiProvider;
use geolocator::storage::Coordinates;

/// Serve exactly one request; the request head is sent back through the channel.
fn serve_once(status: &'static str, body: &'static str) -> (SocketAddr, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let head = read_head(&mut stream);
        let _ = tx.send(head);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        let _ = stream.write_all(response.as_bytes());
        let _ = stream.flush();
    });

    (addr, rx)
}

/// Accept one connection and never answer it.
fn serve_silently(hold: Duration) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let _ = read_head(&mut stream);
            thread::sleep(hold);
        }
    });
    addr
}

fn read_head(stream: &mut std::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn provider(kind: ProviderKind, addr: SocketAddr, timeout: Duration) -> ExternalApiProvider {
    ExternalApiProvider::new(
        kind,
        &format!("http://{}/lookup/{{target}}?access_key={{key}}", addr),
        "test-key",
        timeout,
    )
}

#[tokio::test]
async fn test_ipstack_success() {
    let (addr, requests) = serve_once(
        "200 OK",
        r#"{"ip":"8.8.8.8","country_code":"US","country_name":"United States","region_code":"CA","city":"Mountain View","latitude":37.386,"longitude":-122.0838}"#,
    );
    let provider = provider(ProviderKind::Ipstack, addr, Duration::from_secs(5));

    let record = provider
        .fetch(&Identity::Ip("8.8.8.8".into()))
        .await
        .unwrap();

    assert_eq!(record.ip.as_deref(), Some("8.8.8.8"));
    assert_eq!(record.coordinates, Coordinates::new(-122.0838, 37.386));
    assert_eq!(record.metadata.region_code.as_deref(), Some("CA"));

    let head = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(
        head.starts_with("GET /lookup/8.8.8.8?access_key=test-key "),
        "unexpected request: {head}"
    );
}

#[tokio::test]
async fn test_ip_api_url_identity_is_sent_as_bare_host() {
    let (addr, requests) = serve_once(
        "200 OK",
        r#"{"status":"success","query":"93.184.216.34","lat":42.15,"lon":-70.82,"countryCode":"US","country":"United States","region":"MA","city":"Norwell"}"#,
    );
    let provider = provider(ProviderKind::IpApi, addr, Duration::from_secs(5));

    let record = provider
        .fetch(&Identity::Url("example.com".into()))
        .await
        .unwrap();
    assert_eq!(record.ip.as_deref(), Some("93.184.216.34"));
    assert_eq!(record.metadata.city.as_deref(), Some("Norwell"));

    let head = requests.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(head.starts_with("GET /lookup/example.com?"), "{head}");
}

#[tokio::test]
async fn test_application_failure_is_unavailable() {
    let (addr, _requests) = serve_once(
        "200 OK",
        r#"{"success":false,"error":{"code":104,"type":"usage_limit_reached","info":"Monthly limit reached"}}"#,
    );
    let provider = provider(ProviderKind::Ipstack, addr, Duration::from_secs(5));

    let err = provider
        .fetch(&Identity::Ip("8.8.8.8".into()))
        .await
        .unwrap_err();
    assert!(err.reason.contains("Monthly limit reached"), "{err}");
}

#[tokio::test]
async fn test_malformed_body_is_unavailable() {
    let (addr, _requests) = serve_once("200 OK", "<html>gateway error</html>");
    let provider = provider(ProviderKind::Ipstack, addr, Duration::from_secs(5));

    assert!(provider.fetch(&Identity::Ip("8.8.8.8".into())).await.is_err());
}

#[tokio::test]
async fn test_http_error_status_is_unavailable() {
    let (addr, _requests) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#);
    let provider = provider(ProviderKind::IpApi, addr, Duration::from_secs(5));

    assert!(provider.fetch(&Identity::Ip("8.8.8.8".into())).await.is_err());
}

#[tokio::test]
async fn test_timeout_is_unavailable() {
    let addr = serve_silently(Duration::from_secs(5));
    let provider = provider(ProviderKind::Ipstack, addr, Duration::from_secs(1));

    let started = std::time::Instant::now();
    assert!(provider.fetch(&Identity::Ip("8.8.8.8".into())).await.is_err());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_connection_refused_is_unavailable() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let provider = provider(ProviderKind::Ipstack, addr, Duration::from_secs(2));

    assert!(provider.fetch(&Identity::Ip("8.8.8.8".into())).await.is_err());
}
