//! Service-account tokens are exchanged once and reused.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gemini_client::{ServiceAccountAuth, ServiceAccountKey};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test_service_account.pem");

/// Minimal token endpoint: counts exchanges and always grants a one-hour token.
async fn spawn_token_endpoint() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let exchanges = Arc::new(AtomicUsize::new(0));

    let counter = exchanges.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let counter = counter.clone();
            tokio::spawn(async move {
                let (mut stream, body) = read_request(stream).await;
                assert!(body.contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"));

                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                let payload = format!(
                    r#"{{"access_token":"ya29.token-{}","expires_in":3599,"token_type":"Bearer"}}"#,
                    n
                );
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    payload.len(),
                    payload
                );
                stream.write_all(response.as_bytes()).await.unwrap();
                stream.shutdown().await.unwrap();
            });
        }
    });

    (format!("http://{}/token", addr), exchanges)
}

/// Read headers plus a `content-length` body.
async fn read_request(mut stream: TcpStream) -> (TcpStream, String) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
    let content_length: usize = headers
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .map(|v| v.trim().parse().unwrap())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before body");
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..header_end + content_length]).to_string();
    (stream, body)
}

fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}

fn auth_for(token_uri: &str) -> ServiceAccountAuth {
    let json = serde_json::json!({
        "type": "service_account",
        "project_id": "flipeasy-test",
        "private_key_id": "test-key",
        "private_key": TEST_PRIVATE_KEY,
        "client_email": "lister@flipeasy-test.iam.gserviceaccount.com",
        "token_uri": token_uri,
    })
    .to_string();

    ServiceAccountAuth::new(ServiceAccountKey::from_json(&json).unwrap()).unwrap()
}

#[tokio::test]
async fn token_is_reused_until_expiry() {
    let (token_uri, exchanges) = spawn_token_endpoint().await;
    let auth = auth_for(&token_uri);
    let http = http_client();

    let first = auth.access_token(&http).await.unwrap();
    let second = auth.access_token(&http).await.unwrap();

    assert_eq!(first, "ya29.token-1");
    assert_eq!(second, first);
    assert_eq!(exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn clones_share_the_cache() {
    let (token_uri, exchanges) = spawn_token_endpoint().await;
    let auth = auth_for(&token_uri);
    let http = http_client();

    auth.access_token(&http).await.unwrap();
    auth.clone().access_token(&http).await.unwrap();

    assert_eq!(exchanges.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_token_always_exchanges() {
    let (token_uri, exchanges) = spawn_token_endpoint().await;
    let auth = auth_for(&token_uri);
    let http = http_client();

    auth.access_token(&http).await.unwrap();
    let fresh = auth.fetch_token(&http).await.unwrap();

    assert_eq!(fresh.access_token, "ya29.token-2");
    assert_eq!(exchanges.load(Ordering::SeqCst), 2);
}
