//! Loopback HTTP helpers and a recording stub fetcher for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use super::error::ExtractError;
use super::fetch::{Fetch, FetchResult, HeaderProfile};

/// Answers a single request with `status` and `body`; the receiver yields the
/// raw request head that was received.
pub async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = sock.read(&mut chunk).await.unwrap_or(0);
            if n == 0 { break; }
            buf.extend_from_slice(&chunk[..n]);
            if buf.windows(4).any(|w| w == b"\r\n\r\n") { break; }
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        let resp = format!(
            "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = sock.write_all(resp.as_bytes()).await;
        let _ = sock.shutdown().await;
    });
    (format!("http://{addr}/"), rx)
}

/// Accepts connections and never answers.
pub async fn stall() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((sock, _)) = listener.accept().await {
            held.push(sock);
        }
    });
    format!("http://{addr}/")
}

pub enum Reply {
    Ok(StatusCode, &'static str),
    ConnectionRefused,
}

/// Records every requested URL and answers with a canned reply.
pub struct StubFetcher {
    reply: Reply,
    calls: Mutex<Vec<(String, HeaderProfile)>>,
}

impl StubFetcher {
    pub fn new(reply: Reply) -> Self {
        Self { reply, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<(String, HeaderProfile)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetch for StubFetcher {
    async fn get(&self, url: &str, profile: HeaderProfile) -> Result<FetchResult, ExtractError> {
        self.calls.lock().unwrap().push((url.to_string(), profile));
        match &self.reply {
            Reply::Ok(status, body) if status.is_success() || status.is_redirection() => Ok(FetchResult {
                status: *status,
                body: body.to_string(),
                headers: HeaderMap::new(),
            }),
            Reply::Ok(status, _) => Err(ExtractError::HttpStatus { url: url.to_string(), status: *status }),
            Reply::ConnectionRefused => Err(ExtractError::Fetch {
                url: url.to_string(),
                reason: "connection failed (Connection refused)".to_string(),
            }),
        }
    }
}
