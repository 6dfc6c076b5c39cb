//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Default)]
struct MockState {
    paths: Mutex<HashMap<String, (u16, String)>>,
    token: Mutex<String>,
    token_status: AtomicU16,
    token_requests: AtomicUsize,
    delay_ms: AtomicU64,
}

/// Programmable stand-in for the IMDSv2 endpoint.
///
/// Unknown metadata paths answer 404, like the real service when no
/// signal is pending.
#[derive(Clone)]
#[allow(dead_code)]
pub struct MockImds {
    pub addr: SocketAddr,
    state: Arc<MockState>,
}

#[allow(dead_code)]
impl MockImds {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState::default());
        *state.token.lock().unwrap() = "mock-token".to_string();
        state.token_status.store(200, Ordering::SeqCst);

        let server_state = state.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let state = server_state.clone();
                        tokio::spawn(async move {
                            handle(socket, state).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        });

        Self { addr, state }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Answer `status` with `body` for `latest/meta-data/<path>`.
    pub fn set(&self, path: &str, status: u16, body: &str) {
        self.state
            .paths
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body.to_string()));
    }

    pub fn clear(&self, path: &str) {
        self.state.paths.lock().unwrap().remove(path);
    }

    pub fn set_token_status(&self, status: u16) {
        self.state.token_status.store(status, Ordering::SeqCst);
    }

    /// Invalidate every token issued so far.
    pub fn rotate_token(&self, token: &str) {
        *self.state.token.lock().unwrap() = token.to_string();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state
            .delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn token_requests(&self) -> usize {
        self.state.token_requests.load(Ordering::SeqCst)
    }
}

async fn handle(mut socket: TcpStream, state: Arc<MockState>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let request = String::from_utf8_lossy(&buf).to_string();
    let mut lines = request.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();

    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let delay = state.delay_ms.load(Ordering::SeqCst);
    if delay > 0 {
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }

    let current_token = state.token.lock().unwrap().clone();
    let (status, body) = if method == "PUT" && path == "/latest/api/token" {
        state.token_requests.fetch_add(1, Ordering::SeqCst);
        let status = state.token_status.load(Ordering::SeqCst);
        if !headers.contains_key("x-aws-ec2-metadata-token-ttl-seconds") {
            (400, String::new())
        } else if status == 200 {
            (200, current_token)
        } else {
            (status, String::new())
        }
    } else if let Some(meta_path) = path.strip_prefix("/latest/meta-data/") {
        if headers.get("x-aws-ec2-metadata-token") != Some(&current_token) {
            (401, String::new())
        } else {
            state
                .paths
                .lock()
                .unwrap()
                .get(meta_path)
                .cloned()
                .unwrap_or((404, String::new()))
        }
    } else {
        (404, String::new())
    };

    let status_text = match status {
        200 => "200 OK",
        400 => "400 Bad Request",
        401 => "401 Unauthorized",
        403 => "403 Forbidden",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "500 Internal Server Error",
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
