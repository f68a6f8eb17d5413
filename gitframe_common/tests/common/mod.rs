//! Shared helpers: a mock gitweb upstream and a router wired to it.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use arc_swap::ArcSwap;
use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
    Router,
};
use gitframe_common::{
    app,
    state::{Config, ProxyState},
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tower::ServiceExt;

/// What the mock upstream answers with.
#[derive(Clone)]
pub struct Canned {
    pub status: &'static str,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl Canned {
    pub fn ok(content_type: &'static str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: "200 OK",
            content_type,
            body: body.into(),
        }
    }
}

/// A one-route HTTP/1.1 server recording the request line of every request it receives.
pub struct MockUpstream {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockUpstream {
    pub async fn start(canned: Canned) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let canned = canned.clone();
                let seen = seen.clone();
                tokio::spawn(async move {
                    let mut head = Vec::new();
                    let mut buf = [0u8; 1024];
                    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut buf).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => head.extend_from_slice(&buf[..n]),
                        }
                    }
                    let head = String::from_utf8_lossy(&head);
                    let request_line = head.lines().next().unwrap_or("").to_string();
                    seen.lock().unwrap().push(request_line);

                    let mut response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                        canned.status,
                        canned.content_type,
                        canned.body.len()
                    )
                    .into_bytes();
                    response.extend_from_slice(&canned.body);
                    let _ = socket.write_all(&response).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}/gitweb.cgi", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

pub fn config_for(upstream: &MockUpstream) -> Config {
    let mut config = Config::default();
    config.upstream.url = upstream.url();
    config
}

pub fn router(config: Config) -> Router {
    // Bypass any proxy configured in the environment so requests reach the mock.
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    let state = ProxyState::new(Arc::new(ArcSwap::from_pointee(config)), client);
    app(Arc::new(state))
}

pub async fn get(router: &Router, uri: &str, session: &str) -> Response {
    let request = Request::builder()
        .uri(uri)
        .header("cookie", format!("gitframe_session={session}"))
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn set_chrome(router: &Router, session: &str, enabled: bool) -> Response {
    let form = if enabled { "chrome_enabled=1" } else { "" };
    let request = Request::builder()
        .method("POST")
        .uri("/prefs/gitweb")
        .header("cookie", format!("gitframe_session={session}"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form))
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
}
