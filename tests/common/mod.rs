//! Shared test fixtures: a scripted in-memory executor and a loopback server.

#![allow(dead_code)]

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode};
use parking_lot::Mutex;
use restproxy::executor::{Executing, HttpExecutor};
use restproxy::http::RawResponse;
use restproxy::NetError;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond {
        status: u16,
        headers: Vec<(&'static str, &'static str)>,
        body: &'static str,
    },
    Fail(NetError),
    /// Never answers; only a cancel ends the request.
    Hang,
}

impl Reply {
    pub fn ok(body: &'static str) -> Self {
        Self::status(200, body)
    }

    pub fn status(status: u16, body: &'static str) -> Self {
        Reply::Respond {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn header(mut self, name: &'static str, value: &'static str) -> Self {
        if let Reply::Respond { headers, .. } = &mut self {
            headers.push((name, value));
        }
        self
    }
}

/// What the executor saw of one request.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Executor answering from a script and recording every request it sees.
///
/// Replies are consumed in order; once the script runs out, every request
/// gets an empty `200 OK`.
pub struct ScriptedExecutor {
    replies: Mutex<VecDeque<Reply>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<Captured>>,
    started: AtomicUsize,
}

impl ScriptedExecutor {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            delay: None,
            requests: Mutex::new(Vec::new()),
            started: AtomicUsize::new(0),
        })
    }

    pub fn always_ok() -> Arc<Self> {
        Self::new(Vec::<Reply>::new())
    }

    /// Same as [`new`](Self::new), answering each request after `delay`.
    pub fn delayed(delay: Duration, replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            delay: Some(delay),
            requests: Mutex::new(Vec::new()),
            started: AtomicUsize::new(0),
        })
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<Captured> {
        self.requests.lock().last().cloned()
    }
}

impl HttpExecutor for ScriptedExecutor {
    fn execute(&self, request: Request<Bytes>) -> Executing {
        self.started.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(Captured {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            headers: request.headers().clone(),
            body: request.body().clone(),
        });
        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Reply::ok(""));
        let delay = self.delay;

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match reply {
                Reply::Respond {
                    status,
                    headers,
                    body,
                } => {
                    let mut map = HeaderMap::new();
                    for (name, value) in headers {
                        map.append(
                            HeaderName::from_bytes(name.as_bytes()).unwrap(),
                            HeaderValue::from_static(value),
                        );
                    }
                    let status = StatusCode::from_u16(status).unwrap();
                    Ok(RawResponse::new(status, map, Bytes::from_static(body.as_bytes())))
                }
                Reply::Fail(err) => Err(err),
                Reply::Hang => futures::future::pending().await,
            }
        })
    }
}

/// Read one HTTP/1.1 request (head plus `Content-Length` body) from `socket`.
pub async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let length = text[..head_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            if data.len() >= head_end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}

/// Serve `response` verbatim to every connection; returns the base URL and
/// the requests received.
pub async fn serve(response: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);

    tokio::spawn(async move {
        loop {
            if let Ok((mut socket, _)) = listener.accept().await {
                let log = Arc::clone(&log);
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    log.lock().push(request);
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        }
    });

    (format!("http://{}/", addr), seen)
}

/// Install a test subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
