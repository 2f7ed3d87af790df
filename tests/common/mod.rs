//! In-process SimpleVOC stand-in for integration tests and benchmarks
//!
//! Serves the SimpleVOC REST routes over HTTP/1.1 on an ephemeral port from
//! its own thread and runtime, so both blocking and async clients can use it.
//! Responses for a path can be overridden with [`MockVocServer::stub`].

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use percent_encoding::percent_decode_str;
use tokio::sync::oneshot;

pub const SERVER_VERSION: &str = "1.3.0";

#[derive(Debug, Clone)]
struct StoredRecord {
    data: Bytes,
    created: String,
    expires: Option<String>,
    flags: i32,
    extended: Option<String>,
}

#[derive(Debug, Clone)]
struct Stub {
    status: StatusCode,
    headers: Vec<(String, String)>,
    body: Bytes,
    delay: Duration,
}

#[derive(Default)]
struct ServerState {
    records: Mutex<BTreeMap<String, StoredRecord>>,
    stubs: Mutex<HashMap<String, Stub>>,
    queries: Mutex<Vec<String>>,
    user_agents: Mutex<Vec<String>>,
    content_types: Mutex<Vec<String>>,
    version_hits: AtomicUsize,
}

#[derive(Clone)]
struct Handler {
    state: Arc<ServerState>,
}

impl Handler {
    async fn handle(&self, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        if let Some(agent) = req.headers().get("user-agent").and_then(|v| v.to_str().ok()) {
            self.state.user_agents.lock().unwrap().push(agent.to_string());
        }
        if let Some(content_type) = req.headers().get("content-type").and_then(|v| v.to_str().ok()) {
            self.state.content_types.lock().unwrap().push(content_type.to_string());
        }
        if let Some(query) = req.uri().query() {
            self.state.queries.lock().unwrap().push(query.to_string());
        }

        let stub = self.state.stubs.lock().unwrap().get(&path).cloned();
        if let Some(stub) = stub {
            if !stub.delay.is_zero() {
                tokio::time::sleep(stub.delay).await;
            }
            return stub_response(stub);
        }

        match (method.as_str(), path.as_str()) {
            ("GET", "/version") => {
                self.state.version_hits.fetch_add(1, Ordering::SeqCst);
                json_response(
                    StatusCode::OK,
                    serde_json::json!({ "version": SERVER_VERSION }).to_string(),
                )
            }
            ("POST", "/flush") => {
                self.state.records.lock().unwrap().clear();
                json_response(StatusCode::OK, "{}".to_string())
            }
            ("GET", _) if path.starts_with("/keys/") => self.handle_keys(&path["/keys/".len()..]),
            ("GET", _) if path.starts_with("/value/") => self.handle_get(&path["/value/".len()..]),
            ("POST", _) if path.starts_with("/value/") => {
                let key = decode_segment(&path["/value/".len()..]);
                self.handle_set(key, req).await
            }
            _ => error_response(StatusCode::NOT_FOUND, "unknown path"),
        }
    }

    fn handle_keys(&self, raw_prefix: &str) -> Response<Full<Bytes>> {
        let prefix = decode_segment(raw_prefix);
        let keys: Vec<String> = self
            .state
            .records
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();

        if keys.is_empty() {
            return error_response(StatusCode::NOT_FOUND, "prefix not found");
        }
        json_response(StatusCode::OK, serde_json::to_string(&keys).unwrap())
    }

    fn handle_get(&self, raw_key: &str) -> Response<Full<Bytes>> {
        let key = decode_segment(raw_key);
        let Some(record) = self.state.records.lock().unwrap().get(&key).cloned() else {
            return error_response(StatusCode::NOT_FOUND, "not found");
        };

        let mut builder = Response::builder()
            .status(StatusCode::OK)
            .header("x-voc-created", record.created)
            .header("x-voc-flags", record.flags.to_string());
        if let Some(expires) = record.expires {
            builder = builder.header("x-voc-expires", expires);
        }
        if let Some(extended) = record.extended {
            builder = builder.header("x-voc-extended", extended);
        }
        builder.body(Full::new(record.data)).unwrap()
    }

    async fn handle_set(&self, key: String, req: Request<Incoming>) -> Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .map(|v| String::from_utf8_lossy(v.as_bytes()).to_string())
        };

        let Some(flags) = header("x-voc-flags").and_then(|f| f.parse::<i32>().ok()) else {
            return error_response(StatusCode::BAD_REQUEST, "invalid flags");
        };
        let expires = header("x-voc-expires");
        let extended = header("x-voc-extended");
        if let Some(ext) = &extended {
            if serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(ext).is_err() {
                return error_response(StatusCode::BAD_REQUEST, "invalid extended attributes");
            }
        }

        let data = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(_) => return error_response(StatusCode::BAD_REQUEST, "unreadable body"),
        };

        let mut records = self.state.records.lock().unwrap();
        if records.contains_key(&key) {
            return error_response(StatusCode::CONFLICT, "key already exists");
        }
        records.insert(
            key,
            StoredRecord {
                data,
                created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
                expires,
                flags,
                extended,
            },
        );
        json_response(StatusCode::CREATED, "{}".to_string())
    }
}

impl hyper::service::Service<Request<Incoming>> for Handler {
    type Response = Response<Full<Bytes>>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let handler = self.clone();
        Box::pin(async move { Ok(handler.handle(req).await) })
    }
}

fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().to_string()
}

fn json_response(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json; charset=utf-8")
        .body(Full::new(Bytes::from(body)))
        .unwrap()
}

fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": true,
        "code": status.as_u16(),
        "message": message,
    });
    json_response(status, body.to_string())
}

fn stub_response(stub: Stub) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(stub.status);
    for (name, value) in &stub.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder.body(Full::new(stub.body)).unwrap()
}

/// Handle to a running mock server; shuts down on drop
pub struct MockVocServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockVocServer {
    pub fn start() -> Self {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        listener.set_nonblocking(true).expect("set nonblocking");
        let addr = listener.local_addr().expect("local addr");

        let state = Arc::new(ServerState::default());
        let handler = Handler { state: state.clone() };
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        std::thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("mock server runtime");
            runtime.block_on(serve(listener, handler, shutdown_rx));
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Serve a fixed response for `path` instead of the normal route
    pub fn stub(&self, path: &str, status: u16, headers: &[(&str, &str)], body: &str) {
        let stub = Stub {
            status: StatusCode::from_u16(status).expect("valid status"),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: Bytes::from(body.to_string()),
            delay: Duration::ZERO,
        };
        self.state.stubs.lock().unwrap().insert(path.to_string(), stub);
    }

    /// Answer `path` with an empty JSON object only after `delay`
    pub fn stall(&self, path: &str, delay: Duration) {
        let stub = Stub {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: Bytes::from_static(b"{}"),
            delay,
        };
        self.state.stubs.lock().unwrap().insert(path.to_string(), stub);
    }

    pub fn version_hits(&self) -> usize {
        self.state.version_hits.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.queries.lock().unwrap().clone()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.state.user_agents.lock().unwrap().clone()
    }

    pub fn content_types(&self) -> Vec<String> {
        self.state.content_types.lock().unwrap().clone()
    }

    pub fn record_count(&self) -> usize {
        self.state.records.lock().unwrap().len()
    }

    /// Raw `x-voc-extended` header stored for `key`
    pub fn stored_extended(&self, key: &str) -> Option<String> {
        self.state
            .records
            .lock()
            .unwrap()
            .get(key)
            .and_then(|r| r.extended.clone())
    }
}

impl Drop for MockVocServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve(
    listener: std::net::TcpListener,
    handler: Handler,
    mut shutdown: oneshot::Receiver<()>,
) {
    let listener = tokio::net::TcpListener::from_std(listener).expect("tokio listener");

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let Ok((stream, _)) = accepted else { continue };
                let handler = handler.clone();
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);
                    let _ = http1::Builder::new().serve_connection(io, handler).await;
                });
            }
            _ = &mut shutdown => break,
        }
    }
}
