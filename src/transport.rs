//! HTTP transport: sends [`RequestParts`] and collects the full response

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{header, HeaderMap, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::{Request, Uri};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client as HttpClient;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::codec::{RequestParts, CONTENT_TYPE, USER_AGENT};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

type HttpsConnector = hyper_rustls::HttpsConnector<HttpConnector>;

/// A response with its body fully read
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Build a rustls ClientConfig verifying servers against the webpki roots.
fn build_tls_config() -> Result<rustls::ClientConfig> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());

    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Ok(rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Connection(format!("TLS setup failed: {}", e)))?
        .with_root_certificates(roots)
        .with_no_client_auth())
}

/// Pooled HTTP/1.1 client bound to one endpoint. `https://` endpoints are
/// served over TLS, everything else in cleartext.
#[derive(Clone)]
pub struct Transport {
    endpoint: Arc<str>,
    timeout_ms: u64,
    http_client: HttpClient<HttpsConnector, Full<Bytes>>,
}

impl Transport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/');

        let uri: Uri = endpoint
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("Invalid endpoint URL: {}", e)))?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(Error::InvalidUrl(format!(
                "Endpoint must look like scheme://host:port, got {:?}",
                config.endpoint
            )));
        }

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(build_tls_config()?)
            .https_or_http()
            .enable_http1()
            .build();

        let http_client = HttpClient::builder(TokioExecutor::new())
            .pool_max_idle_per_host(config.max_idle_per_host)
            .build(https_connector);

        Ok(Self {
            endpoint: Arc::from(endpoint),
            timeout_ms: config.timeout_ms,
            http_client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send a request and read the whole response, whatever its status.
    pub async fn send(&self, parts: RequestParts) -> Result<RawResponse> {
        debug!("Sending request: {} {}", parts.method, parts.path);

        let url = format!("{}{}", self.endpoint, parts.path);
        let uri: Uri = url
            .parse()
            .map_err(|e| Error::InvalidUrl(format!("Invalid request URL: {}", e)))?;

        let mut builder = Request::builder()
            .method(parts.method)
            .uri(uri)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .header(header::USER_AGENT, USER_AGENT);

        if let Some(headers) = builder.headers_mut() {
            headers.extend(parts.headers);
        }

        let req = builder
            .body(Full::new(parts.body))
            .map_err(|e| Error::Http(format!("Failed to build request: {}", e)))?;

        let timeout = Duration::from_millis(self.timeout_ms);
        tokio::time::timeout(timeout, self.exchange(req))
            .await
            .map_err(|_| Error::Timeout(self.timeout_ms))?
    }

    async fn exchange(&self, req: Request<Full<Bytes>>) -> Result<RawResponse> {
        let response = self
            .http_client
            .request(req)
            .await
            .map_err(|e| Error::Connection(format!("Request failed: {}", e)))?;

        let (head, body) = response.into_parts();
        let body = read_body_to_bytes(body).await?;
        debug!("Received response: {} ({} bytes)", head.status, body.len());

        Ok(RawResponse {
            status: head.status,
            headers: head.headers,
            body,
        })
    }
}

/// Read response body to bytes
async fn read_body_to_bytes(body: Incoming) -> Result<Bytes> {
    body.collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))
}
