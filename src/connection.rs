//! Async connection to a SimpleVOC server

use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::codec::{self, RequestParts};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::transport::{RawResponse, Transport};
use crate::translator;
use crate::types::VocValue;

/// Async connection to a SimpleVOC server
///
/// Every operation is a single request/response exchange. Arguments are
/// validated before any I/O; server failures are surfaced as
/// [`Error::Store`] and never retried. Clones share the pooled HTTP client
/// and the cached server version.
///
/// # Example
/// ```rust,no_run
/// use simplevoc_client::{Connection, VocValue};
///
/// #[tokio::main]
/// async fn main() -> Result<(), simplevoc_client::Error> {
///     let conn = Connection::new("http://localhost:8008")?;
///
///     conn.set(&VocValue::new("greeting").with_data("hello")).await?;
///     let value = conn.get("greeting").await?;
///     println!("{:?} created at {:?}", value.data, value.created);
///
///     for key in conn.get_keys("gr", None).await? {
///         println!("{}", key);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Connection {
    transport: Transport,
    version: Arc<OnceLock<String>>,
}

impl Connection {
    /// Connect to the server at `endpoint` (e.g. `http://localhost:8008`)
    ///
    /// # Errors
    /// Returns [`Error::InvalidUrl`] if the endpoint is not `scheme://host[:port]`
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_config(ClientConfig {
            endpoint: endpoint.to_string(),
            ..Default::default()
        })
    }

    /// Connect to a plain-HTTP server at `host:port`
    pub fn from_host_port(host: &str, port: u16) -> Result<Self> {
        Self::with_config(ClientConfig::for_host(host, port))
    }

    /// Connect to a server on `localhost:port`
    pub fn localhost(port: u16) -> Result<Self> {
        Self::from_host_port("localhost", port)
    }

    /// Create a connection with custom configuration
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(&config)?,
            version: Arc::new(OnceLock::new()),
        })
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Send a request; non-success responses become errors via the translator
    async fn exchange(&self, parts: RequestParts) -> Result<RawResponse> {
        let response = self.transport.send(parts).await?;
        if response.status.is_success() {
            Ok(response)
        } else {
            Err(translator::translate(response.status, &response.body))
        }
    }

    /// Server version. Fetched on first use and cached for the lifetime of
    /// the connection.
    pub async fn version(&self) -> Result<String> {
        if let Some(version) = self.version.get() {
            return Ok(version.clone());
        }

        let response = self.exchange(codec::version_request()).await?;
        let fetched = codec::decode_version(&response.body)?;

        // Concurrent misses may both fetch; the first stored value wins.
        Ok(self.version.get_or_init(|| fetched).clone())
    }

    /// Keys starting with `prefix`, optionally narrowed by a server-side
    /// `filter` expression. No match yields an empty list, not an error.
    pub async fn get_keys(&self, prefix: &str, filter: Option<&str>) -> Result<Vec<String>> {
        require_non_empty(prefix, "Prefix")?;

        match self.exchange(codec::keys_request(prefix, filter)).await {
            Ok(response) => codec::decode_key_list(&response.body),
            Err(e) if e.is_prefix_not_found() => {
                debug!("No keys match prefix {:?}", prefix);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the value stored under `key`
    ///
    /// A missing key is an [`Error::Store`] carrying the server's message.
    pub async fn get(&self, key: &str) -> Result<VocValue> {
        require_non_empty(key, "Key")?;

        let response = self.exchange(codec::get_request(key)).await?;
        codec::decode_value(&response.headers, &response.body, key)
    }

    /// Store a new value. Fails with [`Error::Store`] if the key already
    /// exists. Returns `true` on success.
    pub async fn set(&self, value: &VocValue) -> Result<bool> {
        require_non_empty(&value.key, "Key")?;

        self.exchange(codec::set_request(value)?).await?;
        Ok(true)
    }

    /// Remove every record from the store
    pub async fn flush(&self) -> Result<()> {
        self.exchange(codec::flush_request()).await?;
        Ok(())
    }
}

fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidArgument(format!("{} can't be empty", what)));
    }
    Ok(())
}
