//! Blocking connection to a SimpleVOC server
//!
//! Drives the async [`crate::Connection`] on a private current-thread
//! runtime, so validation, encoding, decoding and error classification are
//! exactly those of the async API. Do not call these methods from within an
//! async context; use the async connection there. Dropping a connection
//! inside an async context is fine: the private runtime is shut down without
//! blocking.

use std::sync::Arc;

use tokio::runtime::{Builder, Runtime};

use crate::config::ClientConfig;
use crate::connection;
use crate::error::Result;
use crate::types::VocValue;

/// Blocking connection to a SimpleVOC server
///
/// # Example
/// ```rust,no_run
/// use simplevoc_client::blocking::Connection;
/// use simplevoc_client::VocValue;
///
/// fn main() -> Result<(), simplevoc_client::Error> {
///     let conn = Connection::from_host_port("localhost", 8008)?;
///     conn.flush()?;
///     conn.set(&VocValue::new("TestKey").with_data("Test Data"))?;
///     println!("server {}", conn.version()?);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct Connection {
    inner: connection::Connection,
    runtime: Arc<OwnedRuntime>,
}

/// Runtime that shuts down in the background when dropped, so the last
/// connection clone may be dropped from within another runtime.
struct OwnedRuntime(Option<Runtime>);

impl OwnedRuntime {
    fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        match &self.0 {
            Some(runtime) => runtime.block_on(future),
            None => unreachable!("runtime is only taken on drop"),
        }
    }
}

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

impl Connection {
    /// Connect to the server at `endpoint` (e.g. `http://localhost:8008`)
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
        let inner = connection::Connection::with_config(config)?;
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            inner,
            runtime: Arc::new(OwnedRuntime(Some(runtime))),
        })
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    /// Server version, cached after the first call
    pub fn version(&self) -> Result<String> {
        self.runtime.block_on(self.inner.version())
    }

    /// Keys starting with `prefix`; no match yields an empty list
    pub fn get_keys(&self, prefix: &str, filter: Option<&str>) -> Result<Vec<String>> {
        self.runtime.block_on(self.inner.get_keys(prefix, filter))
    }

    /// Fetch the value stored under `key`
    pub fn get(&self, key: &str) -> Result<VocValue> {
        self.runtime.block_on(self.inner.get(key))
    }

    /// Store a new value; returns `true` on success
    pub fn set(&self, value: &VocValue) -> Result<bool> {
        self.runtime.block_on(self.inner.set(value))
    }

    /// Remove every record from the store
    pub fn flush(&self) -> Result<()> {
        self.runtime.block_on(self.inner.flush())
    }
}
