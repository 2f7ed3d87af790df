//! An HTTP client for the SimpleVOC key-value store
//!
//! SimpleVOC exposes a small REST interface: a version endpoint, prefix key
//! lookups, and values whose metadata (creation time, expiration, flags and
//! extended attributes) travel in `x-voc-*` headers. This crate maps typed
//! requests onto that interface and classifies failures into [`Error`].
//!
//! Every operation comes in two forms with identical semantics:
//! [`Connection`] is async (tokio), [`blocking::Connection`] blocks the
//! calling thread.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use simplevoc_client::{Connection, VocValue};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), simplevoc_client::Error> {
//!     let conn = Connection::localhost(8008)?;
//!     println!("SimpleVOC {}", conn.version().await?);
//!
//!     // Store a value
//!     let value = VocValue::new("user:123")
//!         .with_data(r#"{"name":"John"}"#)
//!         .with_flags(7)
//!         .with_attribute("owner", "john");
//!     conn.set(&value).await?;
//!
//!     // Retrieve it
//!     let stored = conn.get("user:123").await?;
//!     println!("Retrieved: {:?}", stored.data);
//!
//!     // Prefix lookup; no match is an empty list
//!     let keys = conn.get_keys("user:", None).await?;
//!     println!("{} user keys", keys.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs, rust_2018_idioms)]

pub mod blocking;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod translator;
mod transport;
pub mod types;

pub use config::ClientConfig;
pub use connection::Connection;
pub use error::{Error, Result};
pub use types::VocValue;
