//! Basic usage example for the SimpleVOC client
//!
//! Run with: SIMPLEVOC_ENDPOINT=http://localhost:8008 cargo run --example basic_usage

use chrono::{Duration, Utc};
use simplevoc_client::{ClientConfig, Connection, Error, VocValue};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ClientConfig::from_env();
    info!("Connecting to {}", config.endpoint);
    let conn = Connection::with_config(config)?;

    info!("Server version: {}", conn.version().await?);

    info!("Flushing store...");
    conn.flush().await?;

    // Store a value with metadata
    let value = VocValue::new("example:hello")
        .with_data("Hello, SimpleVOC!")
        .with_flags(1)
        .with_expires(Utc::now() + Duration::hours(1))
        .with_attribute("lang", "en");
    info!("Storing key '{}'...", value.key);
    conn.set(&value).await?;

    // Storing it again fails: set never overwrites
    match conn.set(&value).await {
        Err(Error::Store { message, .. }) => info!("Second set rejected: {}", message),
        other => info!("Unexpected second set result: {:?}", other),
    }

    // Retrieve the value
    let stored = conn.get("example:hello").await?;
    info!("Retrieved: {:?}", stored.data);
    info!("Created: {:?}, expires: {:?}", stored.created, stored.expires);
    info!("Flags: {}, extended: {:?}", stored.flags, stored.extended);

    // Prefix lookups
    for prefix in ["example:", "missing:"] {
        let keys = conn.get_keys(prefix, None).await?;
        info!("Keys under '{}': {:?}", prefix, keys);
    }

    info!("Example completed successfully!");
    Ok(())
}
