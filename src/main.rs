//! Mini Cache - soak driver
//!
//! Runs a cache with its expiry reaper and keeps writing short-lived keys,
//! logging statistics every second until interrupted.

use std::time::Duration;

use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{ByteSize, Cache, Config};

/// Main entry point for the soak driver.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the cache and start its expiry reaper
/// 4. Write a batch of keys every second and log statistics
/// 5. Stop the reaper on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mini Cache soak driver");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_memory={}, reaper_interval={:?}, sample_divisor={}, default_ttl={:?}, writes_per_tick={}",
        ByteSize(config.max_memory),
        config.reaper_interval,
        config.sample_divisor,
        config.default_ttl,
        config.writes_per_tick
    );

    let cache: Cache<String> = Cache::with_config(&config);
    cache.start_reaper()?;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    let mut written: u64 = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let mut rejected = 0;
                for _ in 0..config.writes_per_tick {
                    let key = format!("soak:{}", written);
                    let value = format!("payload-{}", written);
                    written += 1;
                    if cache.set(key, value, config.default_ttl).is_err() {
                        rejected += 1;
                    }
                }

                if rejected > 0 {
                    warn!("{} of {} writes rejected by the memory budget", rejected, config.writes_per_tick);
                }
                info!("Stats: {}", serde_json::to_string(&cache.stats())?);
            }
        }
    }

    cache.stop_reaper().await;
    info!(
        "Soak driver shutdown complete: {} keys written, {} still live",
        written,
        cache.keys()
    );

    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
