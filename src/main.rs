//! Roster fetch service.
//!
//! # Architecture Overview
//!
//! ```text
//!   operator / caller
//!        │  admin API (axum, bearer key)
//!        ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │ RosterService                                            │
//!   │   breaker ──▶ executor ──▶ [cache|index|partial|full]    │
//!   │                 │                      │                 │
//!   │                 ▼                      ▼                 │
//!   │             selector              directory (reqwest)    │
//!   │                 │                                        │
//!   │                 ▼                                        │
//!   │           cache layer ◀── warmers (background)           │
//!   └──────────────────────────────────────────────────────────┘
//!        │
//!        ▼
//!   memory store | redis
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use roster_fetch::admin::{setup_admin_router, AdminState};
use roster_fetch::config::{load_config, RosterConfig};
use roster_fetch::lifecycle::{build_service, shutdown_signal, start_configured_warmers};
use roster_fetch::observability::{logging::init_logging, metrics::init_metrics};

#[derive(Parser)]
#[command(name = "roster-fetch", version, about = "Resilient roster fetch service")]
struct Args {
    /// Path to the TOML config file. Defaults apply when omitted.
    #[arg(short, long, env = "ROSTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RosterConfig::default(),
    };

    init_logging(&config.observability);

    tracing::info!("roster-fetch v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        directory = %config.directory.base_url,
        cache_backend = ?config.cache.backend,
        warm_partitions = config.warmer.partitions.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let service = build_service(&config).await?;
    start_configured_warmers(&service, &config).await;

    if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let router = setup_admin_router(AdminState::new(service.clone(), &config.admin.api_key));
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    service.dispose().await;
    tracing::info!("Shutdown complete");
    Ok(())
}
