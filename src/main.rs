//! request-shield demo host
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                REQUEST SHIELD                 │
//!     Client Request    │  ┌───────┐   ┌───────────┐   ┌─────────────┐  │
//!     ──────────────────┼─▶│ audit │──▶│ admission │──▶│session guard│──┼──▶ handler
//!                       │  └───┬───┘   └─────┬─────┘   └──────┬──────┘  │
//!                       │      │ record      │ deny           │ mismatch│
//!                       │      ▼             ▼                ▼         │
//!                       │  ┌────────┐   ┌──────────────────────────┐    │
//!                       │  │  SIEM  │   │   webhook queue + retry  │    │
//!                       │  └────────┘   └──────────────────────────┘    │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use request_shield::admin::{setup_admin_router, AdminState};
use request_shield::config::{load_config, ShieldConfig};
use request_shield::lifecycle::forward_signals;
use request_shield::observability::{init_logging, metrics};
use request_shield::{HttpServer, Shield, Shutdown};

#[derive(Parser)]
#[command(name = "request-shield")]
#[command(about = "Demo host protected by the request shield", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ShieldConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "request-shield starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Shutdown::new();
    tokio::spawn(forward_signals(shutdown.clone()));

    let shield = Shield::from_config(&config, &shutdown)?;

    if config.admin.enabled {
        if config.admin.api_key == "CHANGE_ME_IN_PRODUCTION" {
            tracing::warn!("Admin API is using the placeholder API key");
        }
        let admin_listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
        let router = setup_admin_router(AdminState::new(shield.clone(), &config.admin.api_key));
        let admin_shutdown = shutdown.clone();
        tokio::spawn(async move {
            let served = axum::serve(admin_listener, router)
                .with_graceful_shutdown(async move { admin_shutdown.wait().await })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    HttpServer::new(shield.clone(), &config, shutdown).run(listener).await?;

    shield.stop_watching();
    tracing::info!("Shutdown complete");
    Ok(())
}
