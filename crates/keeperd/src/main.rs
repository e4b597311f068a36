//! keeperd — the Keeper registry daemon.
//!
//! Single binary that assembles:
//! - Registration store (redb)
//! - Registry + per-registration health probing
//! - REST API
//!
//! # Usage
//!
//! ```text
//! keeperd run --config /etc/keeper/keeper.toml --port 59890 --data-dir /var/lib/keeper
//! keeperd print-config
//! ```

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use keeper_core::KeeperConfig;
use keeper_health::NetworkProber;
use keeper_registry::{Registry, RegistrySettings};
use keeper_state::StateStore;

#[derive(Parser)]
#[command(name = "keeperd", about = "Keeper service registry daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the registry.
    Run {
        /// Path to keeper.toml. Defaults apply when the file is absent.
        #[arg(long, default_value = "keeper.toml")]
        config: PathBuf,

        /// Port to listen on (overrides `service.port`).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state (overrides `storage.data_dir`).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print the effective default configuration as TOML.
    PrintConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            port,
            data_dir,
        } => {
            let mut config = KeeperConfig::load_or_default(&config)
                .with_context(|| format!("loading {}", config.display()))?;
            if let Some(port) = port {
                config.service.port = port;
            }
            if let Some(dir) = data_dir {
                config.storage.data_dir = dir;
            }
            config.validate()?;
            init_tracing(&config);
            run(config).await
        }
        Command::PrintConfig => {
            print!("{}", KeeperConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(config: &KeeperConfig) {
    let default_filter = format!("{},keeperd=debug,keeper_registry=debug", config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

async fn run(config: KeeperConfig) -> anyhow::Result<()> {
    info!("keeper daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&config.storage.data_dir)?;
    let db_path = config.database_path();

    // ── Initialize subsystems ──────────────────────────────────

    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    let probe_timeout = config.health.probe_timeout()?;
    let prober = NetworkProber::new(probe_timeout);

    let registry = Arc::new(Registry::new(
        Arc::new(store),
        Arc::new(prober),
        RegistrySettings::from_config(&config)?,
    ));
    let restored = registry.restore().await?;
    info!(restored, ?probe_timeout, "registry initialized");

    // ── Start API server ───────────────────────────────────────

    let router = keeper_api::build_router(registry.clone(), config.service.max_result_count);
    let host: IpAddr = config
        .service
        .host
        .parse()
        .with_context(|| format!("invalid service.host {:?}", config.service.host))?;
    let addr = SocketAddr::new(host, config.service.port);

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("shutdown signal received");
        })
        .await?;

    // Stop probing; registrations stay persisted for the next start.
    registry.shutdown().await;

    info!("keeper daemon stopped");
    Ok(())
}
