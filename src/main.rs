use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use belote_league::api::{build_router, state::AppState};
use belote_league::config::AppConfig;
use belote_league::service::LeagueService;
use belote_league::storage::{open_store, Snapshot, StorageBackend};

#[derive(Parser)]
#[command(name = "belote-league")]
#[command(about = "Belote league tracker: matches, rounds, player statistics and leaderboards")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: PathBuf,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Storage backend (overrides the config file)
    #[arg(long, value_enum, ignore_case = true)]
    storage: Option<StorageBackend>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print league KPIs as JSON
    Kpis,

    /// Dump every table to a JSON snapshot
    Export {
        /// Output file
        #[arg(long)]
        to: PathBuf,
    },

    /// Load a JSON snapshot, keeping record ids
    Import {
        /// Input file
        #[arg(long)]
        from: PathBuf,
    },
}

fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(backend) = cli.storage {
        config.storage = backend;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_tracing(&config.log_level, cli.json_logs);
    tracing::info!("Starting belote-league v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(config.storage, &config.storage_config())
        .with_context(|| format!("opening {:?} store in {}", config.storage, config.data_dir.display()))?;
    let service = LeagueService::new(store);

    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            config.validate()?;

            let addr = config.server.bind_addr();
            let app = build_router(AppState::with_server(service, config.server.clone()));
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("API: http://{}/api", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Kpis => {
            let board = service.leaderboard().await?;
            println!("{}", serde_json::to_string_pretty(&board)?);
        }
        Commands::Export { to } => {
            let snapshot = service.export().await?;
            std::fs::write(&to, serde_json::to_string_pretty(&snapshot)?)
                .with_context(|| format!("writing {}", to.display()))?;
            tracing::info!(
                "Exported players={} matches={} rounds={} to {}",
                snapshot.players.len(),
                snapshot.matches.len(),
                snapshot.rounds.len(),
                to.display()
            );
        }
        Commands::Import { from } => {
            let contents = std::fs::read_to_string(&from)
                .with_context(|| format!("reading {}", from.display()))?;
            let snapshot: Snapshot = serde_json::from_str(&contents)?;
            service.import(snapshot).await?;
        }
    }

    Ok(())
}
