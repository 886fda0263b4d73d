mod api;
mod router;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;

use custodia_core::config::load_dotenv;
use custodia_core::Config;

use crate::router::build_router;
use crate::state::AppState;

/// Reporting API over the custody table.
#[derive(Parser, Debug)]
#[command(name = "custodia-server", version, about)]
struct Cli {
    /// Bind address (overrides HOST).
    #[arg(long)]
    host: Option<String>,

    /// Listen port (overrides PORT).
    #[arg(long)]
    port: Option<u16>,

    /// Source CSV (overrides DATA_FILE).
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Pin the reference date instead of following the calendar, YYYY-MM-DD.
    #[arg(long)]
    as_of: Option<NaiveDate>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(path) = cli.data_file {
        config.source.data_file = path;
    }
    config.log_summary();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, cli.as_of));

    // Warm the cache.
    let warm = state.clone();
    match tokio::task::spawn_blocking(move || warm.records()).await? {
        Ok(set) => info!(records = set.len(), as_of = %set.as_of(), "custody records ready"),
        Err(e) => tracing::warn!(error = %e, "custody records unavailable; API will report errors"),
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
