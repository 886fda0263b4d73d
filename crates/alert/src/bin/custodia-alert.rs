//! custodia-alert: one scheduled custody alert run.
//!
//! Loads the custody table, emails the consolidated report of vehicles over
//! the threshold, and exits non-zero naming the failed step on any error.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use tracing::{error, info};

use custodia_alert::{email_dispatcher, run, PipelineError, RunOutcome};
use custodia_core::config::load_dotenv;
use custodia_core::{Config, Threshold};
use custodia_notify::Dispatcher;

/// Email the consolidated report of vehicles held past the custody threshold.
#[derive(Parser, Debug)]
#[command(name = "custodia-alert", version, about)]
struct Cli {
    /// Source CSV (overrides DATA_FILE).
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Alert threshold in days (overrides ALERT_THRESHOLD_DAYS).
    #[arg(long)]
    threshold: Option<u32>,

    /// Reference date for custody days, YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Build and save the report without sending it.
    #[arg(long, env = "ALERT_DRY_RUN")]
    dry_run: bool,
}

async fn execute(cli: Cli) -> Result<RunOutcome, PipelineError> {
    let mut config = Config::from_env()?;
    if let Some(path) = cli.data_file {
        config.source.data_file = path;
    }
    if let Some(days) = cli.threshold {
        config.alert.threshold = Threshold::new(days)?;
    }
    config.log_summary();

    let as_of = cli
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());
    info!(%as_of, dry_run = cli.dry_run, "starting alert run");

    let dispatcher = if cli.dry_run {
        Dispatcher::empty()
    } else {
        email_dispatcher(&config)?
    };

    run(&config, as_of, &dispatcher, cli.dry_run).await
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

    match execute(cli).await {
        Ok(RunOutcome::NoAlerts { records }) => {
            info!(records, "run finished: no alerts");
        }
        Ok(RunOutcome::DryRun(report)) => {
            info!(
                path = %report.artifact.display(),
                alerts = report.alert_count,
                sheets = report.sheets.len(),
                "run finished: dry run"
            );
        }
        Ok(RunOutcome::Delivered { report, recipients }) => {
            info!(
                recipients = %recipients.join(", "),
                alerts = report.alert_count,
                sheets = report.sheets.len(),
                "run finished: report delivered"
            );
        }
        Err(e) => {
            error!(step = e.step(), error = %e, "alert run failed");
            return Err(anyhow::Error::new(e).context("alert run failed"));
        }
    }
    Ok(())
}
