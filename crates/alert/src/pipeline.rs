use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use custodia_core::{Config, GroupKey};
use custodia_ingest::CsvImporter;
use custodia_notify::{
    AlertTemplateContext, Attachment, Dispatcher, EmailNotifier, Notification, NotifyError,
    TemplateRenderer,
};
use custodia_report::{
    build_grouped, group_by, project, SheetSummary, DEFAULT_ALERT_COLUMNS, XLSX_CONTENT_TYPE,
};

use crate::error::PipelineError;

/// What a built report looked like.
#[derive(Debug, Clone)]
pub struct ReportSummary {
    /// On-disk copy written before any delivery attempt.
    pub artifact: PathBuf,
    pub alert_count: usize,
    pub sheets: Vec<SheetSummary>,
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Nothing exceeded the threshold; no artifact, no email.
    NoAlerts { records: usize },
    /// Report built and saved, delivery skipped.
    DryRun(ReportSummary),
    Delivered {
        report: ReportSummary,
        recipients: Vec<String>,
    },
}

/// Dispatcher with the SMTP channel built from configuration.
pub fn email_dispatcher(config: &Config) -> Result<Dispatcher, PipelineError> {
    config.validate_delivery()?;
    let email = EmailNotifier::from_config(&config.smtp, &config.alert.recipients).map_err(
        |e| match e {
            NotifyError::Config(msg) => PipelineError::Config(msg),
            other => PipelineError::Config(other.to_string()),
        },
    )?;
    Ok(Dispatcher::new(vec![Box::new(email)]))
}

/// Run one alert pass for `as_of`.
///
/// Every step is awaited in order; the first failure aborts the run. A
/// delivery failure still leaves the saved report in place.
pub async fn run(
    config: &Config,
    as_of: NaiveDate,
    dispatcher: &Dispatcher,
    dry_run: bool,
) -> Result<RunOutcome, PipelineError> {
    validate_templates(config)?;
    let threshold = config.alert.threshold;

    let set = CsvImporter::import(&config.source.data_file, &config.source, as_of)?;
    let alerts = custodia_rules::classify(set.records(), threshold);
    info!(
        records = set.len(),
        alerts = alerts.len(),
        threshold = threshold.days(),
        "custody records classified"
    );

    if alerts.is_empty() {
        info!(threshold = threshold.days(), "no alerts: no vehicle exceeds the custody threshold");
        return Ok(RunOutcome::NoAlerts { records: set.len() });
    }

    let groups = group_by(alerts.iter().copied(), GroupKey::ResponsibleParty);
    let columns = project(&DEFAULT_ALERT_COLUMNS, &set);
    let report = build_grouped(&groups, &columns, &config.source.schema)?;

    let artifact = config.alert.artifact_path(as_of);
    persist(&artifact, &report.bytes).await?;
    info!(path = %artifact.display(), sheets = report.sheets.len(), "report saved");

    let summary = ReportSummary {
        artifact,
        alert_count: alerts.len(),
        sheets: report.sheets,
    };

    let notification = render_notification(config, as_of, &summary, report.bytes)?;

    if dry_run {
        info!(subject = %notification.subject, "dry run: delivery skipped");
        return Ok(RunOutcome::DryRun(summary));
    }

    if dispatcher.is_empty() {
        return Err(PipelineError::Config(
            "no delivery channel configured".to_string(),
        ));
    }

    let results = dispatcher.dispatch(&notification).await;
    let failures: Vec<String> = results
        .iter()
        .filter(|r| !r.success)
        .map(|r| format!("{}: {}", r.channel, r.error.as_deref().unwrap_or("unknown error")))
        .collect();
    if !failures.is_empty() {
        warn!(path = %summary.artifact.display(), "delivery failed; report kept on disk");
        return Err(PipelineError::Transport {
            artifact: summary.artifact,
            reason: failures.join("; "),
        });
    }

    let recipients = config.alert.recipients.clone();
    info!(
        recipients = %recipients.join(", "),
        alerts = summary.alert_count,
        "consolidated report sent"
    );
    Ok(RunOutcome::Delivered {
        report: summary,
        recipients,
    })
}

/// Template syntax errors surface before anything is loaded or written.
fn validate_templates(config: &Config) -> Result<(), PipelineError> {
    let renderer = TemplateRenderer::new();
    for template in [&config.alert.subject_template, &config.alert.body_template] {
        renderer.validate(template).map_err(PipelineError::Template)?;
    }
    Ok(())
}

async fn persist(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    let io_err = |source: std::io::Error| PipelineError::Persist {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(io_err)?;
    }
    tokio::fs::write(path, bytes).await.map_err(io_err)
}

fn render_notification(
    config: &Config,
    as_of: NaiveDate,
    summary: &ReportSummary,
    bytes: Vec<u8>,
) -> Result<Notification, PipelineError> {
    let ctx = AlertTemplateContext {
        threshold: config.alert.threshold.days(),
        date: as_of.format("%Y-%m-%d").to_string(),
        alert_count: summary.alert_count,
        sheet_count: summary.sheets.len(),
        attachment: config.alert.attachment_name.clone(),
    };
    let renderer = TemplateRenderer::new();
    let subject = renderer
        .render(&config.alert.subject_template, &ctx)
        .map_err(PipelineError::Template)?;
    let body = renderer
        .render(&config.alert.body_template, &ctx)
        .map_err(PipelineError::Template)?;

    Ok(Notification {
        subject,
        body,
        attachments: vec![Attachment {
            filename: config.alert.attachment_name.clone(),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            bytes,
        }],
        metadata: HashMap::from([
            ("threshold".to_string(), ctx.threshold.to_string()),
            ("alert_count".to_string(), ctx.alert_count.to_string()),
            ("artifact".to_string(), summary.artifact.display().to_string()),
        ]),
    })
}
