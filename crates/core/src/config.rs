use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::Field;
use crate::schema::SourceSchema;
use crate::threshold::Threshold;

pub const DEFAULT_SUBJECT_TEMPLATE: &str =
    "[Reporte Consolidado] Vehículos > {{ threshold }} días - {{ date }}";

pub const DEFAULT_BODY_TEMPLATE: &str = "Se generó el reporte consolidado de vehículos con más de {{ threshold }} días en custodia.\n\n\
Cada pestaña en el Excel corresponde a un responsable.\n\n\
Atentamente,\nSistema de Alertas Automáticas";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key) {
        Some(v) => matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        None => default,
    }
}

/// Split a delimited env value, dropping blank entries.
fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub source: SourceConfig,
    pub alert: AlertConfig,
    pub smtp: SmtpConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CUSTODIA_PROFILE` env var. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let profile = env_or("CUSTODIA_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self, ConfigError> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let config = Self {
            profile: p.to_string(),
            source: SourceConfig::from_env_profiled(p),
            alert: AlertConfig::from_env_profiled(p)?,
            smtp: SmtpConfig::from_env_profiled(p),
            server: ServerConfig::from_env_profiled(p),
        };
        config.source.validate()?;
        Ok(config)
    }

    /// Everything an email dispatch needs: host, sender and recipients.
    pub fn validate_delivery(&self) -> Result<(), ConfigError> {
        if self.smtp.host.as_deref().map_or(true, |h| h.trim().is_empty()) {
            return Err(ConfigError::MissingSmtpHost);
        }
        if self.smtp.sender().is_none() {
            return Err(ConfigError::MissingSender);
        }
        if self.alert.recipients.is_empty() {
            return Err(ConfigError::MissingRecipients);
        }
        Ok(())
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  source:  file={}, delimiter={:?}, date_formats={:?}",
            self.source.data_file.display(),
            self.source.delimiter as char,
            self.source.date_formats
        );
        tracing::info!(
            "  alert:   threshold={}d, recipients={}, report_dir={}",
            self.alert.threshold,
            self.alert.recipients.len(),
            self.alert.report_dir.display()
        );
        tracing::info!(
            "  smtp:    host={}, port={}, user={}, password={}",
            self.smtp.host.as_deref().unwrap_or("(none)"),
            self.smtp.port,
            self.smtp.username.as_deref().unwrap_or("(none)"),
            if self.smtp.password.is_some() { "set" } else { "(none)" }
        );
        tracing::info!("  server:  {}:{}", self.server.host, self.server.port);
    }
}

// ── Source file ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub data_file: PathBuf,
    pub delimiter: u8,
    /// chrono patterns tried in order; no format guessing beyond this list.
    pub date_formats: Vec<String>,
    pub schema: SourceSchema,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data/VEHICULOS EN PATIO.csv"),
            delimiter: b',',
            date_formats: vec!["%d/%m/%Y".to_string()],
            schema: SourceSchema::default(),
        }
    }
}

impl SourceConfig {
    fn from_env_profiled(p: &str) -> Self {
        let defaults = Self::default();

        let mut schema = SourceSchema::default();
        for field in Field::ALL {
            let key = format!("COLUMN_{}", field.as_str().to_uppercase());
            if let Some(header) = profiled_env_opt(p, &key) {
                schema = schema.with_header(field, header);
            }
        }

        Self {
            data_file: profiled_env_opt(p, "DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            delimiter: profiled_env_opt(p, "CSV_DELIMITER")
                .and_then(|v| parse_delimiter(&v))
                .unwrap_or(defaults.delimiter),
            date_formats: profiled_env_opt(p, "DATE_FORMATS")
                .map(|v| split_list(&v, '|'))
                .unwrap_or(defaults.date_formats),
            schema,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.date_formats.is_empty() {
            return Err(ConfigError::NoDateFormats);
        }
        Ok(())
    }
}

/// Accepts a single ASCII character, or `tab` / `\t`.
fn parse_delimiter(value: &str) -> Option<u8> {
    match value {
        "\\t" | "tab" | "\t" => Some(b'\t'),
        v if v.len() == 1 && v.is_ascii() => v.bytes().next(),
        _ => None,
    }
}

// ── Alert pipeline ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    pub threshold: Threshold,
    pub recipients: Vec<String>,
    /// Generated artifacts are kept here so failed dispatches can be retried.
    pub report_dir: PathBuf,
    pub attachment_name: String,
    pub subject_template: String,
    pub body_template: String,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            threshold: Threshold::default(),
            recipients: Vec::new(),
            report_dir: PathBuf::from("reports"),
            attachment_name: "reporte_consolidado.xlsx".to_string(),
            subject_template: DEFAULT_SUBJECT_TEMPLATE.to_string(),
            body_template: DEFAULT_BODY_TEMPLATE.to_string(),
        }
    }
}

impl AlertConfig {
    /// Dated on-disk copy of the report: `<report_dir>/<stem>_<YYYY-MM-DD>.xlsx`.
    pub fn artifact_path(&self, as_of: NaiveDate) -> PathBuf {
        let stem = Path::new(&self.attachment_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .unwrap_or("reporte_consolidado");
        self.report_dir
            .join(format!("{stem}_{}.xlsx", as_of.format("%Y-%m-%d")))
    }

    fn from_env_profiled(p: &str) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let threshold = match profiled_env_opt(p, "ALERT_THRESHOLD_DAYS") {
            Some(raw) => {
                let days: u32 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "ALERT_THRESHOLD_DAYS".to_string(),
                    reason: format!("'{raw}' is not a whole number of days"),
                })?;
                Threshold::new(days)?
            }
            None => defaults.threshold,
        };

        Ok(Self {
            threshold,
            recipients: profiled_env_opt(p, "ALERT_RECIPIENTS")
                .map(|v| split_list(&v, ','))
                .unwrap_or_default(),
            report_dir: PathBuf::from(profiled_env_or(p, "REPORT_DIR", "reports")),
            attachment_name: profiled_env_or(p, "REPORT_ATTACHMENT_NAME", &defaults.attachment_name),
            subject_template: profiled_env_or(p, "ALERT_SUBJECT_TEMPLATE", DEFAULT_SUBJECT_TEMPLATE),
            body_template: profiled_env_or(p, "ALERT_BODY_TEMPLATE", DEFAULT_BODY_TEMPLATE),
        })
    }
}

// ── SMTP ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    /// Sender address; falls back to the username.
    pub from: Option<String>,
    /// STARTTLS on anything but port 465 (which always uses implicit TLS).
    pub tls: bool,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            username: None,
            password: None,
            from: None,
            tls: true,
        }
    }
}

impl SmtpConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_opt(p, "SMTP_SERVER"),
            // An unparsable port falls back to the submission port.
            port: profiled_env_u16(p, "SMTP_PORT", 587),
            username: profiled_env_opt(p, "EMAIL_USER"),
            password: profiled_env_opt(p, "EMAIL_PASS"),
            from: profiled_env_opt(p, "EMAIL_FROM"),
            tls: profiled_env_bool(p, "SMTP_TLS", true),
        }
    }

    pub fn sender(&self) -> Option<&str> {
        self.from.as_deref().or(self.username.as_deref())
    }
}

// ── Reporting server ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 8501),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-driven tests use a profile prefix unique to each test so they
    // don't race with each other.

    #[test]
    fn profiled_keys_take_precedence() {
        env::set_var("CFGTEST_A_ALERT_THRESHOLD_DAYS", "90");
        env::set_var("CFGTEST_A_ALERT_RECIPIENTS", "a@example.com, b@example.com,,");
        env::set_var("CFGTEST_A_DATE_FORMATS", "%d/%m/%Y|%d/%m/%Y %H:%M");
        env::set_var("CFGTEST_A_COLUMN_RESPONSIBLE_PARTY", "NOMBRE RESP");

        let config = Config::for_profile("cfgtest_a").unwrap();
        assert_eq!(config.profile_label(), "CFGTEST_A");
        assert_eq!(config.alert.threshold.days(), 90);
        assert_eq!(config.alert.recipients, vec!["a@example.com", "b@example.com"]);
        assert_eq!(config.source.date_formats, vec!["%d/%m/%Y", "%d/%m/%Y %H:%M"]);
        assert_eq!(config.source.schema.header(Field::ResponsibleParty), "NOMBRE RESP");

        env::remove_var("CFGTEST_A_ALERT_THRESHOLD_DAYS");
        env::remove_var("CFGTEST_A_ALERT_RECIPIENTS");
        env::remove_var("CFGTEST_A_DATE_FORMATS");
        env::remove_var("CFGTEST_A_COLUMN_RESPONSIBLE_PARTY");
    }

    #[test]
    fn zero_threshold_is_a_config_error() {
        env::set_var("CFGTEST_B_ALERT_THRESHOLD_DAYS", "0");
        let err = Config::for_profile("CFGTEST_B").unwrap_err();
        assert_eq!(err, ConfigError::InvalidThreshold);
        env::remove_var("CFGTEST_B_ALERT_THRESHOLD_DAYS");
    }

    #[test]
    fn non_numeric_threshold_names_the_key() {
        env::set_var("CFGTEST_C_ALERT_THRESHOLD_DAYS", "six months");
        let err = Config::for_profile("CFGTEST_C").unwrap_err();
        assert!(err.to_string().contains("ALERT_THRESHOLD_DAYS"), "got: {err}");
        env::remove_var("CFGTEST_C_ALERT_THRESHOLD_DAYS");
    }

    #[test]
    fn bad_smtp_port_falls_back_to_587() {
        env::set_var("CFGTEST_D_SMTP_PORT", "not-a-port");
        let smtp = SmtpConfig::from_env_profiled("CFGTEST_D");
        assert_eq!(smtp.port, 587);
        env::remove_var("CFGTEST_D_SMTP_PORT");
    }

    #[test]
    fn sender_falls_back_to_username() {
        let smtp = SmtpConfig {
            username: Some("alerts@fiscalia.gov.co".to_string()),
            ..SmtpConfig::default()
        };
        assert_eq!(smtp.sender(), Some("alerts@fiscalia.gov.co"));
    }

    #[test]
    fn delimiter_parsing() {
        assert_eq!(parse_delimiter(";"), Some(b';'));
        assert_eq!(parse_delimiter("tab"), Some(b'\t'));
        assert_eq!(parse_delimiter("||"), None);
        assert_eq!(parse_delimiter("ñ"), None);
    }

    #[test]
    fn empty_date_formats_rejected() {
        let source = SourceConfig {
            date_formats: Vec::new(),
            ..SourceConfig::default()
        };
        assert_eq!(source.validate(), Err(ConfigError::NoDateFormats));
    }

    #[test]
    fn delivery_requires_host_sender_and_recipients() {
        let mut config = Config {
            profile: String::new(),
            source: SourceConfig::default(),
            alert: AlertConfig::default(),
            smtp: SmtpConfig::default(),
            server: ServerConfig::from_env_profiled("CFGTEST_E"),
        };
        assert_eq!(config.validate_delivery(), Err(ConfigError::MissingSmtpHost));
        config.smtp.host = Some("smtp.gmail.com".to_string());
        assert_eq!(config.validate_delivery(), Err(ConfigError::MissingSender));
        config.smtp.username = Some("alertas@example.com".to_string());
        assert_eq!(config.validate_delivery(), Err(ConfigError::MissingRecipients));
        config.alert.recipients = vec!["jefe@example.com".to_string()];
        assert_eq!(config.validate_delivery(), Ok(()));
    }

    #[test]
    fn artifact_path_is_dated() {
        let alert = AlertConfig::default();
        let date = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();
        assert_eq!(
            alert.artifact_path(date),
            PathBuf::from("reports/reporte_consolidado_2024-07-19.xlsx")
        );
    }

    #[test]
    fn password_is_not_serialized() {
        let smtp = SmtpConfig {
            password: Some("hunter2".to_string()),
            ..SmtpConfig::default()
        };
        let json = serde_json::to_string(&smtp).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
