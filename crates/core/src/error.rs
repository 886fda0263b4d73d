use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("alert threshold must be greater than zero")]
    InvalidThreshold,

    #[error("at least one date format is required")]
    NoDateFormats,

    #[error("SMTP server is not configured (set SMTP_SERVER)")]
    MissingSmtpHost,

    #[error("sender address is not configured (set EMAIL_FROM or EMAIL_USER)")]
    MissingSender,

    #[error("no alert recipients configured (set ALERT_RECIPIENTS)")]
    MissingRecipients,

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}
