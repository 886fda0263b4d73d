//! Delivery of the consolidated custody report.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - SMTP email notifier with file attachments
//! - Minijinja rendering of the subject and body templates
//! - Dispatcher that sends one notification to every configured channel

pub mod dispatcher;
pub mod email;
pub mod templating;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use email::EmailNotifier;
pub use templating::{AlertTemplateContext, TemplateRenderer};
pub use traits::{Attachment, DispatchResult, Notification, Notifier, NotifyError};
