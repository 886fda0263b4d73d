//! Sends one notification to every configured channel.
//!
//! Individual channel failures don't block other channels; callers decide
//! what a failed result means.

use crate::traits::{DispatchResult, Notification, Notifier};

pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Deliver to all channels in order, one result per channel.
    pub async fn dispatch(&self, notification: &Notification) -> Vec<DispatchResult> {
        if self.channels.is_empty() {
            tracing::debug!("no notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let start = std::time::Instant::now();
            let result = channel.send(notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => {
                    tracing::info!(
                        channel = channel.channel_name(),
                        duration_ms,
                        "notification delivered"
                    );
                    (true, None)
                }
                Err(e) => {
                    tracing::warn!(
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}
