//! Outbound alert delivery.

pub mod log;
pub mod telegram;

pub use self::log::LogNotifier;
pub use self::telegram::TelegramNotifier;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Alert;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("notifier is not configured: {0}")]
    NotConfigured(String),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError>;

    /// Delivers every alert of one scan pass. Sends them one at a time
    /// unless the notifier has a consolidated format.
    async fn notify_batch(&self, alerts: &[Alert]) -> Result<(), NotifyError> {
        for alert in alerts {
            self.notify(alert).await?;
        }
        Ok(())
    }
}
