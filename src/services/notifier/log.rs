use async_trait::async_trait;
use tracing::info;

use super::{Notifier, NotifyError};
use crate::models::Alert;

/// Dry-run notifier: writes the alert to the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, alert: &Alert) -> Result<(), NotifyError> {
        let candidate = &alert.candidate;
        info!(
            symbol = %candidate.symbol,
            kind = %candidate.kind,
            timeframe = %candidate.timeframe,
            exchange = %candidate.source_exchange,
            wt1 = candidate.wt1,
            wt2 = candidate.wt2,
            confirmation = alert.confirmation.label(),
            confirmation_value = ?alert.confirmation.value(),
            candle = %candidate.candle_timestamp,
            "ALERT {} {} on {} ({})",
            candidate.kind,
            candidate.symbol,
            candidate.timeframe,
            candidate.source_exchange
        );
        Ok(())
    }
}
