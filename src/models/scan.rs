use serde::{Deserialize, Serialize};

/// Counters reported at the end of one orchestration pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Symbols attempted, failures included.
    pub processed: usize,
    /// Fresh BUY/SELL candidates that reached the confirmation step.
    pub signals_found: usize,
    pub alerts_sent: usize,
    pub errors: usize,
}
