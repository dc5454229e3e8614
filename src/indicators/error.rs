use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("insufficient data: need at least {required} values, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("malformed candle at index {index}: {reason}")]
    MalformedCandle { index: usize, reason: String },

    #[error("BUY and SELL both fired at index {index}")]
    ConflictingSignals { index: usize },
}

impl IndicatorError {
    pub(crate) fn require(required: usize, actual: usize) -> Result<(), IndicatorError> {
        if actual < required {
            Err(IndicatorError::InsufficientData { required, actual })
        } else {
            Ok(())
        }
    }
}
