pub mod error;
pub mod heikin_ashi;
pub mod validation;

pub mod momentum;

pub use error::IndicatorError;
pub use heikin_ashi::*;
pub use validation::*;
