//! Signal detection, confirmation and freshness.

pub mod confirmation;
pub mod detector;
pub mod freshness;

pub use confirmation::*;
pub use detector::*;
pub use freshness::*;
