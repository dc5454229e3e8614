//! Core application primitives (scan orchestrator, scheduler)

pub mod scanner;
pub mod scheduler;

pub use scanner::*;
pub use scheduler::*;
