//! Repository layer — entity-scoped database operations.

mod audit;
mod patient;

pub use audit::*;
pub use patient::*;
