//! Application layer orchestrating domain logic and infrastructure.

pub mod fill;
pub mod merge;
pub mod registry;
pub mod save;
pub mod state;
