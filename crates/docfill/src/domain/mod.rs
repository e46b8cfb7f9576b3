//! Core domain types shared by the registry, merge engine, and UI.

pub mod errors;
pub mod model;
