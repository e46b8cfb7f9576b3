//! Infrastructure adapters for documents, configuration, and logging.

pub mod config;
pub mod docx;
pub mod logging;
