//! Domain-specific errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by registry loading, merging, and saving.
#[derive(Debug, Error)]
pub enum FillError {
    #[error("invalid configuration {}: {reason}", .path.display())]
    Configuration { path: PathBuf, reason: String },
    #[error("template file not found: {}", .0.display())]
    TemplateNotFound(PathBuf),
    #[error("please select a template")]
    MissingSelection,
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
    #[error("invalid document {}: {reason}", .path.display())]
    InvalidDocument { path: PathBuf, reason: String },
    #[error("unresolved placeholders: {}", .0.join(", "))]
    UnresolvedPlaceholders(Vec<String>),
    #[error("invalid destination {}: {reason}", .path.display())]
    InvalidDestination { path: PathBuf, reason: String },
    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl FillError {
    pub(crate) fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    pub(crate) fn invalid_document(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::InvalidDocument {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_input() {
        let err = FillError::TemplateNotFound(PathBuf::from("forms/invoice.docx"));
        assert_eq!(err.to_string(), "template file not found: forms/invoice.docx");

        let err = FillError::UnresolvedPlaceholders(vec!["Amount".into(), "Date".into()]);
        assert_eq!(err.to_string(), "unresolved placeholders: Amount, Date");

        let err = FillError::io(
            "write out.docx",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "failed to write out.docx: denied");
    }
}
