//! Persisting merged documents and suggesting output names.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{Environment, context};
use tempfile::NamedTempFile;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::domain::errors::FillError;
use crate::domain::model::{FieldValues, TemplateDefinition};
use crate::infra::docx::{DOCX_EXTENSION, Document};

const FILE_NAME_TEMPLATE: &str = "file_name";

/// Normalize a caller-chosen destination to a `.docx` path.
///
/// A missing extension is filled in; any other extension is rejected.
pub fn resolve_destination(destination: &Path) -> Result<PathBuf, FillError> {
    let invalid = |reason: &str| FillError::InvalidDestination {
        path: destination.to_path_buf(),
        reason: reason.to_string(),
    };

    if destination.as_os_str().is_empty() {
        return Err(invalid("no destination given"));
    }
    if destination.is_dir() {
        return Err(invalid("destination is a directory"));
    }
    if destination.file_name().is_none() {
        return Err(invalid("destination has no file name"));
    }

    match destination.extension().and_then(|ext| ext.to_str()) {
        None => Ok(destination.with_extension(DOCX_EXTENSION)),
        Some(ext) if ext.eq_ignore_ascii_case(DOCX_EXTENSION) => Ok(destination.to_path_buf()),
        Some(ext) => Err(invalid(&format!(
            "expected a .{DOCX_EXTENSION} file, not .{ext}"
        ))),
    }
}

/// Write `document` to `destination`, returning the path actually written.
///
/// The file is staged next to the destination and moved into place, so a
/// failed save never leaves a partial document behind.
pub fn save(document: &Document, destination: &Path) -> Result<PathBuf, FillError> {
    let path = resolve_destination(destination)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)
        .map_err(|err| FillError::io(format!("create directory {}", parent.display()), err))?;

    let mut staged = NamedTempFile::new_in(&parent)
        .map_err(|err| FillError::io(format!("create file in {}", parent.display()), err))?;
    document.write_to(staged.as_file_mut(), &path)?;
    staged
        .persist(&path)
        .map_err(|err| FillError::io(format!("write {}", path.display()), err.error))?;

    tracing::info!(path = %path.display(), "saved document");
    Ok(path)
}

/// Renders default output file names from a configurable pattern.
///
/// The pattern sees `name` (the designated name field's value), `template`,
/// `date` (`YYYY-MM-DD`), and every field value under `fields`.
#[derive(Debug)]
pub struct FileNamer {
    env: Environment<'static>,
    name_field: String,
}

impl FileNamer {
    pub fn new(pattern: &str, name_field: impl Into<String>) -> Result<Self, FillError> {
        let mut env = Environment::new();
        env.add_template_owned(FILE_NAME_TEMPLATE, pattern.to_string())
            .map_err(|err| FillError::Configuration {
                path: PathBuf::from("[output] file_name"),
                reason: err.to_string(),
            })?;
        Ok(Self {
            env,
            name_field: name_field.into(),
        })
    }

    /// Suggested file name, extension included.
    pub fn suggest(&self, template: &TemplateDefinition, values: &FieldValues) -> String {
        let date = OffsetDateTime::now_utc()
            .format(format_description!("[year]-[month]-[day]"))
            .unwrap_or_default();
        let fields: BTreeMap<&str, &str> = values.iter().collect();
        let rendered = self
            .env
            .get_template(FILE_NAME_TEMPLATE)
            .and_then(|tmpl| {
                tmpl.render(context! {
                    name => values.get(&self.name_field).unwrap_or_default(),
                    template => template.name.as_str(),
                    date => date,
                    fields => fields,
                })
            })
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "file name pattern failed to render");
                String::new()
            });

        let stem = sanitize(&rendered);
        let stem = if stem.is_empty() {
            sanitize(&template.name)
        } else {
            stem
        };
        format!("{stem}.{DOCX_EXTENSION}")
    }
}

fn sanitize(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            ch if ch.is_control() => '_',
            ch => ch,
        })
        .collect();
    replaced
        .trim_matches(|ch: char| ch == '_' || ch.is_whitespace())
        .to_string()
}
