//! Template registry loading.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::domain::errors::FillError;
use crate::domain::model::TemplateDefinition;

/// Serialized shape of one registry entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct TemplateRecord {
    fields: Vec<String>,
    file: PathBuf,
}

/// Immutable collection of every known template, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    source: Option<PathBuf>,
    templates: BTreeMap<String, TemplateDefinition>,
}

/// Encoding of a registry resource, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryFormat {
    Json,
    Toml,
    Yaml,
}

impl RegistryFormat {
    /// Anything unrecognized is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("toml") => RegistryFormat::Toml,
            Some("yaml" | "yml") => RegistryFormat::Yaml,
            _ => RegistryFormat::Json,
        }
    }
}

impl Registry {
    /// Load the registry at `path`. Relative template files are resolved
    /// against the directory containing the registry.
    pub fn load(path: &Path) -> Result<Self, FillError> {
        let contents = fs::read_to_string(path).map_err(|err| FillError::Configuration {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let mut registry =
            Self::from_str(&contents, RegistryFormat::from_path(path), base).map_err(|err| {
                match err {
                    FillError::Configuration { reason, .. } => FillError::Configuration {
                        path: path.to_path_buf(),
                        reason,
                    },
                    other => other,
                }
            })?;
        registry.source = Some(path.to_path_buf());
        tracing::info!(
            path = %path.display(),
            templates = registry.len(),
            "loaded template registry"
        );
        Ok(registry)
    }

    /// Parse registry contents, resolving relative files against `base`.
    pub fn from_str(contents: &str, format: RegistryFormat, base: &Path) -> Result<Self, FillError> {
        let invalid = |reason: String| FillError::Configuration {
            path: PathBuf::new(),
            reason,
        };
        let records: BTreeMap<String, TemplateRecord> = match format {
            RegistryFormat::Json => {
                serde_json::from_str(contents).map_err(|err| invalid(err.to_string()))?
            }
            RegistryFormat::Toml => toml::from_str(contents).map_err(|err| invalid(err.to_string()))?,
            RegistryFormat::Yaml => {
                serde_yaml::from_str(contents).map_err(|err| invalid(err.to_string()))?
            }
        };

        if records.is_empty() {
            return Err(invalid("registry defines no templates".into()));
        }

        let mut templates = BTreeMap::new();
        for (name, record) in records {
            if name.trim().is_empty() {
                return Err(invalid("template names must not be empty".into()));
            }
            if record.fields.iter().any(|field| field.trim().is_empty()) {
                return Err(invalid(format!(
                    "template '{name}' has an empty field name"
                )));
            }
            if let Some(field) = duplicate(&record.fields) {
                return Err(invalid(format!(
                    "template '{name}' lists field '{field}' more than once"
                )));
            }
            let file = if record.file.is_absolute() {
                record.file
            } else {
                base.join(record.file)
            };
            templates.insert(
                name.clone(),
                TemplateDefinition {
                    name,
                    fields: record.fields,
                    file,
                },
            );
        }

        Ok(Self {
            source: None,
            templates,
        })
    }

    /// Path the registry was loaded from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&TemplateDefinition> {
        self.templates.get(name)
    }

    /// Template names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TemplateDefinition> {
        self.templates.values()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn duplicate(fields: &[String]) -> Option<&str> {
    fields.iter().enumerate().find_map(|(index, field)| {
        fields[..index]
            .contains(field)
            .then_some(field.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE_JSON: &str = r#"{
        "Invoice": { "fields": ["Name", "Amount"], "file": "invoice.docx" },
        "Letter": { "fields": ["Name"], "file": "/srv/templates/letter.docx" }
    }"#;

    #[test]
    fn parses_json_and_resolves_relative_files() {
        let registry =
            Registry::from_str(INVOICE_JSON, RegistryFormat::Json, Path::new("forms")).unwrap();
        let invoice = registry.get("Invoice").unwrap();
        assert_eq!(invoice.fields, vec!["Name", "Amount"]);
        assert_eq!(invoice.file, Path::new("forms").join("invoice.docx"));
        assert_eq!(
            registry.get("Letter").unwrap().file,
            PathBuf::from("/srv/templates/letter.docx")
        );
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["Invoice", "Letter"]);
    }

    #[test]
    fn parses_toml_and_yaml() {
        let toml = r#"
[Invoice]
fields = ["Name", "Amount"]
file = "invoice.docx"
"#;
        let yaml = "Invoice:\n  fields: [Name, Amount]\n  file: invoice.docx\n";
        let from_toml = Registry::from_str(toml, RegistryFormat::Toml, Path::new("")).unwrap();
        let from_yaml = Registry::from_str(yaml, RegistryFormat::Yaml, Path::new("")).unwrap();
        assert_eq!(from_toml, from_yaml);
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(RegistryFormat::from_path(Path::new("t.TOML")), RegistryFormat::Toml);
        assert_eq!(RegistryFormat::from_path(Path::new("t.yml")), RegistryFormat::Yaml);
        assert_eq!(RegistryFormat::from_path(Path::new("templates")), RegistryFormat::Json);
    }

    #[test]
    fn rejects_malformed_or_empty_registries() {
        for contents in ["not json", "{}", r#"{"A": {"fields": ["x"]}}"#] {
            let err = Registry::from_str(contents, RegistryFormat::Json, Path::new("")).unwrap_err();
            assert!(matches!(err, FillError::Configuration { .. }), "{contents}");
        }
    }

    #[test]
    fn rejects_duplicate_fields() {
        let contents = r#"{"A": {"fields": ["x", "y", "x"], "file": "a.docx"}}"#;
        let err = Registry::from_str(contents, RegistryFormat::Json, Path::new("")).unwrap_err();
        assert!(err.to_string().contains("'x' more than once"));
    }

    #[test]
    fn rejects_blank_field_names() {
        for fields in [r#"["Name", ""]"#, r#"["  "]"#] {
            let contents = format!(r#"{{"A": {{"fields": {fields}, "file": "a.docx"}}}}"#);
            let err = Registry::from_str(&contents, RegistryFormat::Json, Path::new("")).unwrap_err();
            assert!(err.to_string().contains("empty field name"), "{fields}");
        }
    }

    #[test]
    fn load_reports_missing_resource_with_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        let err = Registry::load(&path).unwrap_err();
        match err {
            FillError::Configuration { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn load_records_source_and_base_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("templates.json");
        fs::write(&path, INVOICE_JSON).unwrap();
        let registry = Registry::load(&path).unwrap();
        assert_eq!(registry.source(), Some(path.as_path()));
        assert_eq!(
            registry.get("Invoice").unwrap().file,
            dir.path().join("invoice.docx")
        );
    }
}
