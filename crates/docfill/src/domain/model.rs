//! Domain models for templates, field values, and substitution policy.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Literal form of the substitution site for `field`: `{{ field }}`.
pub fn placeholder(field: &str) -> String {
    format!("{{{{ {field} }}}}")
}

/// A named document blueprint with its fillable fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDefinition {
    pub name: String,
    pub fields: Vec<String>,
    pub file: PathBuf,
}

impl TemplateDefinition {
    /// Whether `field` is one of the template's declared fields.
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|candidate| candidate == field)
    }

    /// An empty value for every declared field, in declaration order.
    pub fn blank_values(&self) -> FieldValues {
        self.fields
            .iter()
            .map(|field| (field.clone(), String::new()))
            .collect()
    }
}

/// User-entered values keyed by field name, preserving insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldValues {
    entries: Vec<(String, String)>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`, replacing any previous value in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_mut(&mut self, field: &str) -> Option<&mut String> {
        self.entries
            .iter_mut()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn remove(&mut self, field: &str) -> Option<String> {
        let index = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for FieldValues
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut values = FieldValues::new();
        for (field, value) in iter {
            values.set(field, value);
        }
        values
    }
}

/// How placeholders without a supplied value are treated during a merge.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[value(rename_all = "kebab-case")]
pub enum SubstitutionPolicy {
    /// Leave unmatched tokens in the output verbatim.
    #[default]
    Lenient,
    /// Fail the merge when any token has no value.
    Strict,
}

impl SubstitutionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubstitutionPolicy::Lenient => "lenient",
            SubstitutionPolicy::Strict => "strict",
        }
    }
}

impl fmt::Display for SubstitutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubstitutionPolicy {
    type Err = PolicyParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lenient" | "lax" => Ok(SubstitutionPolicy::Lenient),
            "strict" => Ok(SubstitutionPolicy::Strict),
            other => Err(PolicyParseError::UnknownPolicy(other.to_string())),
        }
    }
}

/// Error returned when parsing a [`SubstitutionPolicy`] fails.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PolicyParseError {
    #[error("unknown substitution policy '{0}' (expected 'strict' or 'lenient')")]
    UnknownPolicy(String),
}
