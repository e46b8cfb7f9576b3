//! Select → merge → save, as one operation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::merge::merge;
use crate::app::registry::Registry;
use crate::app::save::{FileNamer, resolve_destination, save};
use crate::domain::errors::FillError;
use crate::domain::model::{FieldValues, SubstitutionPolicy, TemplateDefinition};
use crate::infra::config::Config;

/// Result of a completed fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillOutcome {
    pub template: String,
    pub path: PathBuf,
}

/// Fills registry templates and writes the results.
#[derive(Debug)]
pub struct Filler {
    registry: Arc<Registry>,
    policy: SubstitutionPolicy,
    namer: FileNamer,
    output_dir: Option<PathBuf>,
}

impl Filler {
    pub fn new(registry: Arc<Registry>, policy: SubstitutionPolicy, namer: FileNamer) -> Self {
        Self {
            registry,
            policy,
            namer,
            output_dir: None,
        }
    }

    /// Build a filler using the merge and output settings from `config`.
    pub fn from_config(registry: Arc<Registry>, config: &Config) -> Result<Self, FillError> {
        let namer = FileNamer::new(&config.output.file_name(), config.merge.name_field())?;
        let mut filler = Self::new(registry, config.merge.policy(), namer);
        filler.output_dir = config.output.directory.clone();
        Ok(filler)
    }

    /// Directory prepended to suggested destinations.
    pub fn with_output_dir(mut self, directory: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(directory.into());
        self
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn policy(&self) -> SubstitutionPolicy {
        self.policy
    }

    /// Look up the selected template.
    pub fn template(&self, selection: Option<&str>) -> Result<&TemplateDefinition, FillError> {
        let name = selection.ok_or(FillError::MissingSelection)?;
        self.registry
            .get(name)
            .ok_or_else(|| FillError::UnknownTemplate(name.to_string()))
    }

    /// Default destination for `template` filled with `values`.
    pub fn suggest_destination(
        &self,
        template: &TemplateDefinition,
        values: &FieldValues,
    ) -> PathBuf {
        let file_name = self.namer.suggest(template, values);
        match &self.output_dir {
            Some(dir) => dir.join(file_name),
            None => PathBuf::from(file_name),
        }
    }

    /// Merged paragraph text without writing anything.
    pub fn preview(
        &self,
        selection: Option<&str>,
        values: &FieldValues,
    ) -> Result<Vec<String>, FillError> {
        let template = self.template(selection)?;
        let document = merge(&template.file, values, self.policy)?;
        Ok(document.paragraph_texts())
    }

    /// Merge `values` into the selected template and save it.
    ///
    /// Without a `destination` the suggested one is used. Every check runs
    /// before anything is written.
    pub fn fill(
        &self,
        selection: Option<&str>,
        values: &FieldValues,
        destination: Option<&Path>,
    ) -> Result<FillOutcome, FillError> {
        let template = self.template(selection)?;
        let destination = match destination {
            Some(path) => resolve_destination(path)?,
            None => resolve_destination(&self.suggest_destination(template, values))?,
        };
        let document = merge(&template.file, values, self.policy)?;
        let path = save(&document, &destination)?;
        Ok(FillOutcome {
            template: template.name.clone(),
            path,
        })
    }
}
