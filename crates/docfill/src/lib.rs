pub mod app;
pub mod cli;
pub mod domain;
pub mod infra;
pub mod ui;

pub use app::fill::{FillOutcome, Filler};
pub use app::merge::{merge, merge_text};
pub use app::registry::Registry;
pub use app::save::save;
pub use domain::errors::FillError;
pub use domain::model::{FieldValues, SubstitutionPolicy, TemplateDefinition};
pub use infra::docx::Document;

/// Install logging for the given target.
pub fn init(target: infra::logging::LogTarget) -> anyhow::Result<()> {
    infra::logging::init(target)
}
