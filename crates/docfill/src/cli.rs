//! Command-line entry points.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use crate::app::fill::Filler;
use crate::app::registry::Registry;
use crate::app::save::{resolve_destination, save};
use crate::domain::errors::FillError;
use crate::domain::model::{FieldValues, SubstitutionPolicy, placeholder};
use crate::infra::config::Config;
use crate::infra::docx::Document;
use crate::infra::logging::LogTarget;
use crate::ui::app::UiApp;

#[derive(Debug, Parser)]
#[command(
    name = "docfill",
    author,
    version,
    about = "Fill word-processing templates from a template registry"
)]
pub struct Cli {
    /// Template registry (JSON, TOML, or YAML); overrides configuration.
    #[arg(long, global = true, value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// How placeholders without a value are handled.
    #[arg(long, global = true, value_enum)]
    pub policy: Option<SubstitutionPolicy>,

    /// Append logs to this file instead of stderr.
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Open the interactive form (default).
    Tui,
    /// List registered templates and their fields.
    List,
    /// Print the fields of one template, one per line.
    Fields { template: String },
    /// Fill a template and write the document.
    Fill {
        template: String,
        /// Field value; repeat for each field.
        #[arg(short, long = "set", value_name = "FIELD=VALUE", value_parser = parse_assignment)]
        set: Vec<(String, String)>,
        /// Destination; defaults to the configured file name pattern.
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
        /// Print the merged paragraphs instead of writing a file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Write a starter document with one placeholder line per field.
    Scaffold {
        template: String,
        /// Destination; defaults to the template's registered file.
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print a shell completion script.
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Cli {
    /// The interactive UI owns the terminal, so it only logs to a file.
    pub fn log_target(&self) -> LogTarget {
        let interactive = matches!(self.command, None | Some(Command::Tui));
        match (&self.log_file, interactive) {
            (Some(path), _) => LogTarget::File(path.clone()),
            (None, true) => LogTarget::Disabled,
            (None, false) => LogTarget::Stderr,
        }
    }
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((field.to_string(), value.to_string()))
}

/// Execute the parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let Cli {
        registry,
        policy,
        command,
        ..
    } = cli;
    let load = || load_filler(registry.as_deref(), policy);
    let mut stdout = io::stdout().lock();

    match command.unwrap_or(Command::Tui) {
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "docfill", &mut stdout);
        }
        Command::Tui => {
            let filler = load()?;
            drop(stdout);
            UiApp::new(filler).run()?;
        }
        Command::List => {
            let filler = load()?;
            for template in filler.registry().iter() {
                writeln!(stdout, "{}\t{}", template.name, template.fields.join(", "))?;
            }
        }
        Command::Fields { template } => {
            let filler = load()?;
            for field in &filler.template(Some(&template))?.fields {
                writeln!(stdout, "{field}")?;
            }
        }
        Command::Fill {
            template,
            set,
            out,
            dry_run,
        } => {
            let filler = load()?;
            let definition = filler.template(Some(&template))?;
            for (field, _) in &set {
                if !definition.has_field(field) {
                    tracing::warn!(template = %template, field = %field, "field is not declared by the template");
                }
            }
            let values: FieldValues = set.into_iter().collect();
            if dry_run {
                for paragraph in filler.preview(Some(&template), &values)? {
                    writeln!(stdout, "{paragraph}")?;
                }
            } else {
                let outcome = filler.fill(Some(&template), &values, out.as_deref())?;
                writeln!(stdout, "{}", outcome.path.display())?;
            }
        }
        Command::Scaffold {
            template,
            out,
            force,
        } => {
            let filler = load()?;
            let definition = filler.template(Some(&template))?;
            let destination =
                resolve_destination(&out.unwrap_or_else(|| definition.file.clone()))?;
            if destination.exists() && !force {
                bail!(
                    "{} already exists (use --force to overwrite)",
                    destination.display()
                );
            }
            let mut lines = vec![definition.name.clone()];
            lines.extend(
                definition
                    .fields
                    .iter()
                    .map(|field| format!("{field}: {}", placeholder(field))),
            );
            let document = Document::from_paragraphs(&lines)?;
            let written = save(&document, &destination)?;
            writeln!(stdout, "{}", written.display())?;
        }
    }
    Ok(())
}

/// Configuration layers plus command-line overrides, turned into a filler.
fn load_filler(registry: Option<&Path>, policy: Option<SubstitutionPolicy>) -> Result<Filler> {
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(path) = registry {
        config.registry.set_path(path);
    }
    if let Some(policy) = policy {
        config.merge.set_policy(policy);
    }
    let registry = Arc::new(Registry::load(&config.registry.path())?);
    Ok(Filler::from_config(registry, &config)?)
}

/// Exit code for an error returned by [`run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<FillError>() {
        Some(FillError::Configuration { .. }) => 3,
        Some(FillError::TemplateNotFound(_)) | Some(FillError::UnknownTemplate(_)) => 4,
        Some(FillError::UnresolvedPlaceholders(_)) => 5,
        Some(_) => 1,
        None => 1,
    }
}
