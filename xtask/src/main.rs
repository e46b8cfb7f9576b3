use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docfill::{Document, save};
use serde_json::json;

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Regenerate the demo registry and its templates
    Demo {
        #[arg(long, default_value = "demos")]
        dir: PathBuf,
    },
}

struct DemoTemplate {
    name: &'static str,
    file: &'static str,
    fields: &'static [&'static str],
    body: &'static [&'static str],
}

const DEMOS: &[DemoTemplate] = &[
    DemoTemplate {
        name: "Invoice",
        file: "invoice.docx",
        fields: &["Name", "Amount", "Date"],
        body: &[
            "INVOICE",
            "Date: {{ Date }}",
            "Billed to {{ Name }} for {{ Amount }}",
            "Payment is due within 30 days.",
        ],
    },
    DemoTemplate {
        name: "Letter",
        file: "letter.docx",
        fields: &["Name", "Address", "Body", "Sender"],
        body: &[
            "{{ Name }}",
            "{{ Address }}",
            "Dear {{ Name }},",
            "{{ Body }}",
            "Kind regards,",
            "{{ Sender }}",
        ],
    },
];

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Demo { dir } => write_demo(&dir)?,
    }
    Ok(())
}

fn write_demo(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let mut registry = serde_json::Map::new();
    for demo in DEMOS {
        let document = Document::from_paragraphs(demo.body)?;
        save(&document, &dir.join(demo.file))?;
        registry.insert(
            demo.name.to_string(),
            json!({ "fields": demo.fields, "file": demo.file }),
        );
    }

    let path = dir.join("templates.json");
    let contents = serde_json::to_string_pretty(&registry)?;
    fs::write(&path, contents + "\n")
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("wrote {} templates to {}", DEMOS.len(), dir.display());
    Ok(())
}
