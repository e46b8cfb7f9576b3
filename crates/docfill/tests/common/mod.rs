#![allow(dead_code)]

use std::fs;
use std::path::Path;

use docfill::{Document, save};
use tempfile::TempDir;

pub const INVOICE_REGISTRY: &str = r#"{
    "Invoice": { "fields": ["Name", "Amount"], "file": "invoice.docx" },
    "Receipt": { "fields": ["Name"], "file": "missing/receipt.docx" }
}"#;

pub const INVOICE_BODY: &[&str] = &["INVOICE", "Billed to {{ Name }} for {{ Amount }}", "Thank you."];

/// Temporary directory holding `templates.json` and `invoice.docx`.
pub fn invoice_workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("temp dir");
    fs::write(dir.path().join("templates.json"), INVOICE_REGISTRY).expect("write registry");
    write_template(&dir.path().join("invoice.docx"), INVOICE_BODY);
    dir
}

pub fn write_template(path: &Path, paragraphs: &[&str]) {
    let document = Document::from_paragraphs(paragraphs).expect("build template");
    save(&document, path).expect("save template");
}

pub fn docx_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .expect("read dir")
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".docx"))
        .collect();
    names.sort();
    names
}
