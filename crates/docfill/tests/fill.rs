mod common;

use std::sync::Arc;

use docfill::app::save::FileNamer;
use docfill::{
    Document, FieldValues, FillError, Filler, Registry, SubstitutionPolicy, merge,
};

use common::{docx_files, invoice_workspace};

fn filler(dir: &std::path::Path, policy: SubstitutionPolicy) -> Filler {
    let registry = Registry::load(&dir.join("templates.json")).unwrap();
    let namer = FileNamer::new("{{ name }}_{{ template }}", "Name").unwrap();
    Filler::new(Arc::new(registry), policy, namer).with_output_dir(dir)
}

fn values(pairs: &[(&str, &str)]) -> FieldValues {
    pairs.iter().copied().collect()
}

#[test]
fn fills_every_field() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);

    let outcome = filler
        .fill(Some("Invoice"), &values(&[("Name", "Alice"), ("Amount", "100")]), None)
        .unwrap();

    assert_eq!(outcome.path, dir.path().join("Alice_Invoice.docx"));
    let saved = Document::open(&outcome.path).unwrap();
    assert_eq!(
        saved.paragraph_texts(),
        vec!["INVOICE", "Billed to Alice for 100", "Thank you."]
    );
}

#[test]
fn omitted_field_stays_as_placeholder() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);

    let outcome = filler
        .fill(
            Some("Invoice"),
            &values(&[("Name", "Alice")]),
            Some(&dir.path().join("partial")),
        )
        .unwrap();

    assert_eq!(outcome.path, dir.path().join("partial.docx"));
    let saved = Document::open(&outcome.path).unwrap();
    assert_eq!(saved.paragraph_texts()[1], "Billed to Alice for {{ Amount }}");
}

#[test]
fn strict_policy_refuses_and_writes_nothing() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Strict);

    let err = filler
        .fill(Some("Invoice"), &values(&[("Name", "Alice")]), None)
        .unwrap_err();

    assert!(matches!(err, FillError::UnresolvedPlaceholders(ref names) if names == &["Amount"]));
    assert_eq!(docx_files(dir.path()), vec!["invoice.docx"]);
}

#[test]
fn missing_selection_writes_nothing() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);

    let err = filler
        .fill(None, &values(&[("Name", "Alice")]), Some(&dir.path().join("out.docx")))
        .unwrap_err();

    assert!(matches!(err, FillError::MissingSelection));
    assert_eq!(docx_files(dir.path()), vec!["invoice.docx"]);
}

#[test]
fn missing_template_file_writes_nothing() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);

    let err = filler
        .fill(Some("Receipt"), &values(&[("Name", "Alice")]), None)
        .unwrap_err();

    assert!(matches!(err, FillError::TemplateNotFound(ref path) if path.ends_with("missing/receipt.docx")));
    assert_eq!(docx_files(dir.path()), vec!["invoice.docx"]);
}

#[test]
fn unknown_template_is_rejected() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);
    let err = filler.fill(Some("Memo"), &FieldValues::new(), None).unwrap_err();
    assert!(matches!(err, FillError::UnknownTemplate(ref name) if name == "Memo"));
}

#[test]
fn merging_twice_gives_identical_text() {
    let dir = invoice_workspace();
    let template = dir.path().join("invoice.docx");
    let input = values(&[("Name", "Alice"), ("Amount", "100")]);

    let first = merge(&template, &input, SubstitutionPolicy::Lenient).unwrap();
    let second = merge(&template, &input, SubstitutionPolicy::Lenient).unwrap();

    assert_eq!(first.paragraph_texts(), second.paragraph_texts());
    assert_eq!(first.document_xml(), second.document_xml());
}

#[test]
fn full_values_leave_no_tokens_for_any_registered_template() {
    let dir = invoice_workspace();
    let registry = Registry::load(&dir.path().join("templates.json")).unwrap();

    for template in registry.iter().filter(|template| template.file.exists()) {
        let input: FieldValues = template
            .fields
            .iter()
            .map(|field| (field.clone(), format!("value of {field}")))
            .collect();
        let document = merge(&template.file, &input, SubstitutionPolicy::Strict).unwrap();
        for text in document.paragraph_texts() {
            for field in &template.fields {
                assert!(!text.contains(&docfill::domain::model::placeholder(field)));
            }
        }
    }
}

#[test]
fn preview_does_not_write() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);
    let paragraphs = filler
        .preview(Some("Invoice"), &values(&[("Amount", "7")]))
        .unwrap();
    assert_eq!(paragraphs[1], "Billed to {{ Name }} for 7");
    assert_eq!(docx_files(dir.path()), vec!["invoice.docx"]);
}

#[test]
fn destination_with_wrong_extension_writes_nothing() {
    let dir = invoice_workspace();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);
    let err = filler
        .fill(Some("Invoice"), &FieldValues::new(), Some(&dir.path().join("out.pdf")))
        .unwrap_err();
    assert!(matches!(err, FillError::InvalidDestination { .. }));
    assert!(!dir.path().join("out.pdf").exists());
}

#[test]
fn unwritable_destination_is_an_io_error() {
    let dir = invoice_workspace();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let filler = filler(dir.path(), SubstitutionPolicy::Lenient);

    let err = filler
        .fill(
            Some("Invoice"),
            &values(&[("Name", "Alice"), ("Amount", "100")]),
            Some(&blocker.join("out.docx")),
        )
        .unwrap_err();

    assert!(matches!(err, FillError::Io { .. }));
    assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "not a directory");
    assert_eq!(docx_files(dir.path()), vec!["invoice.docx"]);
}
