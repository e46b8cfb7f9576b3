//! Placeholder substitution over document paragraphs.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::errors::FillError;
use crate::domain::model::{FieldValues, SubstitutionPolicy, placeholder};
use crate::infra::docx::Document;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{ ([^{}]+?) \}\}").expect("placeholder pattern is valid"));

/// Outcome of substituting values into one piece of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedText {
    pub text: String,
    pub replacements: usize,
    /// Names of tokens found in the original text with no supplied value.
    pub unresolved: Vec<String>,
}

/// Totals for a whole-document merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub paragraphs_changed: usize,
    pub replacements: usize,
    pub unresolved: Vec<String>,
}

/// Replace every `{{ field }}` token in `text` whose field has a value.
///
/// Tokens are located in the original text only, so a value that itself
/// contains placeholder syntax is inserted verbatim.
pub fn merge_text(text: &str, values: &FieldValues) -> MergedText {
    let mut sites: Vec<(usize, usize, &str)> = Vec::new();
    for (field, value) in values.iter() {
        let token = placeholder(field);
        sites.extend(
            text.match_indices(token.as_str())
                .map(|(start, matched)| (start, start + matched.len(), value)),
        );
    }
    sites.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    let mut merged = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut replacements = 0;
    for (start, end, value) in sites {
        if start < cursor {
            continue;
        }
        merged.push_str(&text[cursor..start]);
        merged.push_str(value);
        cursor = end;
        replacements += 1;
    }
    merged.push_str(&text[cursor..]);

    let mut unresolved: Vec<String> = Vec::new();
    for capture in PLACEHOLDER.captures_iter(text) {
        let name = &capture[1];
        if !values.contains(name) && !unresolved.iter().any(|seen| seen == name) {
            unresolved.push(name.to_string());
        }
    }

    MergedText {
        text: merged,
        replacements,
        unresolved,
    }
}

/// Substitute `values` into every paragraph of `document` in place.
pub fn merge_document(
    document: &mut Document,
    values: &FieldValues,
    policy: SubstitutionPolicy,
) -> Result<MergeReport, FillError> {
    let mut report = MergeReport::default();
    for paragraph in document.paragraphs_mut() {
        let merged = merge_text(paragraph.text(), values);
        for name in merged.unresolved {
            if !report.unresolved.contains(&name) {
                report.unresolved.push(name);
            }
        }
        if merged.replacements > 0 {
            report.replacements += merged.replacements;
            report.paragraphs_changed += 1;
            paragraph.set_text(merged.text);
        }
    }

    if policy == SubstitutionPolicy::Strict && !report.unresolved.is_empty() {
        return Err(FillError::UnresolvedPlaceholders(report.unresolved));
    }
    if !report.unresolved.is_empty() {
        tracing::warn!(
            unresolved = ?report.unresolved,
            "placeholders left without a value"
        );
    }
    Ok(report)
}

/// Open the template at `template_path` and substitute `values` into it.
pub fn merge(
    template_path: &Path,
    values: &FieldValues,
    policy: SubstitutionPolicy,
) -> Result<Document, FillError> {
    if !template_path.exists() {
        return Err(FillError::TemplateNotFound(template_path.to_path_buf()));
    }
    let mut document = Document::open(template_path)?;
    let report = merge_document(&mut document, values, policy)?;
    tracing::debug!(
        template = %template_path.display(),
        paragraphs = report.paragraphs_changed,
        replacements = report.replacements,
        "merged template"
    );
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> FieldValues {
        pairs.iter().copied().collect()
    }

    #[test]
    fn replaces_all_supplied_fields() {
        let merged = merge_text(
            "Billed to {{ Name }} for {{ Amount }}",
            &values(&[("Name", "Alice"), ("Amount", "100")]),
        );
        assert_eq!(merged.text, "Billed to Alice for 100");
        assert_eq!(merged.replacements, 2);
        assert!(merged.unresolved.is_empty());
    }

    #[test]
    fn leaves_missing_fields_verbatim() {
        let merged = merge_text(
            "Billed to {{ Name }} for {{ Amount }}",
            &values(&[("Name", "Alice")]),
        );
        assert_eq!(merged.text, "Billed to Alice for {{ Amount }}");
        assert_eq!(merged.unresolved, vec!["Amount"]);
    }

    #[test]
    fn replaces_repeated_tokens() {
        let merged = merge_text("{{ Name }}, {{ Name }}!", &values(&[("Name", "Bo")]));
        assert_eq!(merged.text, "Bo, Bo!");
        assert_eq!(merged.replacements, 2);
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let merged = merge_text(
            "{{ Name }} owes {{ Amount }}",
            &values(&[("Name", "{{ Amount }}"), ("Amount", "5")]),
        );
        assert_eq!(merged.text, "{{ Amount }} owes 5");
    }

    #[test]
    fn requires_exact_token_spacing() {
        let merged = merge_text("{{Name}} {{  Name  }}", &values(&[("Name", "x")]));
        assert_eq!(merged.text, "{{Name}} {{  Name  }}");
        assert_eq!(merged.replacements, 0);
    }

    #[test]
    fn empty_value_removes_token() {
        let merged = merge_text("Dear {{ Title }}Smith", &values(&[("Title", "")]));
        assert_eq!(merged.text, "Dear Smith");
    }

    #[test]
    fn strict_policy_reports_every_unresolved_name_once() {
        let mut document = Document::from_paragraphs([
            "{{ Name }} {{ Amount }}",
            "{{ Amount }} due {{ Date }}",
        ])
        .unwrap();
        let err = merge_document(
            &mut document,
            &values(&[("Name", "Alice")]),
            SubstitutionPolicy::Strict,
        )
        .unwrap_err();
        match err {
            FillError::UnresolvedPlaceholders(names) => assert_eq!(names, vec!["Amount", "Date"]),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn lenient_policy_reports_without_failing() {
        let mut document = Document::from_paragraphs(["{{ Name }}", "plain", "{{ Date }}"]).unwrap();
        let report = merge_document(
            &mut document,
            &values(&[("Name", "Alice")]),
            SubstitutionPolicy::Lenient,
        )
        .unwrap();
        assert_eq!(report.paragraphs_changed, 1);
        assert_eq!(report.unresolved, vec!["Date"]);
        assert_eq!(document.paragraph_texts(), vec!["Alice", "plain", "{{ Date }}"]);
    }

    #[test]
    fn merge_reports_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.docx");
        let err = merge(&path, &FieldValues::new(), SubstitutionPolicy::Lenient).unwrap_err();
        assert!(matches!(err, FillError::TemplateNotFound(_)));
    }
}
