use docfill::{Document, FieldValues, SubstitutionPolicy};
use docfill::app::merge::merge_document;
use insta::assert_snapshot;

#[test]
fn merged_letter_text() {
    let mut document = Document::from_paragraphs([
        "Dear {{ Name }},",
        "Your order {{ Order }} ships on {{ Date }}.",
        "Ref: {{ Order }}",
        "Regards,\n{{ Sender }}",
    ])
    .unwrap();
    let values: FieldValues = [
        ("Name", "Alice"),
        ("Order", "#1042"),
        ("Sender", "{{ Name }}'s team"),
    ]
    .into_iter()
    .collect();

    merge_document(&mut document, &values, SubstitutionPolicy::Lenient).unwrap();

    assert_snapshot!(document.paragraph_texts().join("\n---\n"), @r###"
    Dear Alice,
    ---
    Your order #1042 ships on {{ Date }}.
    ---
    Ref: #1042
    ---
    Regards,
    {{ Name }}'s team
    "###);
}
