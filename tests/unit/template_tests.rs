//! Unit tests for message template parsing and rendering.

use registrar_notify::notify::group::{GroupDetail, NotificationGroup};
use registrar_notify::notify::template::{MessageTemplate, DOCUMENT_FIELD, SUBJECTS_FIELD};
use registrar_notify::AppError;

fn grade_group(subjects: &[&str]) -> NotificationGroup {
    NotificationGroup {
        student_id: "123".into(),
        first_name: "Ana".into(),
        middle_name: "Lopez".into(),
        last_name: "Cruz".into(),
        contact_number: "09171234567".into(),
        detail: GroupDetail::Subjects {
            subjects: subjects.iter().map(|s| (*s).to_owned()).collect(),
        },
        record_ids: vec![1],
    }
}

fn document_group(document: &str) -> NotificationGroup {
    NotificationGroup {
        detail: GroupDetail::Document {
            document: document.into(),
        },
        ..grade_group(&[])
    }
}

#[test]
fn renders_failed_grade_message() {
    let template =
        MessageTemplate::parse("Hi {first_name} {last_name}, you have a failed grade in: {subjects}.")
            .expect("parses");
    let rendered = template
        .render(&grade_group(&["Physics (Year: 1, Sem: 1)"]))
        .expect("renders");
    assert_eq!(
        rendered,
        "Hi Ana Cruz, you have a failed grade in: Physics (Year: 1, Sem: 1)."
    );
}

#[test]
fn subjects_are_comma_joined() {
    let template = MessageTemplate::parse("{subjects}").expect("parses");
    let rendered = template
        .render(&grade_group(&["Calculus (Year: 1, Sem: 1)", "Physics (Year: 1, Sem: 1)"]))
        .expect("renders");
    assert_eq!(
        rendered,
        "Calculus (Year: 1, Sem: 1), Physics (Year: 1, Sem: 1)"
    );
}

#[test]
fn renders_document_message_with_middle_name() {
    let template = MessageTemplate::parse(
        "Hi {first_name} {middle_name} {last_name}, your {document} is now ready for pickup.",
    )
    .expect("parses");
    let rendered = template
        .render(&document_group("Transcript of Records"))
        .expect("renders");
    assert_eq!(
        rendered,
        "Hi Ana Lopez Cruz, your Transcript of Records is now ready for pickup."
    );
}

#[test]
fn field_missing_from_aggregate_is_a_template_error() {
    let template = MessageTemplate::parse("Your {document} is ready").expect("parses");
    let err = template
        .render(&grade_group(&["Calculus (Year: 1, Sem: 1)"]))
        .expect_err("grade aggregates carry no document");
    assert!(matches!(err, AppError::Template(_)));
    assert!(err.to_string().contains("document"), "{err}");
}

#[test]
fn unknown_field_is_a_template_error() {
    let template = MessageTemplate::parse("Hi {nickname}").expect("parses");
    assert!(matches!(
        template.render(&grade_group(&[])),
        Err(AppError::Template(_))
    ));
}

#[test]
fn doubled_braces_render_literally() {
    let template = MessageTemplate::parse("{{first_name}} is {first_name}").expect("parses");
    assert_eq!(
        template.render(&grade_group(&[])).expect("renders"),
        "{first_name} is Ana"
    );
}

#[test]
fn unmatched_braces_are_rejected() {
    for source in ["Hi {first_name", "Hi first_name}", "Hi { }", "{}"] {
        assert!(
            matches!(MessageTemplate::parse(source), Err(AppError::Template(_))),
            "{source:?} should not parse"
        );
    }
}

#[test]
fn fields_lists_placeholders_in_order() {
    let template =
        MessageTemplate::parse("{last_name}, {first_name}: {subjects}").expect("parses");
    let fields: Vec<&str> = template.fields().collect();
    assert_eq!(fields, vec!["last_name", "first_name", "subjects"]);
    assert_eq!(template.source(), "{last_name}, {first_name}: {subjects}");
}

#[test]
fn ensure_fields_accepts_identity_and_extra_fields() {
    let grade = MessageTemplate::parse("{first_name} {middle_name} {subjects}").expect("parses");
    assert!(grade.ensure_fields(&[SUBJECTS_FIELD]).is_ok());
    assert!(grade.ensure_fields(&[DOCUMENT_FIELD]).is_err());

    let document = MessageTemplate::parse("{last_name} {document}").expect("parses");
    assert!(document.ensure_fields(&[DOCUMENT_FIELD]).is_ok());
    assert!(document.ensure_fields(&[]).is_err());
}

#[test]
fn template_without_placeholders_renders_verbatim() {
    let template = MessageTemplate::parse("Registrar closed on Friday.").expect("parses");
    assert_eq!(
        template.render(&grade_group(&[])).expect("renders"),
        "Registrar closed on Friday."
    );
}
