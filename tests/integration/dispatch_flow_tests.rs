//! End-to-end dispatch over grouped students with a scripted gateway.

use std::sync::Arc;

use registrar_notify::audit::{AuditEntry, AuditEventType, JsonlAuditWriter};
use registrar_notify::notify::dispatcher::{Delivery, Dispatcher, NotificationKind};
use registrar_notify::notify::group::StudentGroups;
use registrar_notify::notify::phone::{PhoneNormalizer, PrefixedNumberPolicy};
use registrar_notify::notify::template::MessageTemplate;

use super::test_helpers::{failed_row, ready_document_row, student, ScriptedGateway};

const FAILED_TEMPLATE: &str =
    "Hi {first_name} {last_name}, you have a failed grade in: {subjects}.";

fn failed_template() -> MessageTemplate {
    MessageTemplate::parse(FAILED_TEMPLATE).expect("template parses")
}

#[tokio::test]
async fn one_failing_send_does_not_abort_the_batch() {
    let ana = student("123", "Ana", "Cruz", "09171234567");
    let ben = student("456", "Ben", "Reyes", "09181234567");
    let rows = vec![
        failed_row(1, &ana, "Physics"),
        failed_row(2, &ben, "Calculus"),
        failed_row(3, &ben, "Chemistry"),
    ];
    let groups = StudentGroups::from_grade_rows(&rows);

    let gateway = Arc::new(ScriptedGateway::failing_for(&["+639171234567"]));
    let dispatcher = Dispatcher::new(gateway.clone(), PhoneNormalizer::default());

    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &failed_template())
        .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.summary.total, 2);
    assert_eq!(report.summary.sent, 1);
    assert_eq!(report.summary.failed, 1);
    assert!(!report.dry_run);

    let ana_outcome = report.outcome("123").expect("ana outcome");
    assert!(matches!(ana_outcome.delivery, Delivery::Failed { .. }));

    let ben_outcome = report.outcome("456").expect("ben outcome");
    assert!(ben_outcome.is_sent());
    assert_eq!(
        ben_outcome.message.as_deref(),
        Some(
            "Hi Ben Reyes, you have a failed grade in: \
             Calculus (Year: 1, Sem: 1), Chemistry (Year: 1, Sem: 1)."
        )
    );

    // Only the successful student's records may be marked as messaged.
    assert_eq!(report.messaged_record_ids(), vec![2, 3]);
}

#[tokio::test]
async fn exactly_one_send_per_student_in_group_order() {
    let ana = student("123", "Ana", "Cruz", "09171234567");
    let ben = student("456", "Ben", "Reyes", "+639181234567");
    let rows = vec![
        failed_row(1, &ben, "Calculus"),
        failed_row(2, &ana, "Physics"),
        failed_row(3, &ben, "Biology"),
    ];
    let groups = StudentGroups::from_grade_rows(&rows);

    let gateway = Arc::new(ScriptedGateway::default());
    let dispatcher = Dispatcher::new(gateway.clone(), PhoneNormalizer::default());
    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &failed_template())
        .await;

    let calls = gateway.calls();
    let phones: Vec<&str> = calls.iter().map(|sms| sms.phone.as_str()).collect();
    assert_eq!(phones, vec!["+639181234567", "+639171234567"]);
    assert_eq!(
        calls[1].message,
        "Hi Ana Cruz, you have a failed grade in: Physics (Year: 1, Sem: 1)."
    );
    assert_eq!(report.summary.sent, 2);
    assert_eq!(report.messaged_record_ids(), vec![1, 3, 2]);
}

#[tokio::test]
async fn sent_outcome_carries_gateway_response_unmodified() {
    let ana = student("123", "Ana", "Cruz", "09171234567");
    let groups = StudentGroups::from_grade_rows(&[failed_row(1, &ana, "Physics")]);

    let dispatcher = Dispatcher::new(Arc::new(ScriptedGateway::default()), PhoneNormalizer::default());
    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &failed_template())
        .await;

    match &report.outcomes[0].delivery {
        Delivery::Sent { response } => {
            assert_eq!(response["status"], 200);
            assert_eq!(response["message"], "Message has been queued");
        }
        other => panic!("expected sent, got {other:?}"),
    }
}

#[tokio::test]
async fn template_error_is_isolated_to_the_student() {
    let ana = student("123", "Ana", "Cruz", "09171234567");
    let groups = StudentGroups::from_grade_rows(&[failed_row(1, &ana, "Physics")]);
    let template = MessageTemplate::parse("Your {document} is ready").expect("parses");

    let gateway = Arc::new(ScriptedGateway::default());
    let dispatcher = Dispatcher::new(gateway.clone(), PhoneNormalizer::default());
    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &template)
        .await;

    assert!(gateway.calls().is_empty(), "nothing must be sent");
    assert_eq!(report.summary.failed, 1);
    match &report.outcomes[0].delivery {
        Delivery::Failed { error, response } => {
            assert!(error.starts_with("template:"), "{error}");
            assert!(response.is_none());
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(report.messaged_record_ids().is_empty());
}

#[tokio::test]
async fn dry_run_never_sends_and_marks_nothing() {
    let ana = student("123", "Ana", "Cruz", "09171234567");
    let groups = StudentGroups::from_grade_rows(&[failed_row(1, &ana, "Physics")]);

    let dispatcher = Dispatcher::dry_run(PhoneNormalizer::default());
    assert!(dispatcher.is_dry_run());
    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &failed_template())
        .await;

    assert!(report.dry_run);
    assert_eq!(report.summary.skipped, 1);
    let outcome = &report.outcomes[0];
    assert_eq!(outcome.phone.as_deref(), Some("+639171234567"));
    assert!(outcome.message.is_some());
    assert!(report.messaged_record_ids().is_empty());
}

#[tokio::test]
async fn drop_policy_skips_prefixed_recipients() {
    let ana = student("123", "Ana", "Cruz", "+639171234567");
    let groups = StudentGroups::from_grade_rows(&[failed_row(1, &ana, "Physics")]);

    let gateway = Arc::new(ScriptedGateway::default());
    let dispatcher = Dispatcher::new(
        gateway.clone(),
        PhoneNormalizer::new("+63", PrefixedNumberPolicy::Drop),
    );
    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &failed_template())
        .await;

    assert!(gateway.calls().is_empty());
    assert!(matches!(
        report.outcomes[0].delivery,
        Delivery::Skipped { .. }
    ));
}

#[tokio::test]
async fn empty_contact_number_fails_only_that_student() {
    let ana = student("123", "Ana", "Cruz", "");
    let ben = student("456", "Ben", "Reyes", "09181234567");
    let rows = vec![failed_row(1, &ana, "Physics"), failed_row(2, &ben, "Calculus")];
    let groups = StudentGroups::from_grade_rows(&rows);

    let gateway = Arc::new(ScriptedGateway::default());
    let dispatcher = Dispatcher::new(gateway.clone(), PhoneNormalizer::default());
    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &failed_template())
        .await;

    assert_eq!(gateway.calls().len(), 1);
    assert_eq!(report.summary.failed, 1);
    assert_eq!(report.summary.sent, 1);
    assert_eq!(report.messaged_record_ids(), vec![2]);
}

#[tokio::test]
async fn document_dispatch_uses_last_document_label() {
    let ana = student("123", "Ana", "Cruz", "09171234567");
    let rows = vec![
        ready_document_row(10, &ana, "Transcript of Records"),
        ready_document_row(11, &ana, "Diploma"),
    ];
    let groups = StudentGroups::from_document_rows(&rows);
    let template = MessageTemplate::parse("Hi {first_name}, your {document} is now ready for pickup.")
        .expect("parses");

    let gateway = Arc::new(ScriptedGateway::default());
    let dispatcher = Dispatcher::new(gateway.clone(), PhoneNormalizer::default());
    let report = dispatcher
        .dispatch(NotificationKind::RequestedDocument, &groups, &template)
        .await;

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].message, "Hi Ana, your Diploma is now ready for pickup.");
    assert_eq!(report.messaged_record_ids(), vec![10, 11]);
}

#[tokio::test]
async fn audit_trail_records_every_outcome() {
    let temp = tempfile::tempdir().expect("tempdir");
    let writer = Arc::new(JsonlAuditWriter::new(temp.path().to_owned()).expect("writer"));

    let ana = student("123", "Ana", "Cruz", "09171234567");
    let ben = student("456", "Ben", "Reyes", "09181234567");
    let rows = vec![failed_row(1, &ana, "Physics"), failed_row(2, &ben, "Calculus")];
    let groups = StudentGroups::from_grade_rows(&rows);

    let dispatcher = Dispatcher::new(
        Arc::new(ScriptedGateway::failing_for(&["+639181234567"])),
        PhoneNormalizer::default(),
    )
    .with_audit(writer.clone());
    let report = dispatcher
        .dispatch(NotificationKind::FailedGrade, &groups, &failed_template())
        .await;

    let path = writer.path_for_date(chrono::Utc::now().date_naive());
    let raw = std::fs::read_to_string(path).expect("audit file");
    let entries: Vec<AuditEntry> = raw
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();

    let events: Vec<AuditEventType> = entries.iter().map(|e| e.event_type).collect();
    assert_eq!(
        events,
        vec![
            AuditEventType::DispatchStart,
            AuditEventType::MessageSent,
            AuditEventType::MessageFailed,
            AuditEventType::DispatchFinish,
        ]
    );
    assert!(entries.iter().all(|e| e.run_id == report.run_id));
    assert_eq!(entries[1].record_ids, Some(vec![1]));
    assert_eq!(entries[2].student_id.as_deref(), Some("456"));
}

#[tokio::test]
async fn empty_batch_produces_empty_report() {
    let groups = StudentGroups::default();
    let gateway = Arc::new(ScriptedGateway::default());
    let dispatcher = Dispatcher::new(gateway.clone(), PhoneNormalizer::default());

    let report = dispatcher
        .dispatch(NotificationKind::IncompleteGrade, &groups, &failed_template())
        .await;

    assert!(report.outcomes.is_empty());
    assert_eq!(report.summary.total, 0);
    assert!(gateway.calls().is_empty());
    assert!(report.finished_at >= report.started_at);
}
