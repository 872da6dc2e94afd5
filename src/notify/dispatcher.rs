//! Sequential per-student notification dispatch.
//!
//! Each student in a [`StudentGroups`] batch gets exactly one send attempt,
//! in first-seen order. A failure while rendering, normalizing, or sending
//! is recorded against that student and the batch moves on. The dispatcher
//! never touches the record store: the [`DispatchReport`] lists the record
//! ids the caller may now mark as messaged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::group::{NotificationGroup, StudentGroups};
use super::phone::PhoneNormalizer;
use super::template::MessageTemplate;
use crate::audit::{AuditEntry, AuditEventType, AuditLogger};
use crate::gateway::{OutboundSms, SmsGateway};
use crate::models::remark::Remark;

/// What a dispatch run notifies students about.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Failed grades.
    FailedGrade,
    /// Ungraded subjects.
    IncompleteGrade,
    /// Documents ready for pickup.
    RequestedDocument,
}

impl NotificationKind {
    /// Kind used for a grade remark; passed grades are never notified.
    #[must_use]
    pub fn for_remark(remark: Remark) -> Option<Self> {
        match remark {
            Remark::Failed => Some(Self::FailedGrade),
            Remark::Incomplete => Some(Self::IncompleteGrade),
            Remark::Passed => None,
        }
    }
}

/// Result of the single send attempt for one student.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Delivery {
    /// The gateway accepted the message.
    Sent {
        /// Gateway response, unmodified.
        response: Value,
    },
    /// The message could not be rendered, addressed, or delivered.
    Failed {
        /// Error description.
        error: String,
        /// Gateway payload, when the gateway answered with JSON.
        #[serde(skip_serializing_if = "Option::is_none")]
        response: Option<Value>,
    },
    /// No send was attempted.
    Skipped {
        /// Why the student was skipped.
        reason: String,
    },
}

/// Per-student outcome within a [`DispatchReport`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StudentOutcome {
    /// Student the message was addressed to.
    pub student_id: String,
    /// Normalized recipient, when normalization succeeded.
    pub phone: Option<String>,
    /// Rendered message, when rendering succeeded.
    pub message: Option<String>,
    /// Source records covered by the message.
    pub record_ids: Vec<i64>,
    /// Send result.
    #[serde(flatten)]
    pub delivery: Delivery,
}

impl StudentOutcome {
    /// Whether the gateway accepted this student's message.
    #[must_use]
    pub fn is_sent(&self) -> bool {
        matches!(self.delivery, Delivery::Sent { .. })
    }
}

/// Batch-level counts.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Students attempted.
    pub total: usize,
    /// Messages accepted by the gateway.
    pub sent: usize,
    /// Students whose message failed.
    pub failed: usize,
    /// Students skipped without a send.
    pub skipped: usize,
}

/// Outcome of one dispatch run.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DispatchReport {
    /// Unique run identifier.
    pub run_id: String,
    /// Notification kind of the run.
    pub kind: NotificationKind,
    /// Whether the run rendered messages without sending them.
    pub dry_run: bool,
    /// When the first student was attempted.
    pub started_at: DateTime<Utc>,
    /// When the last student finished.
    pub finished_at: DateTime<Utc>,
    /// Counts by outcome.
    pub summary: DispatchSummary,
    /// Per-student outcomes in dispatch order.
    pub outcomes: Vec<StudentOutcome>,
}

impl DispatchReport {
    /// Source record ids whose `messaged` flag the caller should now set.
    ///
    /// Only records covered by a successful send are included.
    #[must_use]
    pub fn messaged_record_ids(&self) -> Vec<i64> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_sent())
            .flat_map(|outcome| outcome.record_ids.iter().copied())
            .collect()
    }

    /// Outcome for `student_id`, if the student was part of the run.
    #[must_use]
    pub fn outcome(&self, student_id: &str) -> Option<&StudentOutcome> {
        self.outcomes
            .iter()
            .find(|outcome| outcome.student_id == student_id)
    }
}

/// Drives one send per student through an [`SmsGateway`].
pub struct Dispatcher {
    gateway: Option<Arc<dyn SmsGateway>>,
    normalizer: PhoneNormalizer,
    audit: Option<Arc<dyn AuditLogger>>,
}

impl Dispatcher {
    /// Create a dispatcher that sends through `gateway`.
    #[must_use]
    pub fn new(gateway: Arc<dyn SmsGateway>, normalizer: PhoneNormalizer) -> Self {
        Self {
            gateway: Some(gateway),
            normalizer,
            audit: None,
        }
    }

    /// Create a dispatcher that renders and normalizes but never sends.
    #[must_use]
    pub fn dry_run(normalizer: PhoneNormalizer) -> Self {
        Self {
            gateway: None,
            normalizer,
            audit: None,
        }
    }

    /// Record every outcome to `audit`.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Whether this dispatcher skips sending.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.gateway.is_none()
    }

    /// Notify every student in `groups` using `template`.
    ///
    /// Never fails as a whole: each student's error is captured in the
    /// report.
    pub async fn dispatch(
        &self,
        kind: NotificationKind,
        groups: &StudentGroups,
        template: &MessageTemplate,
    ) -> DispatchReport {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let span = info_span!("dispatch", %run_id, ?kind, students = groups.len());

        async {
            info!(dry_run = self.is_dry_run(), "dispatch started");
            self.audit(AuditEntry::new(&run_id, AuditEventType::DispatchStart));

            let mut outcomes = Vec::with_capacity(groups.len());
            let mut summary = DispatchSummary::default();

            for group in groups {
                let outcome = self.dispatch_one(group, template).await;
                self.audit_outcome(&run_id, &outcome);

                summary.total += 1;
                match outcome.delivery {
                    Delivery::Sent { .. } => summary.sent += 1,
                    Delivery::Failed { .. } => summary.failed += 1,
                    Delivery::Skipped { .. } => summary.skipped += 1,
                }
                outcomes.push(outcome);
            }

            info!(
                sent = summary.sent,
                failed = summary.failed,
                skipped = summary.skipped,
                "dispatch finished"
            );
            self.audit(
                AuditEntry::new(&run_id, AuditEventType::DispatchFinish).with_result(format!(
                    "{} sent, {} failed, {} skipped",
                    summary.sent, summary.failed, summary.skipped
                )),
            );

            DispatchReport {
                run_id: run_id.clone(),
                kind,
                dry_run: self.is_dry_run(),
                started_at,
                finished_at: Utc::now(),
                summary,
                outcomes,
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch_one(
        &self,
        group: &NotificationGroup,
        template: &MessageTemplate,
    ) -> StudentOutcome {
        let mut outcome = StudentOutcome {
            student_id: group.student_id.clone(),
            phone: None,
            message: None,
            record_ids: group.record_ids.clone(),
            delivery: Delivery::Skipped {
                reason: String::new(),
            },
        };

        let message = match template.render(group) {
            Ok(message) => message,
            Err(err) => {
                error!(student_id = %group.student_id, %err, "message template cannot be rendered");
                outcome.delivery = Delivery::Failed {
                    error: err.to_string(),
                    response: None,
                };
                return outcome;
            }
        };
        outcome.message = Some(message.clone());

        let phone = match self.normalizer.normalize_one(&group.contact_number) {
            Ok(Some(phone)) => phone,
            Ok(None) => {
                info!(student_id = %group.student_id, "prefixed number dropped by policy");
                outcome.delivery = Delivery::Skipped {
                    reason: "contact number dropped by prefixed-number policy".into(),
                };
                return outcome;
            }
            Err(err) => {
                warn!(student_id = %group.student_id, %err, "contact number rejected");
                outcome.delivery = Delivery::Failed {
                    error: err.to_string(),
                    response: None,
                };
                return outcome;
            }
        };
        outcome.phone = Some(phone.clone());

        let Some(gateway) = &self.gateway else {
            outcome.delivery = Delivery::Skipped {
                reason: "dry run".into(),
            };
            return outcome;
        };

        outcome.delivery = match gateway.send(OutboundSms { phone, message }).await {
            Ok(response) => {
                info!(student_id = %group.student_id, "sms sent");
                Delivery::Sent { response }
            }
            Err(err) => {
                warn!(student_id = %group.student_id, %err, "sms send failed");
                Delivery::Failed {
                    error: err.to_string(),
                    response: err.gateway_response().cloned(),
                }
            }
        };
        outcome
    }

    fn audit_outcome(&self, run_id: &str, outcome: &StudentOutcome) {
        if self.audit.is_none() {
            return;
        }

        let event_type = match outcome.delivery {
            Delivery::Sent { .. } => AuditEventType::MessageSent,
            Delivery::Failed { .. } => AuditEventType::MessageFailed,
            Delivery::Skipped { .. } => AuditEventType::MessageSkipped,
        };
        let mut entry = AuditEntry::new(run_id, event_type)
            .with_student(outcome.student_id.clone())
            .with_record_ids(outcome.record_ids.clone());
        if let Some(phone) = &outcome.phone {
            entry = entry.with_phone(phone.clone());
        }
        entry = match &outcome.delivery {
            Delivery::Sent { response } => entry.with_gateway_response(response.clone()),
            Delivery::Failed { error, response } => {
                let entry = entry.with_result(error.clone());
                match response {
                    Some(response) => entry.with_gateway_response(response.clone()),
                    None => entry,
                }
            }
            Delivery::Skipped { reason } => entry.with_result(reason.clone()),
        };
        self.audit(entry);
    }

    fn audit(&self, entry: AuditEntry) {
        if let Some(audit) = &self.audit {
            if let Err(err) = audit.log_entry(entry) {
                warn!(%err, "failed to write dispatch audit entry");
            }
        }
    }
}
