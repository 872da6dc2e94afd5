//! Structured audit trail for notification dispatch runs.
//!
//! Provides the [`AuditLogger`] trait and associated types. The primary
//! implementation, [`JsonlAuditWriter`], appends JSONL records to
//! daily-rotating files in the configured audit directory.

pub mod writer;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Event type classification for audit log entries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A dispatch run started.
    DispatchStart,
    /// The gateway accepted a message for a student.
    MessageSent,
    /// Rendering, normalization, or sending failed for a student.
    MessageFailed,
    /// A student was not sent to (dry run or dropped number).
    MessageSkipped,
    /// A dispatch run finished.
    DispatchFinish,
}

/// A structured record of one dispatch event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// ISO 8601 timestamp with timezone.
    pub timestamp: DateTime<Utc>,
    /// Dispatch run identifier.
    pub run_id: String,
    /// Event classification.
    pub event_type: AuditEventType,
    /// Student the event concerns (absent for run-level events).
    pub student_id: Option<String>,
    /// Normalized recipient number.
    pub phone: Option<String>,
    /// Source record identifiers covered by the message.
    pub record_ids: Option<Vec<i64>>,
    /// Brief result description.
    pub result_summary: Option<String>,
    /// Gateway response payload for sent messages.
    pub gateway_response: Option<serde_json::Value>,
}

impl AuditEntry {
    /// Construct a minimal audit entry for the given event type.
    #[must_use]
    pub fn new(run_id: &str, event_type: AuditEventType) -> Self {
        Self {
            timestamp: Utc::now(),
            run_id: run_id.to_owned(),
            event_type,
            student_id: None,
            phone: None,
            record_ids: None,
            result_summary: None,
            gateway_response: None,
        }
    }

    /// Set the student identifier for this entry.
    #[must_use]
    pub fn with_student(mut self, student_id: String) -> Self {
        self.student_id = Some(student_id);
        self
    }

    /// Set the normalized recipient for this entry.
    #[must_use]
    pub fn with_phone(mut self, phone: String) -> Self {
        self.phone = Some(phone);
        self
    }

    /// Set the covered source record identifiers.
    #[must_use]
    pub fn with_record_ids(mut self, record_ids: Vec<i64>) -> Self {
        self.record_ids = Some(record_ids);
        self
    }

    /// Set the result summary for this entry.
    #[must_use]
    pub fn with_result(mut self, summary: String) -> Self {
        self.result_summary = Some(summary);
        self
    }

    /// Attach the gateway response payload.
    #[must_use]
    pub fn with_gateway_response(mut self, response: serde_json::Value) -> Self {
        self.gateway_response = Some(response);
        self
    }
}

/// Writes structured audit entries to a persistent store.
///
/// Implementations must be [`Send`] and [`Sync`] to allow sharing across
/// async task boundaries via [`std::sync::Arc`].
pub trait AuditLogger: Send + Sync {
    /// Record a single audit entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying write operation fails.
    fn log_entry(&self, entry: AuditEntry) -> crate::Result<()>;
}

pub use writer::JsonlAuditWriter;
