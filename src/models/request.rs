//! Student document request model and its joined notification row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::student::StudentInfo;

/// Lifecycle status of a document request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Request received; document not yet prepared.
    Pending,
    /// Document prepared and waiting for pickup.
    Ready,
    /// Document handed over to the student.
    Claimed,
}

impl RequestStatus {
    /// Identifier of this status in the `request_statuses` table.
    #[must_use]
    pub fn id(self) -> i64 {
        match self {
            Self::Pending => 1,
            Self::Ready => 2,
            Self::Claimed => 3,
        }
    }

    /// Resolve a `request_statuses` table identifier.
    #[must_use]
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Pending),
            2 => Some(Self::Ready),
            3 => Some(Self::Claimed),
            _ => None,
        }
    }
}

/// A row of the `student_requests` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StudentRequest {
    /// Unique record identifier.
    pub id: i64,
    /// Requesting student.
    pub student_id: String,
    /// Delivery mode (e.g. pickup, courier).
    #[serde(default)]
    pub mode: String,
    /// Requested document type.
    pub document_type_id: i64,
    /// Number of copies requested.
    #[serde(default)]
    pub request_amount: i64,
    /// Stated purpose of the request.
    #[serde(default)]
    pub purpose: String,
    /// Amount paid.
    #[serde(default)]
    pub total: f64,
    /// Official receipt number.
    #[serde(default, alias = "receipt_no")]
    pub receipt_number: String,
    /// Date the request was filed.
    #[serde(default)]
    pub request_date: Option<NaiveDate>,
    /// Date the document was received by the student.
    #[serde(default)]
    pub receive_date: Option<NaiveDate>,
    /// Stored status identifier.
    pub student_request_status_id: i64,
    /// Whether the student has already been notified about this request.
    #[serde(default)]
    pub messaged: bool,
}

impl StudentRequest {
    /// Status as stored in the record, if the identifier is known.
    #[must_use]
    pub fn status(&self) -> Option<RequestStatus> {
        RequestStatus::from_id(self.student_request_status_id)
    }
}

/// A row of the `document_type` table, embedded in a joined request row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentType {
    /// Document type identifier.
    #[serde(default)]
    pub id: i64,
    /// Human-readable label, e.g. `Transcript of Records`.
    #[serde(rename = "type")]
    pub label: String,
}

/// A document request joined with its student and document type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRow {
    /// The request record itself.
    #[serde(flatten)]
    pub request: StudentRequest,
    /// Embedded student identity and contact number.
    pub student_info: StudentInfo,
    /// Embedded document type.
    pub document_type: DocumentType,
}

impl DocumentRow {
    /// Whether this request is ready for pickup and not yet notified.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.request.messaged && self.request.status() == Some(RequestStatus::Ready)
    }
}
