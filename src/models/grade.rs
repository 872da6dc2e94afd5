//! Grade record model and its joined notification row.

use serde::{Deserialize, Serialize};

use super::remark::{infer_remark, Remark};
use super::student::StudentInfo;

/// A row of the `grades` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeRecord {
    /// Unique record identifier.
    pub grade_id: i64,
    /// Owning student.
    pub student_id: String,
    /// Numeric grade; `None` while ungraded.
    pub grade: Option<f64>,
    /// Stored remark identifier, derived from `grade` when written.
    pub remark_id: i64,
    /// School year the subject was taken.
    pub year: i64,
    /// Semester the subject was taken.
    pub sem: i64,
    /// Subject code.
    pub subject_code: String,
    /// Whether the student has already been notified about this record.
    #[serde(default)]
    pub messaged: bool,
}

impl GradeRecord {
    /// Remark implied by the numeric grade.
    #[must_use]
    pub fn inferred_remark(&self) -> Remark {
        infer_remark(self.grade)
    }

    /// Remark as stored in the record, if the identifier is known.
    #[must_use]
    pub fn stored_remark(&self) -> Option<Remark> {
        Remark::from_id(self.remark_id)
    }

    /// Whether the stored remark agrees with the numeric grade.
    #[must_use]
    pub fn remark_is_consistent(&self) -> bool {
        self.stored_remark() == Some(self.inferred_remark())
    }
}

/// A row of the `subjects` table, embedded in a joined grade row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subject {
    /// Subject code.
    pub code: String,
    /// Human-readable subject title.
    pub title: String,
    /// Credit units.
    #[serde(default)]
    pub units: Option<f64>,
}

/// A grade record joined with its student and subject.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradeRow {
    /// The grade record itself.
    #[serde(flatten)]
    pub record: GradeRecord,
    /// Embedded student identity and contact number.
    pub student_info: StudentInfo,
    /// Embedded subject detail.
    #[serde(rename = "subjects")]
    pub subject: Subject,
}

impl GradeRow {
    /// Description used in notification messages, e.g.
    /// `Calculus (Year: 1, Sem: 1)`.
    #[must_use]
    pub fn subject_description(&self) -> String {
        format!(
            "{} (Year: {}, Sem: {})",
            self.subject.title, self.record.year, self.record.sem
        )
    }

    /// Whether this row is pending a notification for `remark`.
    ///
    /// Rows are selected by their stored remark, matching the record
    /// source's "not yet messaged" query.
    #[must_use]
    pub fn is_pending(&self, remark: Remark) -> bool {
        !self.record.messaged && self.record.stored_remark() == Some(remark)
    }
}
