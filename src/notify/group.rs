//! Per-student aggregation of pending record rows.
//!
//! A dispatch run notifies each student once, no matter how many of their
//! records are pending. [`StudentGroups`] folds the joined rows into one
//! [`NotificationGroup`] per `student_id`, iterating in first-seen order.

use std::collections::HashMap;

use serde::Serialize;

use crate::models::grade::GradeRow;
use crate::models::remark::Remark;
use crate::models::request::DocumentRow;
use crate::models::student::StudentInfo;

/// Row-type specific content of an aggregate.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupDetail {
    /// Subject descriptions, one per merged grade row, in input order.
    Subjects {
        /// Descriptions like `Calculus (Year: 1, Sem: 1)`.
        subjects: Vec<String>,
    },
    /// Document label of a ready request.
    ///
    /// Single-valued: when a student has several ready requests in one
    /// batch the label of the last row wins.
    Document {
        /// Document type label.
        document: String,
    },
}

/// Transient per-student aggregate used to render one message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationGroup {
    /// Grouping key.
    pub student_id: String,
    /// Given name, from the first row seen for the student.
    pub first_name: String,
    /// Middle name (empty when absent), from the first row seen.
    pub middle_name: String,
    /// Family name, from the first row seen.
    pub last_name: String,
    /// Raw contact number, from the first row seen.
    pub contact_number: String,
    /// Accumulated subject or document detail.
    pub detail: GroupDetail,
    /// Identifiers of every source record merged into this aggregate.
    pub record_ids: Vec<i64>,
}

impl NotificationGroup {
    fn from_student(student_id: &str, info: &StudentInfo, detail: GroupDetail) -> Self {
        Self {
            student_id: student_id.to_owned(),
            first_name: info.first_name.clone(),
            middle_name: info.middle_name_or_empty().to_owned(),
            last_name: info.last_name.clone(),
            contact_number: info.contact_number.clone(),
            detail,
            record_ids: Vec::new(),
        }
    }

    /// Subjects joined with `", "`, if this is a grade aggregate.
    #[must_use]
    pub fn subjects(&self) -> Option<String> {
        match &self.detail {
            GroupDetail::Subjects { subjects } => Some(subjects.join(", ")),
            GroupDetail::Document { .. } => None,
        }
    }

    /// Document label, if this is a document aggregate.
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        match &self.detail {
            GroupDetail::Document { document } => Some(document),
            GroupDetail::Subjects { .. } => None,
        }
    }

    /// Look up a template field by placeholder name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "student_id" => Some(self.student_id.clone()),
            "first_name" => Some(self.first_name.clone()),
            "middle_name" => Some(self.middle_name.clone()),
            "last_name" => Some(self.last_name.clone()),
            "subjects" => self.subjects(),
            "document" => self.document().map(ToOwned::to_owned),
            _ => None,
        }
    }
}

/// Insertion-ordered mapping from `student_id` to its aggregate.
#[derive(Debug, Clone, Default)]
pub struct StudentGroups {
    groups: Vec<NotificationGroup>,
    index: HashMap<String, usize>,
}

impl StudentGroups {
    /// Group joined grade rows by student.
    #[must_use]
    pub fn from_grade_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a GradeRow>,
    {
        let mut groups = Self::default();
        for row in rows {
            let group = groups.entry(&row.record.student_id, &row.student_info, || {
                GroupDetail::Subjects {
                    subjects: Vec::new(),
                }
            });
            if let GroupDetail::Subjects { subjects } = &mut group.detail {
                subjects.push(row.subject_description());
            }
            group.record_ids.push(row.record.grade_id);
        }
        groups
    }

    /// Group joined document rows by student.
    #[must_use]
    pub fn from_document_rows<'a, I>(rows: I) -> Self
    where
        I: IntoIterator<Item = &'a DocumentRow>,
    {
        let mut groups = Self::default();
        for row in rows {
            let group = groups.entry(&row.request.student_id, &row.student_info, || {
                GroupDetail::Document {
                    document: String::new(),
                }
            });
            if let GroupDetail::Document { document } = &mut group.detail {
                document.clone_from(&row.document_type.label);
            }
            group.record_ids.push(row.request.id);
        }
        groups
    }

    fn entry(
        &mut self,
        student_id: &str,
        info: &StudentInfo,
        detail: impl FnOnce() -> GroupDetail,
    ) -> &mut NotificationGroup {
        let position = match self.index.get(student_id) {
            Some(&position) => position,
            None => {
                let position = self.groups.len();
                self.groups
                    .push(NotificationGroup::from_student(student_id, info, detail()));
                self.index.insert(student_id.to_owned(), position);
                position
            }
        };
        &mut self.groups[position]
    }

    /// Aggregate for `student_id`, if any row mentioned the student.
    #[must_use]
    pub fn get(&self, student_id: &str) -> Option<&NotificationGroup> {
        self.index.get(student_id).map(|&position| &self.groups[position])
    }

    /// Aggregates in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &NotificationGroup> {
        self.groups.iter()
    }

    /// Number of distinct students.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no rows were grouped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl<'a> IntoIterator for &'a StudentGroups {
    type Item = &'a NotificationGroup;
    type IntoIter = std::slice::Iter<'a, NotificationGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

/// Keep only grade rows with `remark` that have not been messaged.
#[must_use]
pub fn pending_grade_rows(rows: &[GradeRow], remark: Remark) -> Vec<&GradeRow> {
    rows.iter().filter(|row| row.is_pending(remark)).collect()
}

/// Keep only ready document rows that have not been messaged.
#[must_use]
pub fn pending_document_rows(rows: &[DocumentRow]) -> Vec<&DocumentRow> {
    rows.iter().filter(|row| row.is_pending()).collect()
}
