//! Student identity embedded in every joined record row.

use serde::{Deserialize, Serialize};

/// A row of the `student_info` table.
///
/// Only the identity and contact fields are required; the remaining
/// columns are carried when the record source includes them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentInfo {
    /// Registrar student number.
    #[serde(default)]
    pub student_id: String,
    /// Given name.
    pub first_name: String,
    /// Middle name; absent for students without one.
    #[serde(default)]
    pub middle_name: Option<String>,
    /// Family name.
    pub last_name: String,
    /// Contact number in local (`09…`) or international (`+63…`) form.
    pub contact_number: String,
    /// Course identifier.
    #[serde(default)]
    pub course_id: Option<i64>,
    /// Current year level.
    #[serde(default)]
    pub year_level: Option<i64>,
    /// School email address.
    #[serde(default)]
    pub email: Option<String>,
}

impl StudentInfo {
    /// Middle name, or an empty string when the student has none.
    #[must_use]
    pub fn middle_name_or_empty(&self) -> &str {
        self.middle_name.as_deref().unwrap_or_default()
    }
}
