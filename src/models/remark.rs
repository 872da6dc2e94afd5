//! Grade remark inference and grade-entry validation.
//!
//! The registrar's scale is inverted: 1.0 is the best grade, 3.0 is the
//! lowest passing grade and 5.0 is a failure. An absent grade means the
//! subject has not been graded yet and is reported as incomplete.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{AppError, Result};

/// Highest grade value that still counts as passed.
pub const PASSING_THRESHOLD: f64 = 3.0;

/// Lowest grade value accepted at entry time.
pub const MIN_GRADE: f64 = 1.0;

/// Highest grade value accepted at entry time.
pub const MAX_GRADE: f64 = 5.0;

/// Categorical outcome of a grade.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Remark {
    /// Grade at or better than the passing threshold.
    Passed,
    /// Grade worse than the passing threshold.
    Failed,
    /// No grade recorded yet.
    Incomplete,
}

impl Remark {
    /// Identifier of this remark in the `remarks` table.
    #[must_use]
    pub fn id(self) -> i64 {
        match self {
            Self::Passed => 1,
            Self::Failed => 2,
            Self::Incomplete => 3,
        }
    }

    /// Resolve a `remarks` table identifier.
    #[must_use]
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Passed),
            2 => Some(Self::Failed),
            3 => Some(Self::Incomplete),
            _ => None,
        }
    }

    /// Whether students with this remark are notified at all.
    #[must_use]
    pub fn is_notifiable(self) -> bool {
        !matches!(self, Self::Passed)
    }
}

impl Display for Remark {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Incomplete => "incomplete",
        };
        f.write_str(label)
    }
}

/// Derive the remark for a grade.
#[must_use]
pub fn infer_remark(grade: Option<f64>) -> Remark {
    match grade {
        None => Remark::Incomplete,
        Some(value) if value <= PASSING_THRESHOLD => Remark::Passed,
        Some(_) => Remark::Failed,
    }
}

/// Parse a grade as typed into the grade-entry form.
///
/// An empty (or blank) entry means "not graded yet" and yields `None`.
///
/// # Errors
///
/// Returns `AppError::Validation` if the entry is not a number or lies
/// outside `1.0..=5.0`.
pub fn parse_grade(raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: f64 = trimmed
        .parse()
        .map_err(|_| AppError::Validation(format!("grade {trimmed:?} is not a number")))?;

    if !(MIN_GRADE..=MAX_GRADE).contains(&value) {
        return Err(AppError::Validation(format!(
            "grade {value} must be between {MIN_GRADE} and {MAX_GRADE}"
        )));
    }

    Ok(Some(value))
}
