//! Notification pipeline: group pending rows, render, normalize, dispatch.

pub mod dispatcher;
pub mod group;
pub mod phone;
pub mod template;

use crate::config::GlobalConfig;
use crate::models::grade::GradeRow;
use crate::models::remark::Remark;
use crate::models::request::DocumentRow;
use crate::{AppError, Result};

pub use dispatcher::{DispatchReport, Dispatcher, NotificationKind};
pub use group::{NotificationGroup, StudentGroups};

/// Notify students whose pending grade rows carry `remark`.
///
/// Rows that are already messaged or carry another remark are ignored.
///
/// # Errors
///
/// Returns `AppError::Config` for `Remark::Passed` or when the configured
/// template does not parse. Per-student failures are reported, not returned.
pub async fn notify_grades(
    dispatcher: &Dispatcher,
    config: &GlobalConfig,
    rows: &[GradeRow],
    remark: Remark,
) -> Result<DispatchReport> {
    let kind = NotificationKind::for_remark(remark)
        .ok_or_else(|| AppError::Config(format!("{remark} grades are not notified")))?;
    let template = config.grade_template(remark)?;
    let groups = StudentGroups::from_grade_rows(group::pending_grade_rows(rows, remark));
    Ok(dispatcher.dispatch(kind, &groups, &template).await)
}

/// Notify students whose requested documents are ready for pickup.
///
/// # Errors
///
/// Returns `AppError::Template` when the configured template does not
/// parse. Per-student failures are reported, not returned.
pub async fn notify_documents(
    dispatcher: &Dispatcher,
    config: &GlobalConfig,
    rows: &[DocumentRow],
) -> Result<DispatchReport> {
    let template = config.document_template()?;
    let groups = StudentGroups::from_document_rows(group::pending_document_rows(rows));
    Ok(dispatcher
        .dispatch(NotificationKind::RequestedDocument, &groups, &template)
        .await)
}
