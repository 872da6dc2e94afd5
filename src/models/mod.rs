//! Domain model module declarations.

pub mod grade;
pub mod remark;
pub mod request;
pub mod student;
