#![forbid(unsafe_code)]

//! Registrar SMS notifications: remark inference, per-student grouping of
//! pending grade and document rows, template rendering, phone
//! normalization, and sequential dispatch to an SMS gateway.

pub mod audit;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod notify;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
