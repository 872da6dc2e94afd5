//! Error types shared across the application.

use std::fmt::{Display, Formatter};

/// Shared application result type.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error enumeration covering all domain failure modes.
#[derive(Debug)]
pub enum AppError {
    /// Configuration parsing, validation, or credential loading failure.
    Config(String),
    /// Template referenced a field the aggregate does not provide, or is malformed.
    Template(String),
    /// SMS gateway transport failure or a response without a JSON body.
    Gateway(String),
    /// The gateway answered with JSON but did not accept the message.
    GatewayRejected {
        /// Short description of the rejection.
        reason: String,
        /// Payload exactly as the gateway returned it.
        response: serde_json::Value,
    },
    /// Input value rejected by a domain check (grade entry, phone number).
    Validation(String),
    /// Input rows or gateway payload could not be decoded.
    Parse(String),
    /// File-system or I/O operation failure.
    Io(String),
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Template(msg) => write!(f, "template: {msg}"),
            Self::Gateway(msg) => write!(f, "gateway: {msg}"),
            Self::GatewayRejected { reason, .. } => write!(f, "gateway: {reason}"),
            Self::Validation(msg) => write!(f, "validation: {msg}"),
            Self::Parse(msg) => write!(f, "parse: {msg}"),
            Self::Io(msg) => write!(f, "io: {msg}"),
        }
    }
}

impl AppError {
    /// Gateway payload attached to a rejection, if any.
    #[must_use]
    pub fn gateway_response(&self) -> Option<&serde_json::Value> {
        match self {
            Self::GatewayRejected { response, .. } => Some(response),
            _ => None,
        }
    }
}

impl std::error::Error for AppError {}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(format!("invalid config: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Gateway(format!("request timed out: {err}"))
        } else {
            Self::Gateway(err.to_string())
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
