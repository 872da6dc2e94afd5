//! Outbound SMS gateway abstraction.
//!
//! The [`SmsGateway`] trait decouples the dispatcher from the transport so
//! that batches can be driven against the hosted gateway or a test double.

pub mod client;

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::Result;

pub use client::SmsChefGateway;

/// A single text message addressed to one recipient.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OutboundSms {
    /// Recipient in international format.
    pub phone: String,
    /// Rendered message body.
    pub message: String,
}

/// Transport that delivers one [`OutboundSms`] per call.
pub trait SmsGateway: Send + Sync {
    /// Send one message and return the gateway's JSON response unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::GatewayRejected`](crate::AppError::GatewayRejected)
    /// with the payload when the gateway answered with JSON but refused the
    /// message, and [`AppError::Gateway`](crate::AppError::Gateway) on a
    /// transport failure or a body that is not JSON.
    fn send(
        &self,
        sms: OutboundSms,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value>> + Send + '_>>;
}
