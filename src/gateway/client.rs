//! HTTP client for the hosted SMS gateway.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, warn};

use super::{OutboundSms, SmsGateway};
use crate::config::GatewayConfig;
use crate::{AppError, Result};

/// Status value the gateway reports for an accepted message.
const SUCCESS_STATUS: i64 = 200;

/// Sends messages through the gateway's single-message endpoint, one
/// POST per recipient.
pub struct SmsChefGateway {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
    device_id: String,
    mode: String,
    sim: u8,
    priority: u8,
}

impl std::fmt::Debug for SmsChefGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmsChefGateway")
            .field("endpoint", &self.endpoint.as_str())
            .field("device_id", &self.device_id)
            .field("mode", &self.mode)
            .field("sim", &self.sim)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

impl SmsChefGateway {
    /// Build a client from validated gateway configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the API key or device identifier is
    /// missing, the endpoint is not a URL, or the HTTP client cannot be
    /// built.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(AppError::Config("gateway api key is not set".into()));
        }
        if config.device_id.trim().is_empty() {
            return Err(AppError::Config("gateway device id is not set".into()));
        }

        let endpoint = Url::parse(&config.endpoint)
            .map_err(|err| AppError::Config(format!("gateway endpoint invalid: {err}")))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|err| AppError::Config(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
            device_id: config.device_id.clone(),
            mode: config.mode.clone(),
            sim: config.sim,
            priority: config.priority,
        })
    }

    fn request_url(&self, sms: &OutboundSms) -> Result<Url> {
        let params = [
            ("secret", self.api_key.clone()),
            ("mode", self.mode.clone()),
            ("device", self.device_id.clone()),
            ("sim", self.sim.to_string()),
            ("priority", self.priority.to_string()),
            ("phone", sms.phone.clone()),
            ("message", sms.message.clone()),
        ];
        Url::parse_with_params(self.endpoint.as_str(), &params)
            .map_err(|err| AppError::Gateway(format!("failed to build request url: {err}")))
    }

    async fn post(&self, sms: OutboundSms) -> Result<Value> {
        let url = self.request_url(&sms)?;
        debug!(phone = %sms.phone, "posting sms to gateway");

        let response = self.http.post(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(phone = %sms.phone, %status, "gateway returned http error");
            return Err(match serde_json::from_str::<Value>(&body) {
                Ok(response) => AppError::GatewayRejected {
                    reason: format!("http {status}"),
                    response,
                },
                Err(_) => AppError::Gateway(format!("http {status}: {body}")),
            });
        }

        let payload: Value = serde_json::from_str(&body)
            .map_err(|err| AppError::Gateway(format!("response is not json: {err}")))?;

        check_payload(&payload)?;
        Ok(payload)
    }
}

/// Reject payloads whose numeric `status` field reports a failure.
///
/// # Errors
///
/// Returns `AppError::GatewayRejected` carrying the whole payload when
/// `status` is present and not 200.
pub fn check_payload(payload: &Value) -> Result<()> {
    match payload.get("status").and_then(Value::as_i64) {
        Some(status) if status != SUCCESS_STATUS => {
            let message = payload
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no message");
            Err(AppError::GatewayRejected {
                reason: format!("status {status}: {message}"),
                response: payload.clone(),
            })
        }
        _ => Ok(()),
    }
}

impl SmsGateway for SmsChefGateway {
    fn send(
        &self,
        sms: OutboundSms,
    ) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        Box::pin(self.post(sms))
    }
}
