//! Global configuration parsing, validation, and credential loading.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::models::remark::Remark;
use crate::notify::phone::{PhoneNormalizer, PrefixedNumberPolicy, DEFAULT_COUNTRY_CODE};
use crate::notify::template::{MessageTemplate, DOCUMENT_FIELD, SUBJECTS_FIELD};
use crate::{AppError, Result};

/// OS keychain service that holds the gateway credentials.
pub const KEYRING_SERVICE: &str = "registrar-notify";

/// Environment variable fallback for the gateway API key.
pub const API_KEY_ENV: &str = "SMS_CHEF_API_KEY";

/// Environment variable fallback for the gateway device identifier.
pub const DEVICE_ID_ENV: &str = "SMS_CHEF_DEVICE_ID";

/// SMS gateway endpoint and fixed routing parameters.
///
/// Credentials are loaded at runtime via OS keychain or environment
/// variables, never from the TOML config file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GatewayConfig {
    /// Single-message send endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Routing mode understood by the gateway.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// SIM slot of the sending device.
    #[serde(default = "default_one")]
    pub sim: u8,
    /// Delivery priority.
    #[serde(default = "default_one")]
    pub priority: u8,
    /// Per-request timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Gateway API secret (populated at runtime).
    #[serde(skip)]
    pub api_key: String,
    /// Sending device identifier (populated at runtime).
    #[serde(skip)]
    pub device_id: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            mode: default_mode(),
            sim: default_one(),
            priority: default_one(),
            timeout_seconds: default_timeout_seconds(),
            api_key: String::new(),
            device_id: String::new(),
        }
    }
}

fn default_endpoint() -> String {
    "https://www.cloud.smschef.com/api/send/sms".into()
}

fn default_mode() -> String {
    "devices".into()
}

fn default_one() -> u8 {
    1
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Phone normalization settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct PhoneConfig {
    /// International prefix prepended to local numbers.
    #[serde(default = "default_country_code")]
    pub country_code: String,
    /// Handling of numbers that already carry the prefix.
    #[serde(default)]
    pub prefixed_policy: PrefixedNumberPolicy,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            country_code: default_country_code(),
            prefixed_policy: PrefixedNumberPolicy::default(),
        }
    }
}

fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.into()
}

/// Message templates per notification kind.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct TemplateConfig {
    /// Sent to students with ungraded subjects.
    #[serde(default = "default_incomplete_grade")]
    pub incomplete_grade: String,
    /// Sent to students with failed subjects.
    #[serde(default = "default_failed_grade")]
    pub failed_grade: String,
    /// Sent to students whose requested document is ready.
    #[serde(default = "default_requested_document")]
    pub requested_document: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            incomplete_grade: default_incomplete_grade(),
            failed_grade: default_failed_grade(),
            requested_document: default_requested_document(),
        }
    }
}

fn default_incomplete_grade() -> String {
    "Hi {first_name} {last_name}, you have an incomplete grade in: {subjects}. \
     Please contact your professor for more information."
        .into()
}

fn default_failed_grade() -> String {
    "Hi {first_name} {last_name}, you have a failed grade in: {subjects}. \
     Please contact your professor for more information."
        .into()
}

fn default_requested_document() -> String {
    "Hi {first_name} {last_name}, your {document} is now ready for pickup. \
     Please proceed to the registrar's office."
        .into()
}

/// Global configuration parsed from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct GlobalConfig {
    /// SMS gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Phone normalization settings.
    #[serde(default)]
    pub phone: PhoneConfig,
    /// Message templates.
    #[serde(default)]
    pub templates: TemplateConfig,
    /// Directory for the JSONL dispatch audit trail; disabled when absent.
    #[serde(default)]
    pub audit_dir: Option<PathBuf>,
}

impl GlobalConfig {
    /// Load and validate configuration from a TOML file path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the file cannot be read or contains
    /// invalid TOML, or if validation fails.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|err| AppError::Config(format!("failed to read config: {err}")))?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if parsing or validation fails.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load gateway credentials from OS keychain with env-var fallback.
    ///
    /// Tries the `registrar-notify` keyring service first, then falls back
    /// to `SMS_CHEF_API_KEY` / `SMS_CHEF_DEVICE_ID`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if neither keychain nor env vars provide
    /// the required credentials.
    pub async fn load_credentials(&mut self) -> Result<()> {
        self.gateway.api_key = load_credential("sms_api_key", API_KEY_ENV).await?;
        self.gateway.device_id = load_credential("sms_device_id", DEVICE_ID_ENV).await?;
        Ok(())
    }

    /// Template for a grade remark.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` for `Remark::Passed`, which is never
    /// notified, or `AppError::Template` if the template does not parse.
    pub fn grade_template(&self, remark: Remark) -> Result<MessageTemplate> {
        let source = match remark {
            Remark::Failed => &self.templates.failed_grade,
            Remark::Incomplete => &self.templates.incomplete_grade,
            Remark::Passed => {
                return Err(AppError::Config(
                    "passed grades have no notification template".into(),
                ))
            }
        };
        MessageTemplate::parse(source)
    }

    /// Template for ready document requests.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Template` if the template does not parse.
    pub fn document_template(&self) -> Result<MessageTemplate> {
        MessageTemplate::parse(&self.templates.requested_document)
    }

    /// Phone normalizer built from the `[phone]` section.
    #[must_use]
    pub fn phone_normalizer(&self) -> PhoneNormalizer {
        PhoneNormalizer::new(self.phone.country_code.clone(), self.phone.prefixed_policy)
    }

    fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.gateway.endpoint)
            .map_err(|err| AppError::Config(format!("gateway.endpoint invalid: {err}")))?;

        if self.gateway.mode.trim().is_empty() {
            return Err(AppError::Config("gateway.mode must not be empty".into()));
        }

        if self.gateway.sim == 0 {
            return Err(AppError::Config("gateway.sim must be at least 1".into()));
        }

        if self.gateway.timeout_seconds == 0 {
            return Err(AppError::Config(
                "gateway.timeout_seconds must be greater than zero".into(),
            ));
        }

        let code = &self.phone.country_code;
        let digits = code.strip_prefix('+').unwrap_or_default();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::Config(format!(
                "phone.country_code must look like +63, got {code:?}"
            )));
        }

        for remark in [Remark::Failed, Remark::Incomplete] {
            self.grade_template(remark)
                .and_then(|template| template.ensure_fields(&[SUBJECTS_FIELD]))
                .map_err(|err| AppError::Config(format!("{remark} grade template: {err}")))?;
        }

        self.document_template()
            .and_then(|template| template.ensure_fields(&[DOCUMENT_FIELD]))
            .map_err(|err| AppError::Config(format!("document template: {err}")))?;

        Ok(())
    }
}

/// Load a single credential from OS keychain with env-var fallback.
async fn load_credential(keyring_key: &str, env_key: &str) -> Result<String> {
    let key = keyring_key.to_owned();

    // keyring is synchronous I/O.
    let keychain_result = tokio::task::spawn_blocking(move || {
        keyring::Entry::new(KEYRING_SERVICE, &key).and_then(|entry| entry.get_password())
    })
    .await
    .map_err(|err| AppError::Config(format!("keychain task panicked: {err}")))?;

    match keychain_result {
        Ok(value) if !value.is_empty() => return Ok(value),
        Ok(_) => {
            warn!(key = keyring_key, "keychain entry is empty, trying env var");
        }
        Err(err) => {
            warn!(
                key = keyring_key,
                ?err,
                "keychain lookup failed, trying env var"
            );
        }
    }

    match env::var(env_key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!(
            "credential {keyring_key} not found in keychain or {env_key} env var"
        ))),
    }
}
