//! Local to international phone-number normalization for the SMS gateway.

use serde::Deserialize;

use crate::{AppError, Result};

/// Country prefix used when the configuration does not override it.
pub const DEFAULT_COUNTRY_CODE: &str = "+63";

/// What to do with numbers that already carry the country prefix.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PrefixedNumberPolicy {
    /// Pass the number through unchanged.
    #[default]
    Keep,
    /// Omit the number from the output.
    Drop,
}

/// Normalizes local numbers into international format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNormalizer {
    country_code: String,
    policy: PrefixedNumberPolicy,
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CODE, PrefixedNumberPolicy::Keep)
    }
}

impl PhoneNormalizer {
    /// Create a normalizer for `country_code` (e.g. `+63`).
    #[must_use]
    pub fn new(country_code: impl Into<String>, policy: PrefixedNumberPolicy) -> Self {
        Self {
            country_code: country_code.into(),
            policy,
        }
    }

    /// Configured country prefix.
    #[must_use]
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Configured policy for already-prefixed numbers.
    #[must_use]
    pub fn policy(&self) -> PrefixedNumberPolicy {
        self.policy
    }

    /// Normalize a batch of numbers, preserving order.
    ///
    /// Under [`PrefixedNumberPolicy::Keep`] the output has one entry per
    /// input. Only [`PrefixedNumberPolicy::Drop`] can shorten it.
    ///
    /// # Errors
    ///
    /// Returns the `AppError::Validation` of the first entry that cannot be
    /// normalized (blank, or a bare trunk `0`).
    pub fn normalize_numbers<I, S>(&self, numbers: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        numbers
            .into_iter()
            .filter_map(|number| self.normalize_one(number.as_ref()).transpose())
            .collect()
    }

    /// Normalize a single number.
    ///
    /// Returns `Ok(None)` when the number is already prefixed and the
    /// policy drops such numbers.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if the number is blank or consists of
    /// nothing but the trunk `0`.
    pub fn normalize_one(&self, raw: &str) -> Result<Option<String>> {
        let number = raw.trim();
        if number.is_empty() {
            return Err(AppError::Validation("contact number is empty".into()));
        }

        if number.starts_with(self.country_code.as_str()) {
            return Ok(match self.policy {
                PrefixedNumberPolicy::Keep => Some(number.to_owned()),
                PrefixedNumberPolicy::Drop => None,
            });
        }

        let subscriber = number.strip_prefix('0').unwrap_or(number);
        if subscriber.is_empty() {
            return Err(AppError::Validation(format!(
                "contact number {number:?} has no subscriber digits"
            )));
        }

        Ok(Some(format!("{}{subscriber}", self.country_code)))
    }
}

/// Normalize numbers with the default `+63` prefix, keeping prefixed numbers.
///
/// # Errors
///
/// See [`PhoneNormalizer::normalize_numbers`].
pub fn normalize_numbers<I, S>(numbers: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    PhoneNormalizer::default().normalize_numbers(numbers)
}
