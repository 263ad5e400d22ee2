//! Persisted provider configuration (`api` block of the state snapshot).

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ProviderError;

pub const NAGER: &str = "date.nager.at";
pub const CALENDARIFIC: &str = "calendarific.com";
pub const ABSTRACTAPI: &str = "holidays.abstractapi.com";

/// Which upstream an [`ApiConfig`] points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    /// `""` or `"none"`: holidays are maintained by hand only.
    Disabled,
    Nager,
    Calendarific,
    /// Free tier withdrawn upstream; kept so old configs report something useful.
    AbstractApi,
    Unknown(String),
}

impl ProviderKind {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "" | "none" => ProviderKind::Disabled,
            NAGER => ProviderKind::Nager,
            CALENDARIFIC => ProviderKind::Calendarific,
            ABSTRACTAPI => ProviderKind::AbstractApi,
            other => ProviderKind::Unknown(other.to_string()),
        }
    }
}

/// Provider selection, credentials and fetch bookkeeping.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApiConfig {
    pub provider: String,
    /// May be left empty on disk and supplied through the environment.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    /// Date of the last fetch attempt; gates one fetch per day.
    pub last_retrieved: Option<NaiveDate>,
    /// Last status string reported for this provider.
    pub status: String,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("provider", &self.provider)
            .field("key", &if self.key.is_empty() { "" } else { "<redacted>" })
            .field("country", &self.country)
            .field("region", &self.region)
            .field("last_retrieved", &self.last_retrieved)
            .field("status", &self.status)
            .finish()
    }
}

impl ApiConfig {
    pub fn kind(&self) -> ProviderKind {
        ProviderKind::parse(&self.provider)
    }

    /// Check that everything the selected provider needs is present.
    ///
    /// The error's `Display` is the status string shown to the user.
    pub fn validate(&self) -> Result<ProviderKind, ProviderError> {
        let kind = self.kind();
        match &kind {
            ProviderKind::Disabled => {
                return Err(ProviderError::Config("no provider configured".to_string()))
            }
            ProviderKind::Unknown(name) => {
                return Err(ProviderError::Config(format!("unknown provider '{name}'")))
            }
            ProviderKind::Nager => {
                self.require(&self.country, "country")?;
                self.require(&self.region, "region")?;
            }
            ProviderKind::Calendarific => {
                self.require(&self.key, "Key")?;
                self.require(&self.country, "Country")?;
            }
            ProviderKind::AbstractApi => {}
        }
        Ok(kind)
    }

    /// Identity of the settings that affect fetching; bookkeeping fields excluded.
    pub fn fingerprint(&self) -> (String, String, String, String) {
        (
            self.provider.clone(),
            self.key.clone(),
            self.country.clone(),
            self.region.clone(),
        )
    }

    fn require(&self, value: &str, what: &str) -> Result<(), ProviderError> {
        if value.trim().is_empty() {
            return Err(ProviderError::Config(format!(
                "no {what} configured for {}",
                self.provider
            )));
        }
        Ok(())
    }
}
