//! Runtime secret and environment resolution.
//!
//! # Contract
//! - The provider key may be left out of the state file and supplied through
//!   `DW_PROVIDER_KEY` instead.
//! - Binaries resolve once at startup and pass the result down; nothing else
//!   reads the environment.
//! - `Debug` impls redact secret values.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dw_provider::ApiConfig;

pub const ENV_PROVIDER_KEY: &str = "DW_PROVIDER_KEY";
pub const ENV_STATE_PATH: &str = "DW_STATE_PATH";
pub const ENV_DAEMON_ADDR: &str = "DW_DAEMON_ADDR";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "DW_FETCH_TIMEOUT_SECS";

pub const DEFAULT_STATE_PATH: &str = "daywatch.json";
pub const DEFAULT_DAEMON_ADDR: &str = "127.0.0.1:8898";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

/// Secrets resolved from the environment.
#[derive(Clone, Default)]
pub struct ResolvedSecrets {
    pub provider_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field(
                "provider_key",
                &self.provider_key.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

impl ResolvedSecrets {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            provider_key: non_blank(lookup(ENV_PROVIDER_KEY)),
        }
    }

    /// `api` with the environment key filled in where the stored key is empty.
    ///
    /// The result is for fetching only; persist the original.
    pub fn apply(&self, api: &ApiConfig) -> ApiConfig {
        let mut effective = api.clone();
        if effective.key.trim().is_empty() {
            if let Some(key) = &self.provider_key {
                effective.key.clone_from(key);
            }
        }
        effective
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Process-level settings for the binaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub state_path: PathBuf,
    pub daemon_addr: SocketAddr,
    pub fetch_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let state_path = non_blank(lookup(ENV_STATE_PATH))
            .unwrap_or_else(|| DEFAULT_STATE_PATH.to_string());

        let addr_raw = non_blank(lookup(ENV_DAEMON_ADDR))
            .unwrap_or_else(|| DEFAULT_DAEMON_ADDR.to_string());
        let daemon_addr: SocketAddr = addr_raw
            .parse()
            .with_context(|| format!("{ENV_DAEMON_ADDR} is not a socket address: '{addr_raw}'"))?;

        let fetch_timeout_secs = match non_blank(lookup(ENV_FETCH_TIMEOUT_SECS)) {
            None => DEFAULT_FETCH_TIMEOUT_SECS,
            Some(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("{ENV_FETCH_TIMEOUT_SECS} is not a number: '{raw}'"))?,
        };

        Ok(Self {
            state_path: PathBuf::from(state_path),
            daemon_addr,
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        })
    }
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
