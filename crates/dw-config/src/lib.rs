//! dw-config
//!
//! Persisted state and process settings.
//!
//! Architectural decisions:
//! - State is one JSON snapshot: work week, date list, provider config
//! - Legacy layouts are upgraded on load and flagged for re-save
//! - Saves are atomic (temp file + rename)
//! - Secrets come from the environment, resolved once, redacted in `Debug`

pub mod migrate;
pub mod secrets;
pub mod snapshot;
pub mod store;

pub use migrate::{migrate, Migration};
pub use secrets::{
    ResolvedSecrets, Settings, DEFAULT_DAEMON_ADDR, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_STATE_PATH, ENV_DAEMON_ADDR, ENV_FETCH_TIMEOUT_SECS, ENV_PROVIDER_KEY, ENV_STATE_PATH,
};
pub use snapshot::{Loaded, StateSnapshot};
pub use store::{JsonFileStore, StateStore};
