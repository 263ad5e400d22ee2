use std::fmt;

/// Errors a [`HolidayProvider`](crate::HolidayProvider) may return.
///
/// `Display` output doubles as the user-facing status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// A required configuration value is missing or invalid.
    Config(String),
    /// Network or transport failure.
    Transport(String),
    /// Upstream answered with a non-success HTTP status.
    Http { status: u16, reason: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The provider no longer offers a usable service.
    Retired(String),
    /// The whole fetch exceeded its time budget.
    Timeout { secs: u64 },
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderError::Config(msg) => write!(f, "{msg}"),
            ProviderError::Transport(msg) => write!(f, "transport error: {msg}"),
            ProviderError::Http { status, reason } => {
                write!(f, "api response status: {status} - {reason}")
            }
            ProviderError::Decode(msg) => write!(f, "decode error: {msg}"),
            ProviderError::Retired(msg) => write!(f, "{msg}"),
            ProviderError::Timeout { secs } => write!(f, "provider timed out after {secs}s"),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        // The request URL can carry an api key in its query.
        let e = e.without_url();
        if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}
