use serde::{Deserialize, Serialize};

/// Error returned by every DNS hosting API operation.
///
/// Each variant carries the `provider` that produced it. Variants serialize with
/// a `code` tag so callers can persist or forward them unchanged.
///
/// [`NetworkError`](Self::NetworkError), [`Timeout`](Self::Timeout) and
/// [`RateLimited`](Self::RateLimited) are transient; the HTTP layer retries them
/// with exponential backoff before surfacing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// Connection refused, DNS failure, or a 502/503/504 from the API.
    NetworkError {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The API rejected the credentials (HTTP 401 or an equivalent error code).
    InvalidCredentials {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The credentials are valid but lack a required scope (HTTP 403).
    PermissionDenied {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A record with the same name, type and content already exists.
    RecordExists {
        /// Provider that produced the error.
        provider: String,
        /// Name of the conflicting record.
        record_name: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The record to delete does not exist.
    RecordNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Identifier of the missing record.
        record_id: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// No zone hosted by this account covers the domain.
    DomainNotFound {
        /// Provider that produced the error.
        provider: String,
        /// Domain or zone that was looked up.
        domain: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// A request parameter was rejected.
    InvalidParameter {
        /// Provider that produced the error.
        provider: String,
        /// Name of the offending parameter.
        param: String,
        /// What was wrong with it.
        detail: String,
    },

    /// The account hit a hard limit (record count, zone count).
    QuotaExceeded {
        /// Provider that produced the error.
        provider: String,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The API asked the caller to slow down (HTTP 429, `Throttling`).
    RateLimited {
        /// Provider that produced the error.
        provider: String,
        /// Seconds to wait before retrying, when the API says.
        retry_after: Option<u64>,
        /// Original error message from the provider API, if available.
        raw_message: Option<String>,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Provider that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The response body could not be decoded.
    ParseError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// The request body could not be encoded.
    SerializationError {
        /// Provider that produced the error.
        provider: String,
        /// Details about the serialization failure.
        detail: String,
    },

    /// An API error code that has no dedicated variant.
    Unknown {
        /// Provider that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl ProviderError {
    /// Errors caused by user input or account state rather than by this library
    /// or the network. Callers log these at `warn` instead of `error`.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::PermissionDenied { .. }
                | Self::RecordExists { .. }
                | Self::RecordNotFound { .. }
                | Self::DomainNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::QuotaExceeded { .. }
        )
    }

    /// Transient failures worth retrying.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// Credential failures (invalid or under-scoped).
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. } | Self::PermissionDenied { .. }
        )
    }

    /// Name of the provider that produced this error.
    pub fn provider(&self) -> &str {
        match self {
            Self::NetworkError { provider, .. }
            | Self::InvalidCredentials { provider, .. }
            | Self::PermissionDenied { provider, .. }
            | Self::RecordExists { provider, .. }
            | Self::RecordNotFound { provider, .. }
            | Self::DomainNotFound { provider, .. }
            | Self::InvalidParameter { provider, .. }
            | Self::QuotaExceeded { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::ParseError { provider, .. }
            | Self::SerializationError { provider, .. }
            | Self::Unknown { provider, .. } => provider,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Invalid credentials: {msg}"),
                None => write!(f, "[{provider}] Invalid credentials"),
            },
            Self::PermissionDenied {
                provider,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Permission denied: {msg}"),
                None => write!(f, "[{provider}] Permission denied"),
            },
            Self::RecordExists {
                provider,
                record_name,
                ..
            } => write!(f, "[{provider}] Record '{record_name}' already exists"),
            Self::RecordNotFound {
                provider,
                record_id,
                ..
            } => write!(f, "[{provider}] Record '{record_id}' not found"),
            Self::DomainNotFound {
                provider,
                domain,
                raw_message,
            } => match raw_message {
                Some(msg) => write!(f, "[{provider}] Zone for '{domain}' not found: {msg}"),
                None => write!(f, "[{provider}] Zone for '{domain}' not found"),
            },
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => write!(f, "[{provider}] Invalid parameter '{param}': {detail}"),
            Self::QuotaExceeded { provider, .. } => write!(f, "[{provider}] Quota exceeded"),
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => match retry_after {
                Some(secs) => write!(f, "[{provider}] Rate limited (retry after {secs}s)"),
                None => write!(f, "[{provider}] Rate limited"),
            },
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::SerializationError { provider, detail } => {
                write!(f, "[{provider}] Serialization error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => write!(f, "[{provider}] {raw_message}"),
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
