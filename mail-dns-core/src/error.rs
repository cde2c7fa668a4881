//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

pub use mail_dns_provider::{CredentialValidationError, ProviderError};

use crate::types::{SetupStep, VerificationMethod};

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Domain row does not exist
    #[error("Domain not found: {0}")]
    DomainNotFound(String),

    /// Method cannot be used for the requested operation
    #[error("Unsupported verification method: {0}")]
    UnsupportedMethod(VerificationMethod),

    /// Domain name failed format validation
    #[error("Invalid domain name '{domain}': {reason}")]
    InvalidDomain { domain: String, reason: String },

    /// Automation requested without the credentials it needs
    #[error("Missing credentials for {0}")]
    MissingCredentials(VerificationMethod),

    /// Structured credential validation failure
    #[error("{0}")]
    CredentialValidation(CredentialValidationError),

    /// Settings are unusable
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Stored automation config could not be decrypted (wrong key or tampered data)
    #[error("Decryption failed: invalid key or corrupted data")]
    DecryptionFailed,

    /// Cipher setup or encryption failure
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Repository failure
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Verification job could not be queued
    #[error("Scheduler error: {0}")]
    Scheduler(String),

    /// An adapter call did not finish in time
    #[error("Operation timed out after {0}s")]
    Timeout(u64),

    /// Progress update would break the setup state machine
    #[error("Invalid progress transition: {from:?} -> {to:?}")]
    InvalidTransition { from: SetupStep, to: SetupStep },

    /// Provider error (converted from the provider library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// Whether the error is expected behavior (user input, missing resource, ...), used for log classification.
    ///
    /// Use level `warn` when this returns `true` and `error` otherwise.
    /// **Update this method when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::DomainNotFound(_)
            | Self::UnsupportedMethod(_)
            | Self::InvalidDomain { .. }
            | Self::MissingCredentials(_)
            | Self::CredentialValidation(_)
            | Self::Timeout(_) => true,
            Self::Provider(e) => e.is_expected(),
            _ => false,
        }
    }

    /// Short human-readable summary that is safe to persist in the progress row.
    ///
    /// Raw provider messages and internal details never appear here.
    #[must_use]
    pub fn user_summary(&self) -> String {
        match self {
            Self::DomainNotFound(_) => "Domain not found".to_string(),
            Self::UnsupportedMethod(m) => format!("Setup method '{m}' is not supported here"),
            Self::InvalidDomain { domain, .. } => format!("'{domain}' is not a valid domain name"),
            Self::MissingCredentials(m) => format!("{} credentials are required", m.display_name()),
            Self::CredentialValidation(e) => e.to_string(),
            Self::Configuration(_) => "Email domain setup is not configured".to_string(),
            Self::DecryptionFailed => "Stored automation settings could not be read".to_string(),
            Self::Timeout(_) => "The DNS provider did not respond in time".to_string(),
            Self::Provider(e) => provider_summary(e),
            Self::Crypto(_)
            | Self::Storage(_)
            | Self::Serialization(_)
            | Self::Scheduler(_)
            | Self::InvalidTransition { .. } => "Internal error during domain setup".to_string(),
        }
    }
}

/// Map a provider error to a message fit for end users.
pub(crate) fn provider_summary(err: &ProviderError) -> String {
    let name = provider_label(err.provider());
    match err {
        ProviderError::InvalidCredentials { .. } => {
            format!("{name} rejected the credentials")
        }
        ProviderError::PermissionDenied { .. } => {
            format!("{name} credentials lack DNS edit permission")
        }
        ProviderError::DomainNotFound { domain, .. } => {
            format!("No {name} zone found for {domain}")
        }
        ProviderError::RecordExists { record_name, .. } => {
            format!("A conflicting record already exists at {record_name}")
        }
        ProviderError::RateLimited { .. } | ProviderError::QuotaExceeded { .. } => {
            format!("{name} rate limit or quota reached, try again later")
        }
        ProviderError::NetworkError { .. } | ProviderError::Timeout { .. } => {
            format!("Could not reach {name}")
        }
        ProviderError::InvalidParameter { .. } => format!("{name} rejected the record changes"),
        _ => format!("{name} returned an unexpected error"),
    }
}

pub(crate) fn provider_label(provider: &str) -> &str {
    match provider {
        "cloudflare" => "Cloudflare",
        "route53" => "Route53",
        other => other,
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
