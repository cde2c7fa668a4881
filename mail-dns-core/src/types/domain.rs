//! Mail-sending domain type definitions

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mail_dns_provider::ProviderType;

use super::progress::SetupProgress;
use crate::crypto::EncryptedEnvelope;

/// How the DNS records for a domain get published
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    /// The customer copies the records into their DNS host by hand
    Manual,
    /// The customer adds one CNAME; records live in the service zone
    Subdomain,
    /// Records are created through the Cloudflare API
    Cloudflare,
    /// Records are created through the Route53 API
    Route53,
}

impl VerificationMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Subdomain => "subdomain",
            Self::Cloudflare => "cloudflare",
            Self::Route53 => "route53",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Manual => "Manual",
            Self::Subdomain => "Subdomain delegation",
            Self::Cloudflare => "Cloudflare",
            Self::Route53 => "Route53",
        }
    }

    /// Whether setup needs customer DNS API credentials.
    pub fn requires_credentials(self) -> bool {
        self.provider_type().is_some()
    }

    /// DNS hosting API behind this method, if any.
    pub fn provider_type(self) -> Option<ProviderType> {
        match self {
            Self::Cloudflare => Some(ProviderType::Cloudflare),
            Self::Route53 => Some(ProviderType::Route53),
            Self::Manual | Self::Subdomain => None,
        }
    }
}

impl fmt::Display for VerificationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A customer's mail-sending domain row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Domain {
    /// Domain ID
    pub id: String,
    /// Owning user; the delegation label is derived from it
    pub user_id: String,
    /// Domain name (lowercase FQDN)
    pub name: String,
    pub verification_method: VerificationMethod,
    pub automation_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_provider: Option<VerificationMethod>,
    /// Encrypted [`StoredAutomationConfig`](super::StoredAutomationConfig); never plaintext
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automation_config: Option<EncryptedEnvelope>,
    /// Delegation CNAME host (`mail-<short user id>.<domain>`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdomain: Option<String>,
    /// Ownership token published in the verification TXT record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setup_progress: Option<SetupProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_verification_attempt: Option<DateTime<Utc>>,
    /// Verification polls in the current run
    #[serde(default)]
    pub verification_attempts: u32,
    /// Polls in a row that hit DNS lookup errors
    #[serde(default)]
    pub consecutive_lookup_errors: u32,
    /// Number of the current setup run; scheduled polls of older runs are dropped
    #[serde(default)]
    pub setup_run: u64,
    /// Bumped by the repository on every write
    #[serde(default)]
    pub version: u64,
}

impl Domain {
    /// New domain row with no setup started.
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
        verification_method: VerificationMethod,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: name.into(),
            verification_method,
            automation_enabled: false,
            automation_provider: None,
            automation_config: None,
            subdomain: None,
            verification_token: None,
            setup_progress: None,
            last_verification_attempt: None,
            verification_attempts: 0,
            consecutive_lookup_errors: 0,
            setup_run: 0,
            version: 0,
        }
    }

    /// Step of the current setup run, if one was started.
    pub fn current_step(&self) -> Option<super::SetupStep> {
        self.setup_progress.as_ref().map(|p| p.step)
    }
}
