//! Automation settings
//!
//! Loaded from TOML; every field has a default so a partial file is enough.
//!
//! ```toml
//! service_name = "signtusk"
//! controlled_domain = "mail.signtusk.com"
//! dkim_selector = "signtusk"
//! dkim_public_key = "MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQ..."
//! spf_include = "_spf.signtusk.com"
//!
//! [service_provider]
//! provider = "cloudflare"
//! credentials = { api_token = "..." }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use mail_dns_provider::ProviderCredentials;

use crate::error::{CoreError, CoreResult};
use crate::records::validate_domain_name;
use crate::types::VerificationMethod;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationSettings {
    /// Used in the ownership record name and value
    pub service_name: String,
    /// Service-owned domain that delegation CNAMEs point to
    pub controlled_domain: String,
    pub dkim_selector: String,
    /// Base64 DKIM public key (the `p=` tag)
    pub dkim_public_key: String,
    pub spf_include: String,
    pub dmarc_policy: String,
    /// Aggregate report address (`rua=mailto:`)
    pub dmarc_rua: String,
    pub record_ttl: u32,
    /// Bound on every provider or resolver call
    pub adapter_timeout_secs: u64,
    /// Delay between verification polls
    pub verification_delay_secs: u64,
    pub max_verification_attempts: u32,
    /// Consecutive lookup-error polls tolerated for cloudflare/route53
    pub provider_lookup_error_threshold: u32,
    /// Consecutive lookup-error polls tolerated for manual/subdomain
    pub dns_lookup_error_threshold: u32,
    /// Service account that owns the controlled zone (subdomain method)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<ProviderCredentials>,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            service_name: "signtusk".to_string(),
            controlled_domain: "mail.signtusk.com".to_string(),
            dkim_selector: "signtusk".to_string(),
            dkim_public_key: String::new(),
            spf_include: "_spf.signtusk.com".to_string(),
            dmarc_policy: "none".to_string(),
            dmarc_rua: "dmarc@signtusk.com".to_string(),
            record_ttl: 3600,
            adapter_timeout_secs: 10,
            verification_delay_secs: 300,
            max_verification_attempts: 288,
            provider_lookup_error_threshold: 3,
            dns_lookup_error_threshold: 6,
            service_provider: None,
        }
    }
}

impl AutomationSettings {
    pub fn from_toml_str(s: &str) -> CoreResult<Self> {
        let settings: Self = toml::from_str(s)
            .map_err(|e| CoreError::Configuration(format!("invalid settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.service_name.trim().is_empty()
            || !self
                .service_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(CoreError::Configuration(
                "service_name must be a non-empty DNS label".to_string(),
            ));
        }
        validate_domain_name(&self.controlled_domain).map_err(|_| {
            CoreError::Configuration(format!(
                "controlled_domain '{}' is not a valid domain",
                self.controlled_domain
            ))
        })?;
        if self.dkim_public_key.trim().is_empty() {
            return Err(CoreError::Configuration(
                "dkim_public_key is required".to_string(),
            ));
        }
        if self.spf_include.trim().is_empty() {
            return Err(CoreError::Configuration("spf_include is required".to_string()));
        }
        if !matches!(self.dmarc_policy.as_str(), "none" | "quarantine" | "reject") {
            return Err(CoreError::Configuration(format!(
                "dmarc_policy '{}' must be none, quarantine or reject",
                self.dmarc_policy
            )));
        }
        if self.adapter_timeout_secs == 0 || self.max_verification_attempts == 0 {
            return Err(CoreError::Configuration(
                "adapter_timeout_secs and max_verification_attempts must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_secs(self.adapter_timeout_secs)
    }

    pub fn verification_delay(&self) -> Duration {
        Duration::from_secs(self.verification_delay_secs)
    }

    /// Consecutive lookup-error polls after which verification gives up.
    pub fn lookup_error_threshold(&self, method: VerificationMethod) -> u32 {
        if method.requires_credentials() {
            self.provider_lookup_error_threshold
        } else {
            self.dns_lookup_error_threshold
        }
    }
}
