//! Cloudflare DNS Provider

mod error;
mod http;
mod provider;
mod types;

use reqwest::Client;

use crate::error::Result;
use crate::providers::common::create_http_client;

pub(crate) use types::{CloudflareDnsRecord, CloudflareResponse, CloudflareZone};

pub(crate) const CF_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Page size used when walking the zones list (API maximum is 50).
pub(crate) const MAX_PAGE_SIZE_ZONES: u32 = 50;
/// Page size used when listing records.
pub(crate) const MAX_PAGE_SIZE_RECORDS: u32 = 100;

/// Cloudflare DNS provider.
///
/// Authenticates with an API token (`Authorization: Bearer`). The token needs
/// `Zone:Read` and `DNS:Edit` on the zones it should manage.
///
/// ```rust,no_run
/// use mail_dns_provider::CloudflareProvider;
///
/// let provider = CloudflareProvider::new("your-api-token".to_string())?;
/// # Ok::<(), mail_dns_provider::ProviderError>(())
/// ```
pub struct CloudflareProvider {
    pub(crate) client: Client,
    pub(crate) api_token: String,
    pub(crate) api_base: String,
    pub(crate) max_retries: u32,
}

/// Builder for [`CloudflareProvider`].
pub struct CloudflareProviderBuilder {
    api_token: String,
    api_base: String,
    max_retries: u32,
}

impl CloudflareProviderBuilder {
    fn new(api_token: String) -> Self {
        Self {
            api_token,
            api_base: CF_API_BASE.to_string(),
            max_retries: 2,
        }
    }

    /// Maximum number of automatic retries for transient errors (default: 2).
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Override the API base URL (mock servers, proxies).
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the [`CloudflareProvider`].
    pub fn build(self) -> Result<CloudflareProvider> {
        Ok(CloudflareProvider {
            client: create_http_client("cloudflare")?,
            api_token: self.api_token,
            api_base: self.api_base,
            max_retries: self.max_retries,
        })
    }
}

impl CloudflareProvider {
    /// Provider with default settings against the public API.
    pub fn new(api_token: String) -> Result<Self> {
        Self::builder(api_token).build()
    }

    /// Builder for customizing the provider.
    pub fn builder(api_token: String) -> CloudflareProviderBuilder {
        CloudflareProviderBuilder::new(api_token)
    }
}
