//! AWS Route53 DNS Provider

mod error;
mod http;
mod provider;
mod sign;
/// Route53 XML request/response types.
pub(crate) mod types;

use reqwest::Client;

use crate::error::Result;
use crate::providers::common::create_http_client;

/// Route53 is a global service; requests are signed for this region unless told otherwise.
pub(crate) const DEFAULT_REGION: &str = "us-east-1";
pub(crate) const ROUTE53_ENDPOINT: &str = "https://route53.amazonaws.com";
pub(crate) const API_VERSION: &str = "2013-04-01";
pub(crate) const XML_NAMESPACE: &str = "https://route53.amazonaws.com/doc/2013-04-01/";
/// `maxitems` for list calls (API maximum for record sets is 300).
pub(crate) const MAX_ITEMS: u32 = 100;

/// AWS Route53 provider.
///
/// Authenticates with an access key pair using AWS Signature Version 4.
///
/// ```rust,no_run
/// use mail_dns_provider::Route53Provider;
///
/// let provider = Route53Provider::builder(
///     "AKIA...".to_string(),
///     "secret".to_string(),
/// )
/// .region("eu-west-1")
/// .build()?;
/// # Ok::<(), mail_dns_provider::ProviderError>(())
/// ```
pub struct Route53Provider {
    pub(crate) client: Client,
    pub(crate) access_key_id: String,
    pub(crate) secret_access_key: String,
    pub(crate) region: String,
    pub(crate) endpoint: String,
    pub(crate) max_retries: u32,
}

/// Builder for [`Route53Provider`].
pub struct Route53ProviderBuilder {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    endpoint: String,
    max_retries: u32,
}

impl Route53ProviderBuilder {
    fn new(access_key_id: String, secret_access_key: String) -> Self {
        Self {
            access_key_id,
            secret_access_key,
            region: DEFAULT_REGION.to_string(),
            endpoint: ROUTE53_ENDPOINT.to_string(),
            max_retries: 2,
        }
    }

    /// Signing region (default `us-east-1`).
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Override the API endpoint (mock servers, VPC endpoints).
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    /// Maximum number of automatic retries for transient errors (default: 2).
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Build the [`Route53Provider`].
    pub fn build(self) -> Result<Route53Provider> {
        Ok(Route53Provider {
            client: create_http_client("route53")?,
            access_key_id: self.access_key_id,
            secret_access_key: self.secret_access_key,
            region: self.region,
            endpoint: self.endpoint,
            max_retries: self.max_retries,
        })
    }
}

impl Route53Provider {
    /// Provider with default settings against the public endpoint.
    pub fn new(
        access_key_id: String,
        secret_access_key: String,
        region: Option<String>,
    ) -> Result<Self> {
        let mut builder = Self::builder(access_key_id, secret_access_key);
        if let Some(region) = region {
            builder = builder.region(region);
        }
        builder.build()
    }

    /// Builder for customizing the provider.
    pub fn builder(access_key_id: String, secret_access_key: String) -> Route53ProviderBuilder {
        Route53ProviderBuilder::new(access_key_id, secret_access_key)
    }

    /// Host header value derived from the endpoint.
    pub(crate) fn host(&self) -> &str {
        self.endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, rest)| rest)
            .split('/')
            .next()
            .unwrap_or_default()
    }
}
