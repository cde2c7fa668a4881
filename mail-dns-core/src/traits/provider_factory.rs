//! Provider construction seam

use std::sync::Arc;

use mail_dns_provider::{DnsProvider, ProviderCredentials};

use crate::error::CoreResult;

/// Builds DNS provider clients from credentials
///
/// Swapped out in tests to point clients at mock servers.
pub trait ProviderFactory: Send + Sync {
    fn create(&self, credentials: &ProviderCredentials) -> CoreResult<Arc<dyn DnsProvider>>;
}

/// Factory for the real provider APIs
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProviderFactory;

impl ProviderFactory for DefaultProviderFactory {
    fn create(&self, credentials: &ProviderCredentials) -> CoreResult<Arc<dyn DnsProvider>> {
        Ok(mail_dns_provider::create_provider(credentials.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_provider() {
        let cf = DefaultProviderFactory
            .create(&ProviderCredentials::Cloudflare {
                api_token: "t".to_string(),
            })
            .unwrap();
        assert_eq!(cf.id(), "cloudflare");

        let r53 = DefaultProviderFactory
            .create(&ProviderCredentials::Route53 {
                access_key_id: "AKIA".to_string(),
                secret_access_key: "s".to_string(),
                region: None,
            })
            .unwrap();
        assert_eq!(r53.id(), "route53");
    }
}
