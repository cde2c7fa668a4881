//! Provider factory.

use std::sync::Arc;

use crate::error::{ProviderError, Result};
use crate::traits::DnsProvider;
use crate::types::ProviderCredentials;

#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;
#[cfg(feature = "route53")]
use crate::providers::Route53Provider;

/// Creates a [`DnsProvider`] from credentials.
///
/// The concrete provider is picked by the [`ProviderCredentials`] variant. A
/// variant whose feature flag is disabled yields
/// [`ProviderError::InvalidParameter`].
///
/// ```rust,no_run
/// use mail_dns_provider::{create_provider, ProviderCredentials};
///
/// let provider = create_provider(ProviderCredentials::Cloudflare {
///     api_token: "your-token".to_string(),
/// })?;
/// # Ok::<(), mail_dns_provider::ProviderError>(())
/// ```
pub fn create_provider(credentials: ProviderCredentials) -> Result<Arc<dyn DnsProvider>> {
    match credentials {
        #[cfg(feature = "cloudflare")]
        ProviderCredentials::Cloudflare { api_token } => {
            Ok(Arc::new(CloudflareProvider::new(api_token)?))
        }
        #[cfg(feature = "route53")]
        ProviderCredentials::Route53 {
            access_key_id,
            secret_access_key,
            region,
        } => Ok(Arc::new(Route53Provider::new(
            access_key_id,
            secret_access_key,
            region,
        )?)),
        #[allow(unreachable_patterns)]
        other => Err(ProviderError::InvalidParameter {
            provider: other.provider_type().to_string(),
            param: "provider".to_string(),
            detail: format!("{} support is not compiled in", other.provider_type()),
        }),
    }
}
