//! # mail-dns-provider
//!
//! Clients for the DNS hosting APIs used to publish email authentication
//! records (ownership TXT, DKIM, SPF, DMARC) on a customer's domain.
//!
//! ## Supported Providers
//!
//! | Provider | Feature Flag | Auth Method |
//! |----------|-------------|-------------|
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | Bearer Token |
//! | [AWS Route53](https://aws.amazon.com/route53/) | `route53` | AWS Signature V4 |
//!
//! ## Feature Flags
//!
//! - **`all-providers`** *(default)*: enable every provider above.
//! - **`cloudflare`**, **`route53`**: enable one provider.
//! - **`native-tls`** *(default)* / **`rustls`**: TLS backend for `reqwest`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mail_dns_provider::{
//!     create_provider, CreateDnsRecordRequest, DnsRecordType, ProviderCredentials,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = create_provider(ProviderCredentials::Cloudflare {
//!         api_token: "your-token".to_string(),
//!     })?;
//!
//!     if !provider.validate_credentials().await? {
//!         return Err("token rejected".into());
//!     }
//!
//!     let Some(zone) = provider.find_zone("mail.example.com").await? else {
//!         return Err("no zone".into());
//!     };
//!
//!     provider
//!         .create_record(&CreateDnsRecordRequest {
//!             zone_id: zone.id,
//!             record_type: DnsRecordType::Txt,
//!             name: "_dmarc.mail.example.com".to_string(),
//!             value: "v=DMARC1; p=none".to_string(),
//!             ttl: 300,
//!         })
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, ProviderError>`](ProviderError).
//! Transient errors (`NetworkError`, `Timeout`, `RateLimited`) are retried with
//! exponential backoff before they are returned.

mod error;
mod factory;
mod http_client;
mod providers;
mod traits;
mod types;
mod utils;

pub use error::{ProviderError, Result};

pub use factory::create_provider;

// Internal traits (error mapping) stay private.
pub use traits::DnsProvider;

pub use types::{
    BatchCreateFailure, BatchCreateResult, ChangeStatus, CreateDnsRecordRequest,
    CredentialValidationError, DnsRecord, DnsRecordType, ProviderCredentials, ProviderType,
    ProviderZone, RecordQuery, ZoneStatus,
};

pub use providers::common::{normalize_domain_name, unquote_txt, zone_covers};
pub use utils::log_sanitizer::truncate_for_log;

#[cfg(feature = "cloudflare")]
pub use providers::{CloudflareProvider, CloudflareProviderBuilder};

#[cfg(feature = "route53")]
pub use providers::{Route53Provider, Route53ProviderBuilder};
