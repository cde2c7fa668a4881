//! Mail DNS Core Library
//!
//! Sets up and verifies the DNS records a customer domain needs to send
//! email through the service:
//! - ownership TXT, DKIM, SPF and DMARC record generation
//! - setup strategies (manual, subdomain delegation, Cloudflare, Route53)
//! - setup progress state machine with real-time progress events
//! - scheduled DNS verification
//! - encrypted storage of automation credentials
//!
//! Storage, DNS resolution, scheduling and the progress channel sit behind
//! traits; in-process implementations are provided for each.

pub mod config;
pub mod crypto;
pub mod error;
pub mod records;
pub mod services;
pub mod strategies;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::AutomationSettings;
pub use error::{CoreError, CoreResult};
pub use services::{DomainSetupService, ServiceContext, VerificationPoller};
pub use traits::{
    DnsResolver, DomainRepository, ProgressPublisher, ProviderFactory, VerificationScheduler,
};
