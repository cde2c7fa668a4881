//! Abstractions over storage, DNS, scheduling and the progress channel

mod dns_resolver;
mod domain_repository;
mod progress_publisher;
mod provider_factory;
mod verification_scheduler;

pub use dns_resolver::{DnsLookupError, DnsResolver, HickoryDnsResolver, LookupResult};
pub use domain_repository::{
    AutomationUpdate, DomainRepository, InMemoryDomainRepository, SetupRun, VerificationAttempt,
};
pub use progress_publisher::{BroadcastProgressPublisher, ProgressPublisher};
pub use provider_factory::{DefaultProviderFactory, ProviderFactory};
pub use verification_scheduler::{
    ScheduleMode, TokioVerificationScheduler, VerificationJob, VerificationScheduler,
};
