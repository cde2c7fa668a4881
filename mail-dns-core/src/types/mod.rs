//! Type definition module

mod domain;
mod outcome;
mod progress;
mod records;
mod verification;

pub use domain::{Domain, VerificationMethod};
pub use outcome::{
    DnsInstructions, ProviderGuide, RecordOutcome, RecordStatus, SetupOutcome,
    StoredAutomationConfig,
};
pub use progress::{progress_topic, ProgressEvent, SetupProgress, SetupStep};
pub use records::{EmailDnsRecord, PlannedRecord, RecordAction, RecordKind, RecordPlan};
pub use verification::{CheckStatus, PollOutcome, RecordCheck, VerificationResult};

// Re-export provider library types used in the public API
pub use mail_dns_provider::{
    ChangeStatus, DnsRecord, DnsRecordType, ProviderCredentials, ProviderType, ProviderZone,
};
