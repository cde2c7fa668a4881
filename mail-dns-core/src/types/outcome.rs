//! Results of setup strategies and the persisted automation config

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mail_dns_provider::{DnsRecord, ProviderCredentials};

use super::domain::VerificationMethod;
use super::records::{EmailDnsRecord, RecordKind};

/// Per-record result of a setup attempt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RecordStatus {
    /// Created through the provider API
    Created { record_id: String },
    /// Already present, left alone
    Skipped,
    /// Left for the customer to publish
    Pending,
    /// Creation failed; `reason` is a short summary
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub kind: RecordKind,
    pub name: String,
    #[serde(flatten)]
    pub status: RecordStatus,
}

/// Copy/paste guide for one DNS host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderGuide {
    pub provider: String,
    pub steps: Vec<String>,
}

/// Records the customer must publish by hand, with ordered steps
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DnsInstructions {
    pub records: Vec<EmailDnsRecord>,
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub guides: Vec<ProviderGuide>,
}

/// Result of [`SetupStrategy::setup`](crate::strategies::SetupStrategy::setup)
///
/// `success` means the strategy ran to completion. Individual records may
/// still have failed; see `records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetupOutcome {
    pub success: bool,
    pub records: Vec<RecordOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_id: Option<String>,
    /// Records the provider created, kept for cleanup
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub created: Vec<DnsRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<DnsInstructions>,
    /// SPF was left alone because one already exists
    #[serde(default)]
    pub spf_skipped: bool,
    /// Short user-facing failure summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SetupOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn created_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, RecordStatus::Created { .. }))
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.status, RecordStatus::Failed { .. }))
            .count()
    }
}

/// Plaintext shape of [`Domain::automation_config`](super::Domain::automation_config)
///
/// Only ever stored encrypted.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAutomationConfig {
    pub provider: VerificationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<ProviderCredentials>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    #[serde(default)]
    pub created_records: Vec<DnsRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_id: Option<String>,
    #[serde(default)]
    pub spf_skipped: bool,
    pub created_at: DateTime<Utc>,
}

impl StoredAutomationConfig {
    pub fn from_outcome(
        provider: VerificationMethod,
        credentials: Option<ProviderCredentials>,
        outcome: &SetupOutcome,
    ) -> Self {
        Self {
            provider,
            credentials,
            zone_id: outcome.zone_id.clone(),
            created_records: outcome.created.clone(),
            change_id: outcome.change_id.clone(),
            spf_skipped: outcome.spf_skipped,
            created_at: Utc::now(),
        }
    }
}

impl std::fmt::Debug for StoredAutomationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredAutomationConfig")
            .field("provider", &self.provider)
            .field("credentials", &self.credentials)
            .field("zone_id", &self.zone_id)
            .field("created_records", &self.created_records.len())
            .field("change_id", &self.change_id)
            .field("spf_skipped", &self.spf_skipped)
            .field("created_at", &self.created_at)
            .finish()
    }
}
