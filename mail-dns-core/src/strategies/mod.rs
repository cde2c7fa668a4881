//! Setup strategies, one per verification method
//!
//! A strategy plans the email records for a domain, publishes them (or
//! explains how to), checks them in DNS and removes what it created.

mod cloudflare;
mod manual;
mod route53;
mod subdomain;
mod verifier;

pub use cloudflare::CloudflareStrategy;
pub use manual::{generic_steps, provider_guides, ManualStrategy};
pub use route53::Route53Strategy;
pub use subdomain::{generate_dns_instructions, SubdomainStrategy};
pub use verifier::RecordVerifier;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mail_dns_provider::{
    CreateDnsRecordRequest, DnsProvider, DnsRecord, DnsRecordType, ProviderCredentials,
    ProviderError, ProviderZone, RecordQuery,
};

use crate::config::AutomationSettings;
use crate::error::{provider_label, CoreError, CoreResult};
use crate::records::is_spf_record;
use crate::traits::{DnsResolver, ProviderFactory};
use crate::types::{
    Domain, EmailDnsRecord, RecordAction, RecordKind, RecordOutcome, RecordPlan, RecordStatus,
    SetupOutcome, StoredAutomationConfig, VerificationMethod, VerificationResult,
};

/// Inputs of one setup attempt
#[derive(Debug, Clone, Copy)]
pub struct SetupRequest<'a> {
    pub domain: &'a Domain,
    /// Ownership token of the current run
    pub token: &'a str,
    /// Customer DNS API credentials (automated methods only)
    pub credentials: Option<&'a ProviderCredentials>,
}

/// Inputs of one verification pass
#[derive(Debug, Clone, Copy)]
pub struct VerifyRequest<'a> {
    pub domain: &'a Domain,
    pub token: &'a str,
    /// Decrypted automation config, when setup stored one
    pub config: Option<&'a StoredAutomationConfig>,
}

/// Setup strategy trait
///
/// Provider failures during `setup` are reported through
/// [`SetupOutcome::failure`] rather than `Err`; `Err` is reserved for
/// misconfiguration and internal faults.
#[async_trait]
pub trait SetupStrategy: Send + Sync {
    fn method(&self) -> VerificationMethod;

    async fn setup(&self, request: &SetupRequest<'_>) -> CoreResult<SetupOutcome>;

    async fn verify(&self, request: &VerifyRequest<'_>) -> CoreResult<VerificationResult>;

    /// Remove records this strategy created.
    async fn cleanup(&self, domain: &Domain, config: &StoredAutomationConfig) -> CoreResult<()>;
}

/// Strategies keyed by method
pub struct StrategySet {
    strategies: HashMap<VerificationMethod, Arc<dyn SetupStrategy>>,
}

impl StrategySet {
    /// The four built-in strategies.
    pub fn new(
        settings: Arc<AutomationSettings>,
        resolver: Arc<dyn DnsResolver>,
        provider_factory: Arc<dyn ProviderFactory>,
    ) -> Self {
        let verifier = RecordVerifier::new(resolver, Arc::clone(&settings));
        let mut set = Self::empty();
        set.insert(Arc::new(ManualStrategy::new(
            Arc::clone(&settings),
            verifier.clone(),
        )));
        set.insert(Arc::new(SubdomainStrategy::new(
            Arc::clone(&settings),
            Arc::clone(&provider_factory),
            verifier.clone(),
        )));
        set.insert(Arc::new(CloudflareStrategy::new(
            Arc::clone(&settings),
            Arc::clone(&provider_factory),
            verifier.clone(),
        )));
        set.insert(Arc::new(Route53Strategy::new(
            settings,
            provider_factory,
            verifier,
        )));
        set
    }

    #[must_use]
    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register `strategy`, replacing any strategy for the same method.
    pub fn insert(&mut self, strategy: Arc<dyn SetupStrategy>) {
        self.strategies.insert(strategy.method(), strategy);
    }

    pub fn get(&self, method: VerificationMethod) -> CoreResult<Arc<dyn SetupStrategy>> {
        self.strategies
            .get(&method)
            .cloned()
            .ok_or(CoreError::UnsupportedMethod(method))
    }
}

/// Run one provider call under the adapter timeout.
pub(crate) async fn with_timeout<T, F>(timeout: Duration, fut: F) -> CoreResult<T>
where
    F: Future<Output = mail_dns_provider::Result<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(CoreError::from),
        Err(_) => Err(CoreError::Timeout(timeout.as_secs())),
    }
}

/// Log an error at `warn` or `error` depending on whether it is expected.
pub(crate) fn log_error(context: &str, err: &CoreError) {
    if err.is_expected() {
        log::warn!("{context}: {err}");
    } else {
        log::error!("{context}: {err}");
    }
}

/// Resolve the zone hosting `domain`, or a failure outcome naming it.
pub(crate) async fn resolve_zone(
    provider: &dyn DnsProvider,
    domain: &str,
    settings: &AutomationSettings,
) -> Result<ProviderZone, SetupOutcome> {
    let display = provider_label(provider.id());
    match with_timeout(settings.adapter_timeout(), provider.find_zone(domain)).await {
        Ok(Some(zone)) => {
            log::info!(
                "Resolved {display} zone {} ({}) for {domain}",
                zone.name,
                zone.id
            );
            Ok(zone)
        }
        Ok(None) => {
            log::warn!("No {display} zone covers {domain}");
            Err(SetupOutcome::failure(format!(
                "No {display} zone found for {domain}"
            )))
        }
        Err(e) => {
            log_error(&format!("Zone lookup for {domain} failed"), &e);
            Err(SetupOutcome::failure(e.user_summary()))
        }
    }
}

/// Whether a `v=spf1` TXT record is already published at the apex.
pub(crate) async fn spf_exists(
    provider: &dyn DnsProvider,
    zone_id: &str,
    domain: &str,
    settings: &AutomationSettings,
) -> CoreResult<bool> {
    let query = RecordQuery::new(domain, DnsRecordType::Txt);
    let existing = with_timeout(
        settings.adapter_timeout(),
        provider.list_records(zone_id, &query),
    )
    .await?;
    Ok(existing.iter().any(|r| is_spf_record(&r.value)))
}

pub(crate) fn to_request(zone_id: &str, record: &EmailDnsRecord) -> CreateDnsRecordRequest {
    CreateDnsRecordRequest {
        zone_id: zone_id.to_string(),
        record_type: record.record_type,
        name: record.name.clone(),
        value: record.value.clone(),
        ttl: record.ttl,
    }
}

/// Create every `Create` entry of `plan` one by one.
///
/// A failed record does not stop the others. An already-present identical
/// record counts as skipped. The outcome is successful when at least one
/// attempted record was created or found already present; entries the plan
/// skipped do not count.
pub(crate) async fn create_records_individually(
    provider: &dyn DnsProvider,
    zone_id: &str,
    plan: &RecordPlan,
    settings: &AutomationSettings,
) -> SetupOutcome {
    let mut outcome = SetupOutcome {
        zone_id: Some(zone_id.to_string()),
        ..SetupOutcome::default()
    };
    let mut landed = 0usize;

    for entry in &plan.entries {
        let record = &entry.record;
        let status = if entry.action == RecordAction::SkipExisting {
            RecordStatus::Skipped
        } else {
            let request = to_request(zone_id, record);
            match with_timeout(settings.adapter_timeout(), provider.create_record(&request)).await
            {
                Ok(created) => {
                    log::info!("Created {} record {}", record.kind.label(), record.name);
                    let record_id = created.id.clone();
                    outcome.created.push(created);
                    landed += 1;
                    RecordStatus::Created { record_id }
                }
                Err(CoreError::Provider(ProviderError::RecordExists { .. })) => {
                    log::info!(
                        "{} record {} already exists, leaving it",
                        record.kind.label(),
                        record.name
                    );
                    landed += 1;
                    RecordStatus::Skipped
                }
                Err(e) => {
                    log_error(
                        &format!("Failed to create {} record {}", record.kind.label(), record.name),
                        &e,
                    );
                    RecordStatus::Failed {
                        reason: e.user_summary(),
                    }
                }
            }
        };
        outcome.records.push(RecordOutcome {
            kind: record.kind,
            name: record.name.clone(),
            status,
        });
    }

    outcome.spf_skipped = plan.is_skipped(RecordKind::Spf);
    if landed == 0 {
        let reason = outcome.records.iter().find_map(|r| match &r.status {
            RecordStatus::Failed { reason } => Some(reason.clone()),
            _ => None,
        });
        outcome.error = Some(reason.unwrap_or_else(|| "No DNS records could be created".to_string()));
    } else {
        outcome.success = true;
    }
    outcome
}

/// Delete `records` one by one; a record already gone counts as deleted.
///
/// Every record is attempted. The last unexpected error is returned.
pub(crate) async fn delete_records_individually(
    provider: &dyn DnsProvider,
    records: &[DnsRecord],
    settings: &AutomationSettings,
) -> CoreResult<()> {
    let mut last_error = None;
    for record in records {
        match with_timeout(settings.adapter_timeout(), provider.delete_record(record)).await {
            Ok(()) | Err(CoreError::Provider(ProviderError::RecordNotFound { .. })) => {
                log::info!("Deleted {} record {}", record.record_type.as_str(), record.name);
            }
            Err(e) => {
                log_error(&format!("Failed to delete record {}", record.name), &e);
                last_error = Some(e);
            }
        }
    }
    last_error.map_or(Ok(()), Err)
}

/// Credentials for `method`, or `MissingCredentials` when absent or of the
/// wrong provider.
pub(crate) fn require_credentials<'a>(
    method: VerificationMethod,
    credentials: Option<&'a ProviderCredentials>,
) -> CoreResult<&'a ProviderCredentials> {
    match credentials {
        Some(c) if Some(c.provider_type()) == method.provider_type() => Ok(c),
        _ => Err(CoreError::MissingCredentials(method)),
    }
}
