//! Route53 automation: one atomic change batch, then propagation tracking

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mail_dns_provider::ChangeStatus;

use super::{
    log_error, require_credentials, resolve_zone, spf_exists, to_request, with_timeout,
    RecordVerifier, SetupRequest, SetupStrategy, VerifyRequest,
};
use crate::config::AutomationSettings;
use crate::error::{CoreError, CoreResult};
use crate::records::build_records;
use crate::traits::ProviderFactory;
use crate::types::{
    Domain, RecordAction, RecordOutcome, RecordStatus, SetupOutcome, StoredAutomationConfig,
    VerificationMethod, VerificationResult,
};

/// Delay before asking Route53 again about a pending change
const PENDING_RECHECK: Duration = Duration::from_secs(60);

pub struct Route53Strategy {
    settings: Arc<AutomationSettings>,
    provider_factory: Arc<dyn ProviderFactory>,
    verifier: RecordVerifier,
}

impl Route53Strategy {
    pub fn new(
        settings: Arc<AutomationSettings>,
        provider_factory: Arc<dyn ProviderFactory>,
        verifier: RecordVerifier,
    ) -> Self {
        Self {
            settings,
            provider_factory,
            verifier,
        }
    }
}

#[async_trait]
impl SetupStrategy for Route53Strategy {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::Route53
    }

    async fn setup(&self, request: &SetupRequest<'_>) -> CoreResult<SetupOutcome> {
        let credentials = require_credentials(self.method(), request.credentials)?;
        let provider = self.provider_factory.create(credentials)?;
        let domain = &request.domain.name;

        let zone = match resolve_zone(provider.as_ref(), domain, &self.settings).await {
            Ok(zone) => zone,
            Err(failure) => return Ok(failure),
        };

        let spf_exists = match spf_exists(provider.as_ref(), &zone.id, domain, &self.settings).await
        {
            Ok(exists) => exists,
            Err(e) => {
                log_error(&format!("Listing TXT records of {domain} failed"), &e);
                return Ok(SetupOutcome::failure(e.user_summary()));
            }
        };

        let plan = build_records(domain, request.token, &self.settings, spf_exists);
        let requests: Vec<_> = plan.to_create().map(|r| to_request(&zone.id, r)).collect();

        let batch = match with_timeout(
            self.settings.adapter_timeout(),
            provider.batch_create_records(&requests),
        )
        .await
        {
            Ok(batch) => batch,
            Err(e) => {
                log_error(&format!("Route53 change batch for {domain} failed"), &e);
                return Ok(SetupOutcome {
                    zone_id: Some(zone.id),
                    ..SetupOutcome::failure(e.user_summary())
                });
            }
        };

        let mut created = batch.created_records.iter();
        let records = plan
            .entries
            .iter()
            .map(|entry| {
                let status = match entry.action {
                    RecordAction::SkipExisting => RecordStatus::Skipped,
                    RecordAction::Create => {
                        let failure = batch
                            .failures
                            .iter()
                            .find(|f| f.record_name == entry.record.name);
                        match failure {
                            Some(f) => RecordStatus::Failed {
                                reason: f.reason.clone(),
                            },
                            None => created.next().map_or(RecordStatus::Pending, |r| {
                                RecordStatus::Created {
                                    record_id: r.id.clone(),
                                }
                            }),
                        }
                    }
                };
                RecordOutcome {
                    kind: entry.record.kind,
                    name: entry.record.name.clone(),
                    status,
                }
            })
            .collect();

        log::info!(
            "Route53 change {} submitted for {domain} ({} records)",
            batch.change_id.as_deref().unwrap_or("-"),
            batch.created_records.len()
        );

        Ok(SetupOutcome {
            success: !batch.created_records.is_empty(),
            records,
            zone_id: Some(zone.id),
            change_id: batch.change_id,
            created: batch.created_records,
            spf_skipped: spf_exists,
            ..SetupOutcome::default()
        })
    }

    async fn verify(&self, request: &VerifyRequest<'_>) -> CoreResult<VerificationResult> {
        let config = request.config;

        if let Some((credentials, change_id)) = config.and_then(|c| {
            c.credentials
                .as_ref()
                .zip(c.change_id.as_deref())
        }) {
            let provider = self.provider_factory.create(credentials)?;
            let status = with_timeout(
                self.settings.adapter_timeout(),
                provider.change_status(change_id),
            )
            .await?;
            match status {
                ChangeStatus::Pending => {
                    log::debug!("Route53 change {change_id} still pending");
                    return Ok(VerificationResult::pending(
                        "Waiting for Route53 to apply the DNS change",
                        Some(PENDING_RECHECK),
                    ));
                }
                ChangeStatus::Failed(status) => {
                    log::warn!("Route53 change {change_id} reported status {status}");
                    return Ok(VerificationResult::failed(format!(
                        "Route53 reported the DNS change as {status}"
                    )));
                }
                ChangeStatus::Insync => {}
            }
        }

        let spf_skipped = config.is_some_and(|c| c.spf_skipped);
        let plan = build_records(
            &request.domain.name,
            request.token,
            &self.settings,
            spf_skipped,
        );
        Ok(VerificationResult::from_checks(
            self.verifier.check_plan(&plan).await,
        ))
    }

    async fn cleanup(&self, domain: &Domain, config: &StoredAutomationConfig) -> CoreResult<()> {
        if config.created_records.is_empty() {
            return Ok(());
        }
        let credentials = config
            .credentials
            .as_ref()
            .ok_or(CoreError::MissingCredentials(self.method()))?;
        let provider = self.provider_factory.create(credentials)?;
        let change_id = with_timeout(
            self.settings.adapter_timeout(),
            provider.batch_delete_records(&config.created_records),
        )
        .await?;
        log::info!(
            "Removed {} Route53 records of {} (change {})",
            config.created_records.len(),
            domain.name,
            change_id.as_deref().unwrap_or("-")
        );
        Ok(())
    }
}
