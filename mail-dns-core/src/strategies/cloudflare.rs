//! Cloudflare automation: records created one by one through the API

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    create_records_individually, delete_records_individually, log_error, require_credentials,
    resolve_zone, spf_exists, RecordVerifier, SetupRequest, SetupStrategy, VerifyRequest,
};
use crate::config::AutomationSettings;
use crate::error::{CoreError, CoreResult};
use crate::records::build_records;
use crate::traits::ProviderFactory;
use crate::types::{
    Domain, SetupOutcome, StoredAutomationConfig, VerificationMethod, VerificationResult,
};

pub struct CloudflareStrategy {
    settings: Arc<AutomationSettings>,
    provider_factory: Arc<dyn ProviderFactory>,
    verifier: RecordVerifier,
}

impl CloudflareStrategy {
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
impl SetupStrategy for CloudflareStrategy {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::Cloudflare
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
        if spf_exists {
            log::info!("{domain} already publishes SPF, leaving it untouched");
        }

        let plan = build_records(domain, request.token, &self.settings, spf_exists);
        let outcome =
            create_records_individually(provider.as_ref(), &zone.id, &plan, &self.settings).await;
        log::info!(
            "Cloudflare setup for {domain}: {} created, {} failed",
            outcome.created_count(),
            outcome.failed_count()
        );
        Ok(outcome)
    }

    async fn verify(&self, request: &VerifyRequest<'_>) -> CoreResult<VerificationResult> {
        let spf_skipped = request.config.is_some_and(|c| c.spf_skipped);
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
        log::info!(
            "Removing {} Cloudflare records of {}",
            config.created_records.len(),
            domain.name
        );
        delete_records_individually(provider.as_ref(), &config.created_records, &self.settings)
            .await
    }
}
