//! Subdomain delegation: the customer adds one CNAME, the service publishes
//! the email records in its own zone

use std::sync::Arc;

use async_trait::async_trait;

use super::{
    create_records_individually, delete_records_individually, resolve_zone, RecordVerifier,
    SetupRequest, SetupStrategy, VerifyRequest,
};
use crate::config::AutomationSettings;
use crate::error::{CoreError, CoreResult};
use crate::records::{build_records, delegation_host, service_host};
use crate::traits::ProviderFactory;
use crate::types::{
    DnsInstructions, Domain, EmailDnsRecord, PlannedRecord, ProviderCredentials, RecordAction,
    SetupOutcome, StoredAutomationConfig, VerificationMethod, VerificationResult,
};

pub struct SubdomainStrategy {
    settings: Arc<AutomationSettings>,
    provider_factory: Arc<dyn ProviderFactory>,
    verifier: RecordVerifier,
}

impl SubdomainStrategy {
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

    fn service_credentials(&self) -> CoreResult<&ProviderCredentials> {
        self.settings.service_provider.as_ref().ok_or_else(|| {
            CoreError::Configuration(
                "service_provider must be set for subdomain delegation".to_string(),
            )
        })
    }

    fn delegation_record(&self, domain: &Domain) -> PlannedRecord {
        let host = domain
            .subdomain
            .clone()
            .unwrap_or_else(|| delegation_host(&domain.name, &domain.user_id));
        PlannedRecord {
            record: EmailDnsRecord::cname(
                host,
                &self.settings.controlled_domain,
                self.settings.record_ttl,
            ),
            action: RecordAction::Create,
        }
    }
}

#[async_trait]
impl SetupStrategy for SubdomainStrategy {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::Subdomain
    }

    async fn setup(&self, request: &SetupRequest<'_>) -> CoreResult<SetupOutcome> {
        let provider = self.provider_factory.create(self.service_credentials()?)?;
        let domain = request.domain;
        let host = service_host(&domain.name, &domain.user_id, &self.settings);

        let zone = match resolve_zone(
            provider.as_ref(),
            &self.settings.controlled_domain,
            &self.settings,
        )
        .await
        {
            Ok(zone) => zone,
            Err(failure) => return Ok(failure),
        };

        let plan = build_records(&host, request.token, &self.settings, false);
        let mut outcome =
            create_records_individually(provider.as_ref(), &zone.id, &plan, &self.settings).await;
        log::info!(
            "Published {} delegated records for {} at {host}",
            outcome.created_count(),
            domain.name
        );

        let delegation = self.delegation_record(domain);
        outcome.instructions = Some(generate_dns_instructions(
            &domain.name,
            &delegation.record.name,
            &self.settings,
        ));
        Ok(outcome)
    }

    async fn verify(&self, request: &VerifyRequest<'_>) -> CoreResult<VerificationResult> {
        let domain = request.domain;
        let mut checks = vec![
            self.verifier
                .check_record(&self.delegation_record(domain))
                .await,
        ];
        let host = service_host(&domain.name, &domain.user_id, &self.settings);
        let plan = build_records(&host, request.token, &self.settings, false);
        checks.extend(self.verifier.check_plan(&plan).await);
        Ok(VerificationResult::from_checks(checks))
    }

    async fn cleanup(&self, domain: &Domain, config: &StoredAutomationConfig) -> CoreResult<()> {
        if config.created_records.is_empty() {
            return Ok(());
        }
        let provider = self.provider_factory.create(self.service_credentials()?)?;
        log::info!(
            "Removing {} delegated records of {}",
            config.created_records.len(),
            domain.name
        );
        delete_records_individually(provider.as_ref(), &config.created_records, &self.settings)
            .await
    }
}

/// The single CNAME the customer must add, with ordered steps.
pub fn generate_dns_instructions(
    domain: &str,
    subdomain: &str,
    settings: &AutomationSettings,
) -> DnsInstructions {
    let label = subdomain
        .strip_suffix(domain)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .unwrap_or(subdomain);
    let target = &settings.controlled_domain;

    DnsInstructions {
        records: vec![EmailDnsRecord::cname(subdomain, target, settings.record_ttl)],
        steps: vec![
            format!("Sign in to the DNS provider that hosts {domain}."),
            format!("Create a CNAME record with the host {label} (full name {subdomain})."),
            format!("Point it to {target}."),
            "Turn off any proxying or CNAME flattening for this record.".to_string(),
            "Save the record. Verification runs automatically; DNS changes can take up to 48 \
             hours to propagate."
                .to_string(),
        ],
        guides: Vec::new(),
    }
}
