//! Manual setup: the customer copies the records into their DNS host

use std::sync::Arc;

use async_trait::async_trait;

use super::{RecordVerifier, SetupRequest, SetupStrategy, VerifyRequest};
use crate::config::AutomationSettings;
use crate::error::CoreResult;
use crate::records::build_records;
use crate::types::{
    DnsInstructions, Domain, EmailDnsRecord, ProviderGuide, RecordOutcome, RecordStatus,
    SetupOutcome, StoredAutomationConfig, VerificationMethod, VerificationResult,
};

pub struct ManualStrategy {
    settings: Arc<AutomationSettings>,
    verifier: RecordVerifier,
}

impl ManualStrategy {
    pub fn new(settings: Arc<AutomationSettings>, verifier: RecordVerifier) -> Self {
        Self { settings, verifier }
    }
}

#[async_trait]
impl SetupStrategy for ManualStrategy {
    fn method(&self) -> VerificationMethod {
        VerificationMethod::Manual
    }

    async fn setup(&self, request: &SetupRequest<'_>) -> CoreResult<SetupOutcome> {
        let domain = &request.domain.name;
        let plan = build_records(domain, request.token, &self.settings, false);
        let records: Vec<EmailDnsRecord> = plan.records().cloned().collect();

        Ok(SetupOutcome {
            success: true,
            records: records
                .iter()
                .map(|r| RecordOutcome {
                    kind: r.kind,
                    name: r.name.clone(),
                    status: RecordStatus::Pending,
                })
                .collect(),
            instructions: Some(DnsInstructions {
                steps: generic_steps(domain, &self.settings),
                guides: provider_guides(domain, &records),
                records,
            }),
            ..SetupOutcome::default()
        })
    }

    async fn verify(&self, request: &VerifyRequest<'_>) -> CoreResult<VerificationResult> {
        let plan = build_records(&request.domain.name, request.token, &self.settings, false);
        Ok(VerificationResult::from_checks(
            self.verifier.check_plan(&plan).await,
        ))
    }

    async fn cleanup(&self, _domain: &Domain, _config: &StoredAutomationConfig) -> CoreResult<()> {
        Ok(())
    }
}

/// Host-independent steps for publishing the four records.
pub fn generic_steps(domain: &str, settings: &AutomationSettings) -> Vec<String> {
    vec![
        format!("Sign in to the DNS provider that hosts {domain}."),
        "Open the DNS records page for the domain.".to_string(),
        "Add each TXT record listed below exactly as shown.".to_string(),
        format!(
            "If {domain} already has a TXT record starting with v=spf1, add include:{} to it \
             instead of creating a second SPF record.",
            settings.spf_include
        ),
        format!(
            "Use a TTL of {} seconds, or the provider's default.",
            settings.record_ttl
        ),
        "Save the changes. Verification runs automatically; DNS changes can take up to 48 hours \
         to propagate."
            .to_string(),
    ]
}

/// Step-by-step guides for common DNS hosts.
pub fn provider_guides(domain: &str, records: &[EmailDnsRecord]) -> Vec<ProviderGuide> {
    let hosts: Vec<String> = records
        .iter()
        .map(|r| format!("{} ({})", relative_host(&r.name, domain), r.kind.label()))
        .collect();
    let host_list = hosts.join(", ");

    vec![
        ProviderGuide {
            provider: "Cloudflare".to_string(),
            steps: vec![
                format!("Select {domain} in the Cloudflare dashboard and open DNS > Records."),
                "Click Add record and choose type TXT.".to_string(),
                format!("Enter each name ({host_list}) with its value; Cloudflare appends the domain."),
                "Leave TTL on Auto and save each record.".to_string(),
            ],
        },
        ProviderGuide {
            provider: "GoDaddy".to_string(),
            steps: vec![
                format!("Open My Products, find {domain} and choose Manage DNS."),
                "Click Add New Record and select TXT.".to_string(),
                format!("Use the host names {host_list}; use @ for the root domain."),
                "Paste the value, keep the default TTL and save.".to_string(),
            ],
        },
        ProviderGuide {
            provider: "Namecheap".to_string(),
            steps: vec![
                format!("Go to Domain List, click Manage next to {domain}, then Advanced DNS."),
                "Click Add New Record and select TXT Record.".to_string(),
                format!("Enter the hosts {host_list}; use @ for the root domain."),
                "Paste each value and click the checkmark to save.".to_string(),
            ],
        },
        ProviderGuide {
            provider: "AWS Route53".to_string(),
            steps: vec![
                format!("Open Route53 > Hosted zones and select {domain}."),
                "Click Create record and choose record type TXT.".to_string(),
                format!("Enter the record names {host_list}; leave the name empty for the root domain."),
                "Wrap each value in double quotes and create the records.".to_string(),
            ],
        },
        ProviderGuide {
            provider: "Other DNS hosts".to_string(),
            steps: vec![
                "Find the DNS or zone editor in your registrar or hosting control panel."
                    .to_string(),
                format!("Create TXT records for {host_list}."),
                "Some hosts want the full name including the domain; others only the part before it."
                    .to_string(),
            ],
        },
    ]
}

/// Host label relative to `domain`: `@` for the apex.
fn relative_host(name: &str, domain: &str) -> String {
    if name == domain {
        return "@".to_string();
    }
    name.strip_suffix(domain)
        .and_then(|prefix| prefix.strip_suffix('.'))
        .unwrap_or(name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_settings, MockDnsResolver};
    use crate::types::RecordKind;

    fn strategy(resolver: &Arc<MockDnsResolver>) -> ManualStrategy {
        let settings = Arc::new(test_settings());
        ManualStrategy::new(
            Arc::clone(&settings),
            RecordVerifier::new(resolver.clone(), settings),
        )
    }

    #[tokio::test]
    async fn setup_returns_records_and_guides() {
        let resolver = Arc::new(MockDnsResolver::new());
        let domain = Domain::new("d1", "u1", "example.com", VerificationMethod::Manual);
        let outcome = strategy(&resolver)
            .setup(&SetupRequest {
                domain: &domain,
                token: "tok",
                credentials: None,
            })
            .await
            .unwrap();

        assert!(outcome.success);
        assert_eq!(outcome.records.len(), 4);
        assert!(outcome
            .records
            .iter()
            .all(|r| r.status == RecordStatus::Pending));

        let instructions = outcome.instructions.unwrap();
        assert_eq!(instructions.records.len(), 4);
        assert!(!instructions.steps.is_empty());
        let names: Vec<_> = instructions.guides.iter().map(|g| g.provider.as_str()).collect();
        assert_eq!(
            names,
            ["Cloudflare", "GoDaddy", "Namecheap", "AWS Route53", "Other DNS hosts"]
        );
        assert_eq!(instructions.records[2].kind, RecordKind::Spf);
        assert_eq!(instructions.records[2].name, "example.com");
    }

    #[tokio::test]
    async fn verify_follows_dns() {
        let resolver = Arc::new(MockDnsResolver::new());
        let domain = Domain::new("d1", "u1", "example.com", VerificationMethod::Manual);
        let request = VerifyRequest {
            domain: &domain,
            token: "tok",
            config: None,
        };

        let result = strategy(&resolver).verify(&request).await.unwrap();
        assert!(!result.verified);

        let settings = test_settings();
        resolver
            .publish_plan(&build_records("example.com", "tok", &settings, false))
            .await;
        assert!(strategy(&resolver).verify(&request).await.unwrap().verified);
    }

    #[test]
    fn relative_hosts() {
        assert_eq!(relative_host("example.com", "example.com"), "@");
        assert_eq!(relative_host("_dmarc.example.com", "example.com"), "_dmarc");
        assert_eq!(relative_host("notexample.com", "example.com"), "notexample.com");
    }
}
