//! Shared helpers for the end-to-end tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use mail_dns_core::crypto::CredentialCipher;
use mail_dns_core::error::CoreResult;
use mail_dns_core::traits::{
    BroadcastProgressPublisher, DnsLookupError, DnsResolver, InMemoryDomainRepository,
    LookupResult, ProviderFactory, TokioVerificationScheduler, VerificationJob,
};
use mail_dns_core::types::{Domain, RecordKind, RecordPlan, VerificationMethod};
use mail_dns_core::{AutomationSettings, ServiceContext};
use mail_dns_provider::{CloudflareProvider, DnsProvider, ProviderCredentials, Route53Provider};
use tokio::sync::{mpsc, RwLock};

/// Assert that an `Option` is `Some` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// Assert that a `Result` is `Ok` and unwrap it (fails the test otherwise).
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

pub const DKIM_KEY: &str = "MIGfMA0GCSqGSIb3DQEBAQUAA4GNADCBiQKBgQC7vbqajDw4o6gJy8UtmIbkcpnkO3Kwc4qsEnSZp/TR+fQi62F79RHWmwKOtFmwteURgLbj7D/WGNNIJu2TWsAsDdnPN0S0lI93njamuSvTJHVAmp12ewMOU8EdZsUYxzUJjZRB3cK7+fRtLuHDbWhfhZPFBf0NrJbZXnSDHX4N9wIDAQAB";

pub fn settings() -> AutomationSettings {
    AutomationSettings {
        dkim_public_key: DKIM_KEY.to_string(),
        ..AutomationSettings::default()
    }
}

/// Resolver answering from a map; unknown names have no records
#[derive(Default)]
pub struct StaticResolver {
    txt: RwLock<HashMap<String, Vec<String>>>,
    cname: RwLock<HashMap<String, Vec<String>>>,
}

impl StaticResolver {
    pub async fn publish(&self, plan: &RecordPlan) {
        for record in plan.records() {
            let map = if record.kind == RecordKind::Delegation {
                &self.cname
            } else {
                &self.txt
            };
            map.write()
                .await
                .entry(record.name.clone())
                .or_default()
                .push(record.value.clone());
        }
    }
}

#[async_trait]
impl DnsResolver for StaticResolver {
    async fn txt_lookup(&self, name: &str) -> LookupResult {
        self.txt
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or(DnsLookupError::NoRecords)
    }

    async fn cname_lookup(&self, name: &str) -> LookupResult {
        self.cname
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or(DnsLookupError::NoRecords)
    }
}

/// Builds real provider clients pointed at a mock server
pub struct MockServerFactory {
    pub base_url: String,
}

impl ProviderFactory for MockServerFactory {
    fn create(&self, credentials: &ProviderCredentials) -> CoreResult<Arc<dyn DnsProvider>> {
        match credentials {
            ProviderCredentials::Cloudflare { api_token } => Ok(Arc::new(
                CloudflareProvider::builder(api_token.clone())
                    .api_base(&self.base_url)
                    .max_retries(0)
                    .build()?,
            )),
            ProviderCredentials::Route53 {
                access_key_id,
                secret_access_key,
                ..
            } => Ok(Arc::new(
                Route53Provider::builder(access_key_id.clone(), secret_access_key.clone())
                    .endpoint(&self.base_url)
                    .max_retries(0)
                    .build()?,
            )),
        }
    }
}

pub struct Harness {
    pub ctx: Arc<ServiceContext>,
    pub repository: Arc<InMemoryDomainRepository>,
    pub resolver: Arc<StaticResolver>,
    pub publisher: Arc<BroadcastProgressPublisher>,
    pub jobs: mpsc::UnboundedReceiver<VerificationJob>,
}

pub fn harness(factory: Arc<dyn ProviderFactory>) -> Option<Harness> {
    let repository = Arc::new(InMemoryDomainRepository::new());
    let resolver = Arc::new(StaticResolver::default());
    let publisher = Arc::new(BroadcastProgressPublisher::new());
    let (scheduler, jobs) = TokioVerificationScheduler::new();
    let cipher = CredentialCipher::new("e2e-test-secret").ok()?;
    let ctx = ServiceContext::new(
        repository.clone(),
        resolver.clone(),
        publisher.clone(),
        Arc::new(scheduler),
        factory,
        cipher,
        settings(),
    );
    Some(Harness {
        ctx: Arc::new(ctx),
        repository,
        resolver,
        publisher,
        jobs,
    })
}

pub async fn insert_domain(h: &Harness, id: &str, name: &str, method: VerificationMethod) {
    h.repository
        .insert(Domain::new(id, "7f3c9a2e-user", name, method))
        .await;
}
