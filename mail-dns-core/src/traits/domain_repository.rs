//! Domain row persistence abstraction

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::crypto::EncryptedEnvelope;
use crate::error::{CoreError, CoreResult};
use crate::types::{Domain, SetupProgress, VerificationMethod};

/// Fields reset when a new setup run starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupRun {
    /// Sequence number, one more than the previous run's
    pub number: u64,
    pub method: VerificationMethod,
    pub verification_token: String,
    pub subdomain: Option<String>,
}

/// Automation fields written after a successful provider setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationUpdate {
    pub provider: VerificationMethod,
    pub config: EncryptedEnvelope,
}

/// Bookkeeping written by every verification poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationAttempt {
    pub at: DateTime<Utc>,
    pub attempts: u32,
    pub consecutive_lookup_errors: u32,
}

/// Domain repository trait
///
/// Implementations bump [`Domain::version`] on every write. This subsystem
/// never deletes domain rows.
#[async_trait]
pub trait DomainRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>>;

    /// Start a new run: set run number, method, token and subdomain, zero the
    /// attempt counters.
    async fn start_setup_run(&self, id: &str, run: &SetupRun) -> CoreResult<()>;

    async fn save_progress(&self, id: &str, progress: &SetupProgress) -> CoreResult<()>;

    /// Set `automation_enabled`, `automation_provider` and the encrypted config.
    async fn save_automation(&self, id: &str, update: &AutomationUpdate) -> CoreResult<()>;

    async fn record_verification_attempt(
        &self,
        id: &str,
        attempt: &VerificationAttempt,
    ) -> CoreResult<()>;

    /// Clear `automation_enabled`, `automation_provider` and the encrypted config.
    async fn clear_automation(&self, id: &str) -> CoreResult<()>;
}

/// In-memory domain repository
///
/// Default implementation for embedding and tests.
#[derive(Default)]
pub struct InMemoryDomainRepository {
    domains: RwLock<HashMap<String, Domain>>,
}

impl InMemoryDomainRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a domain row.
    pub async fn insert(&self, domain: Domain) {
        self.domains.write().await.insert(domain.id.clone(), domain);
    }

    async fn modify(&self, id: &str, f: impl FnOnce(&mut Domain) + Send) -> CoreResult<()> {
        let mut domains = self.domains.write().await;
        let domain = domains
            .get_mut(id)
            .ok_or_else(|| CoreError::DomainNotFound(id.to_string()))?;
        f(domain);
        domain.version += 1;
        Ok(())
    }
}

#[async_trait]
impl DomainRepository for InMemoryDomainRepository {
    async fn find_by_id(&self, id: &str) -> CoreResult<Option<Domain>> {
        Ok(self.domains.read().await.get(id).cloned())
    }

    async fn start_setup_run(&self, id: &str, run: &SetupRun) -> CoreResult<()> {
        self.modify(id, |d| {
            d.setup_run = run.number;
            d.verification_method = run.method;
            d.verification_token = Some(run.verification_token.clone());
            d.subdomain.clone_from(&run.subdomain);
            d.verification_attempts = 0;
            d.consecutive_lookup_errors = 0;
        })
        .await
    }

    async fn save_progress(&self, id: &str, progress: &SetupProgress) -> CoreResult<()> {
        self.modify(id, |d| d.setup_progress = Some(progress.clone()))
            .await
    }

    async fn save_automation(&self, id: &str, update: &AutomationUpdate) -> CoreResult<()> {
        self.modify(id, |d| {
            d.automation_enabled = true;
            d.automation_provider = Some(update.provider);
            d.automation_config = Some(update.config.clone());
        })
        .await
    }

    async fn record_verification_attempt(
        &self,
        id: &str,
        attempt: &VerificationAttempt,
    ) -> CoreResult<()> {
        self.modify(id, |d| {
            d.last_verification_attempt = Some(attempt.at);
            d.verification_attempts = attempt.attempts;
            d.consecutive_lookup_errors = attempt.consecutive_lookup_errors;
        })
        .await
    }

    async fn clear_automation(&self, id: &str) -> CoreResult<()> {
        self.modify(id, |d| {
            d.automation_enabled = false;
            d.automation_provider = None;
            d.automation_config = None;
        })
        .await
    }
}
