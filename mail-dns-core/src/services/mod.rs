//! Business logic service layer

mod domain_setup_service;
mod locks;
mod verification_poller;

pub use domain_setup_service::DomainSetupService;
pub use locks::DomainLocks;
pub use verification_poller::VerificationPoller;

use std::sync::Arc;

use crate::config::AutomationSettings;
use crate::crypto::CredentialCipher;
use crate::error::{CoreError, CoreResult};
use crate::strategies::StrategySet;
use crate::traits::{
    DnsResolver, DomainRepository, ProgressPublisher, ProviderFactory, VerificationScheduler,
};
use crate::types::{
    progress_topic, Domain, ProgressEvent, SetupProgress, StoredAutomationConfig,
};

/// Service context - holds every dependency
///
/// The platform layer builds this context and injects its storage,
/// scheduling and transport implementations.
pub struct ServiceContext {
    pub repository: Arc<dyn DomainRepository>,
    pub resolver: Arc<dyn DnsResolver>,
    pub publisher: Arc<dyn ProgressPublisher>,
    pub scheduler: Arc<dyn VerificationScheduler>,
    pub provider_factory: Arc<dyn ProviderFactory>,
    pub cipher: CredentialCipher,
    pub settings: Arc<AutomationSettings>,
    pub strategies: StrategySet,
    pub locks: DomainLocks,
}

impl ServiceContext {
    /// Create a service context with the built-in strategies.
    #[must_use]
    pub fn new(
        repository: Arc<dyn DomainRepository>,
        resolver: Arc<dyn DnsResolver>,
        publisher: Arc<dyn ProgressPublisher>,
        scheduler: Arc<dyn VerificationScheduler>,
        provider_factory: Arc<dyn ProviderFactory>,
        cipher: CredentialCipher,
        settings: AutomationSettings,
    ) -> Self {
        let settings = Arc::new(settings);
        let strategies = StrategySet::new(
            Arc::clone(&settings),
            Arc::clone(&resolver),
            Arc::clone(&provider_factory),
        );
        Self {
            repository,
            resolver,
            publisher,
            scheduler,
            provider_factory,
            cipher,
            settings,
            strategies,
            locks: DomainLocks::new(),
        }
    }

    /// Replace the strategy set.
    #[must_use]
    pub fn with_strategies(mut self, strategies: StrategySet) -> Self {
        self.strategies = strategies;
        self
    }

    /// Load a domain row or fail with `DomainNotFound`.
    pub async fn find_domain(&self, domain_id: &str) -> CoreResult<Domain> {
        self.repository
            .find_by_id(domain_id)
            .await?
            .ok_or_else(|| CoreError::DomainNotFound(domain_id.to_string()))
    }

    /// Persist and publish a progress update.
    ///
    /// Rejects updates the setup state machine does not allow. The row is
    /// written before the event is published; publish failures are logged
    /// and do not fail the update.
    pub async fn set_progress(&self, domain: &mut Domain, progress: SetupProgress) -> CoreResult<()> {
        if let Some(current) = domain.current_step() {
            if !current.can_advance_to(progress.step) {
                return Err(CoreError::InvalidTransition {
                    from: current,
                    to: progress.step,
                });
            }
        }

        self.repository.save_progress(&domain.id, &progress).await?;
        log::debug!(
            "Domain {} progress: {:?} {}% {}",
            domain.id,
            progress.step,
            progress.percentage,
            progress.message
        );

        let event = ProgressEvent {
            domain_id: domain.id.clone(),
            progress: progress.clone(),
        };
        if let Err(e) = self
            .publisher
            .publish(&progress_topic(&domain.id), &event)
            .await
        {
            log::warn!("Failed to publish progress for domain {}: {e}", domain.id);
        }

        domain.setup_progress = Some(progress);
        Ok(())
    }

    /// Decrypt the stored automation config of `domain`, if any.
    pub fn automation_config(&self, domain: &Domain) -> CoreResult<Option<StoredAutomationConfig>> {
        domain
            .automation_config
            .as_ref()
            .map(|envelope| self.cipher.decrypt_json(envelope))
            .transpose()
    }
}
