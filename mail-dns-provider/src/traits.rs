use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::providers::common::zone_covers;
use crate::types::{
    BatchCreateFailure, BatchCreateResult, ChangeStatus, CreateDnsRecordRequest, DnsRecord,
    ProviderZone, RecordQuery,
};

/// Raw error as returned by a provider API (internal).
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// Provider error code; format differs per provider.
    pub code: Option<String>,
    /// Original error message.
    pub message: String,
}

impl RawApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Extra context attached while mapping a raw error (internal).
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// Record name, for `RecordExists`.
    pub record_name: Option<String>,
    /// Record id, for `RecordNotFound`.
    pub record_id: Option<String>,
    /// Domain or zone, for `DomainNotFound`.
    pub domain: Option<String>,
}

impl ErrorContext {
    pub fn record(name: impl Into<String>) -> Self {
        Self {
            record_name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn zone(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Self::default()
        }
    }
}

/// Maps provider-specific API errors onto [`ProviderError`] (internal).
pub(crate) trait ProviderErrorMapper {
    /// Provider identifier used in every error.
    fn provider_name(&self) -> &'static str;

    /// Map a raw API error to the unified error type.
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    fn serialization_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::SerializationError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// Fallback for unmapped codes.
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

/// A DNS hosting account reachable through its HTTP API.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Provider identifier (`"cloudflare"`, `"route53"`).
    fn id(&self) -> &'static str;

    /// Check the credentials against the API.
    ///
    /// Returns `Ok(false)` when the API rejects them; transport failures are
    /// returned as errors.
    async fn validate_credentials(&self) -> Result<bool>;

    /// List every zone visible to the credentials.
    async fn list_zones(&self) -> Result<Vec<ProviderZone>>;

    /// Find the zone that owns `domain`: a zone with the same name or the
    /// longest parent zone. `Ok(None)` when no zone covers it.
    async fn find_zone(&self, domain: &str) -> Result<Option<ProviderZone>> {
        let zones = self.list_zones().await?;
        Ok(zones
            .into_iter()
            .filter(|zone| zone_covers(&zone.name, domain))
            .max_by_key(|zone| zone.name.len()))
    }

    /// List records of a zone matching `query`.
    async fn list_records(&self, zone_id: &str, query: &RecordQuery) -> Result<Vec<DnsRecord>>;

    /// Create one record.
    async fn create_record(&self, req: &CreateDnsRecordRequest) -> Result<DnsRecord>;

    /// Delete one record previously returned by this provider.
    async fn delete_record(&self, record: &DnsRecord) -> Result<()>;

    /// Create several records.
    ///
    /// The default implementation calls `create_record()` for each request in
    /// order and collects successes and failures; one failure does not stop the
    /// remaining requests. Providers with an atomic batch API override this and
    /// return `Err` when the batch is rejected as a whole.
    async fn batch_create_records(
        &self,
        requests: &[CreateDnsRecordRequest],
    ) -> Result<BatchCreateResult> {
        let mut result = BatchCreateResult::default();

        for (i, req) in requests.iter().enumerate() {
            match self.create_record(req).await {
                Ok(record) => result.created_records.push(record),
                Err(e) => {
                    if e.is_expected() {
                        log::warn!("[{}] Failed to create '{}': {e}", self.id(), req.name);
                    } else {
                        log::error!("[{}] Failed to create '{}': {e}", self.id(), req.name);
                    }
                    result.failures.push(BatchCreateFailure {
                        request_index: i,
                        record_name: req.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(result)
    }

    /// Delete several records in one change where the provider supports it.
    ///
    /// The default implementation deletes one by one and stops at the first error.
    async fn batch_delete_records(&self, records: &[DnsRecord]) -> Result<Option<String>> {
        for record in records {
            self.delete_record(record).await?;
        }
        Ok(None)
    }

    /// Propagation status of a change returned in [`BatchCreateResult::change_id`].
    ///
    /// Providers that apply changes synchronously report [`ChangeStatus::Insync`].
    async fn change_status(&self, _change_id: &str) -> Result<ChangeStatus> {
        Ok(ChangeStatus::Insync)
    }
}
