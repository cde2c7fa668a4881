//! Cloudflare `DnsProvider` implementation

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::common::{normalize_domain_name, parse_record_type, unquote_txt};
use crate::traits::{DnsProvider, ErrorContext};
use crate::types::{
    CreateDnsRecordRequest, DnsRecord, DnsRecordType, ProviderType, ProviderZone, RecordQuery,
    ZoneStatus,
};

use super::types::{CreateRecordBody, TokenVerifyResult};
use super::{
    CloudflareDnsRecord, CloudflareProvider, CloudflareZone, MAX_PAGE_SIZE_RECORDS,
    MAX_PAGE_SIZE_ZONES,
};

impl CloudflareProvider {
    /// Cloudflare zone states: active, pending, initializing, moved
    pub(crate) fn zone_to_provider_zone(zone: CloudflareZone) -> ProviderZone {
        let status = match zone.status.as_str() {
            "active" => ZoneStatus::Active,
            "pending" | "initializing" => ZoneStatus::Pending,
            "moved" => ZoneStatus::Paused,
            _ => ZoneStatus::Unknown,
        };

        ProviderZone {
            id: zone.id,
            name: normalize_domain_name(&zone.name),
            provider: ProviderType::Cloudflare,
            status,
        }
    }

    /// `None` for record types this library does not manage.
    pub(crate) fn cf_record_to_dns_record(
        cf_record: CloudflareDnsRecord,
        zone_id: &str,
    ) -> Option<DnsRecord> {
        let record_type = parse_record_type(&cf_record.record_type)?;
        let value = match record_type {
            DnsRecordType::Txt => unquote_txt(&cf_record.content),
            DnsRecordType::Cname => normalize_domain_name(&cf_record.content),
        };

        Some(DnsRecord {
            id: cf_record.id,
            zone_id: zone_id.to_string(),
            record_type,
            name: normalize_domain_name(&cf_record.name),
            value,
            ttl: cf_record.ttl,
        })
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    fn id(&self) -> &'static str {
        "cloudflare"
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match self
            .get::<TokenVerifyResult>("/user/tokens/verify", ErrorContext::default())
            .await
        {
            Ok(resp) => Ok(resp.status == "active"),
            Err(e) if e.is_auth_error() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        let mut zones = Vec::new();
        let mut page = 1;

        loop {
            let (batch, total_pages): (Vec<CloudflareZone>, u32) = self
                .get_page(
                    &format!("/zones?page={page}&per_page={MAX_PAGE_SIZE_ZONES}"),
                    ErrorContext::default(),
                )
                .await?;
            let fetched = batch.len();
            zones.extend(batch.into_iter().map(Self::zone_to_provider_zone));

            if page >= total_pages || fetched == 0 {
                break;
            }
            page += 1;
        }

        Ok(zones)
    }

    async fn list_records(&self, zone_id: &str, query: &RecordQuery) -> Result<Vec<DnsRecord>> {
        let mut base = format!("/zones/{zone_id}/dns_records?per_page={MAX_PAGE_SIZE_RECORDS}");
        if let Some(record_type) = query.record_type {
            base.push_str(&format!("&type={}", record_type.as_str()));
        }
        if let Some(name) = &query.name {
            base.push_str(&format!(
                "&name={}",
                urlencoding::encode(&normalize_domain_name(name))
            ));
        }

        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let (batch, total_pages): (Vec<CloudflareDnsRecord>, u32) = self
                .get_page(&format!("{base}&page={page}"), ErrorContext::zone(zone_id))
                .await?;
            let fetched = batch.len();
            records.extend(
                batch
                    .into_iter()
                    .filter_map(|r| Self::cf_record_to_dns_record(r, zone_id)),
            );

            if page >= total_pages || fetched == 0 {
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn create_record(&self, req: &CreateDnsRecordRequest) -> Result<DnsRecord> {
        let name = normalize_domain_name(&req.name);
        let body = CreateRecordBody {
            record_type: req.record_type.as_str(),
            name: &name,
            content: &req.value,
            ttl: req.ttl,
            proxied: false,
        };

        let cf_record: CloudflareDnsRecord = self
            .post(
                &format!("/zones/{}/dns_records", req.zone_id),
                &body,
                ErrorContext {
                    record_name: Some(name.clone()),
                    domain: Some(req.zone_id.clone()),
                    ..ErrorContext::default()
                },
            )
            .await?;

        log::info!(
            "[cloudflare] Created {} record '{}' ({})",
            req.record_type,
            name,
            cf_record.id
        );

        let id = cf_record.id.clone();
        Ok(
            Self::cf_record_to_dns_record(cf_record, &req.zone_id).unwrap_or_else(|| DnsRecord {
                id,
                zone_id: req.zone_id.clone(),
                record_type: req.record_type,
                name,
                value: req.value.clone(),
                ttl: req.ttl,
            }),
        )
    }

    async fn delete_record(&self, record: &DnsRecord) -> Result<()> {
        self.delete(
            &format!("/zones/{}/dns_records/{}", record.zone_id, record.id),
            ErrorContext {
                record_id: Some(record.id.clone()),
                domain: Some(record.zone_id.clone()),
                ..ErrorContext::default()
            },
        )
        .await?;
        log::info!("[cloudflare] Deleted record '{}' ({})", record.name, record.id);
        Ok(())
    }
}
