//! Route53 `DnsProvider` implementation

use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::providers::common::{normalize_domain_name, parse_record_type, unquote_txt};
use crate::traits::{DnsProvider, ErrorContext, ProviderErrorMapper};
use crate::types::{
    BatchCreateResult, ChangeStatus, CreateDnsRecordRequest, DnsRecord, DnsRecordType,
    ProviderType, ProviderZone, RecordQuery, ZoneStatus,
};

use super::types::{
    Change, ChangeAction, ChangeBatch, ChangeInfoResponse, ChangeResourceRecordSetsRequest,
    Changes, ListHostedZonesResponse, ListResourceRecordSetsResponse, ResourceRecord,
    ResourceRecordSet, ResourceRecords,
};
use super::{API_VERSION, MAX_ITEMS, Route53Provider, XML_NAMESPACE};

/// Maximum length of one character-string inside a TXT value.
const TXT_CHUNK_LEN: usize = 255;

/// Strip the `/hostedzone/` prefix from a zone id.
pub(crate) fn short_zone_id(id: &str) -> &str {
    id.trim_start_matches("/hostedzone/")
}

/// Strip the `/change/` prefix from a change id.
pub(crate) fn short_change_id(id: &str) -> &str {
    id.trim_start_matches("/change/")
}

/// Absolute name with trailing dot, as Route53 stores it.
fn absolute_name(name: &str) -> String {
    format!("{}.", normalize_domain_name(name))
}

/// Presentation form of a value: TXT is quoted and split into strings of at
/// most 255 bytes.
pub(crate) fn encode_value(record_type: DnsRecordType, value: &str) -> String {
    match record_type {
        DnsRecordType::Txt => {
            let escaped: Vec<String> = txt_chunks(value)
                .into_iter()
                .map(|chunk| {
                    format!("\"{}\"", chunk.replace('\\', "\\\\").replace('"', "\\\""))
                })
                .collect();
            if escaped.is_empty() {
                "\"\"".to_string()
            } else {
                escaped.join(" ")
            }
        }
        DnsRecordType::Cname => absolute_name(value),
    }
}

/// Split a TXT value into character-strings of at most `TXT_CHUNK_LEN`
/// bytes, never inside a UTF-8 sequence.
fn txt_chunks(value: &str) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = value;
    while !rest.is_empty() {
        let mut end = rest.len().min(TXT_CHUNK_LEN);
        while !rest.is_char_boundary(end) {
            end -= 1;
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}

fn decode_value(record_type: DnsRecordType, value: &str) -> String {
    match record_type {
        DnsRecordType::Txt => unquote_txt(value),
        DnsRecordType::Cname => normalize_domain_name(value),
    }
}

impl Route53Provider {
    fn rrset_path(zone_id: &str) -> String {
        format!("/{API_VERSION}/hostedzone/{}/rrset", short_zone_id(zone_id))
    }

    /// One `DnsRecord` per value of a record set; empty for unmanaged types.
    fn rrset_to_records(zone_id: &str, rrset: &ResourceRecordSet) -> Vec<DnsRecord> {
        let Some(record_type) = parse_record_type(&rrset.record_type) else {
            return Vec::new();
        };
        let name = normalize_domain_name(&rrset.name);
        rrset
            .resource_records
            .resource_record
            .iter()
            .map(|rr| DnsRecord {
                id: format!("{}:{name}", record_type.as_str()),
                zone_id: short_zone_id(zone_id).to_string(),
                record_type,
                name: name.clone(),
                value: decode_value(record_type, &rr.value),
                ttl: rrset.ttl.unwrap_or_default(),
            })
            .collect()
    }

    /// The record set at exactly `name`/`record_type`, if any.
    async fn find_rrset(
        &self,
        zone_id: &str,
        name: &str,
        record_type: DnsRecordType,
    ) -> Result<Option<ResourceRecordSet>> {
        let response: ListResourceRecordSetsResponse = self
            .get_xml(
                &Self::rrset_path(zone_id),
                &[
                    ("name", absolute_name(name)),
                    ("type", record_type.as_str().to_string()),
                    ("maxitems", "1".to_string()),
                ],
                ErrorContext::zone(zone_id),
            )
            .await?;

        let wanted = normalize_domain_name(name);
        Ok(response
            .resource_record_sets
            .resource_record_set
            .into_iter()
            .find(|rrset| {
                normalize_domain_name(&rrset.name) == wanted
                    && rrset.record_type.eq_ignore_ascii_case(record_type.as_str())
            }))
    }

    /// Submit one change batch and return the short change id.
    async fn submit_changes(
        &self,
        zone_id: &str,
        changes: Vec<Change>,
        comment: &str,
        ctx: ErrorContext,
    ) -> Result<String> {
        let request = ChangeResourceRecordSetsRequest {
            xmlns: XML_NAMESPACE,
            change_batch: ChangeBatch {
                comment: Some(comment.to_string()),
                changes: Changes { change: changes },
            },
        };
        let response: ChangeInfoResponse = self
            .post_xml(&Self::rrset_path(zone_id), &request, ctx)
            .await?;
        let change_id = short_change_id(&response.change_info.id).to_string();
        log::info!(
            "[route53] Submitted change {change_id} ({})",
            response.change_info.status
        );
        Ok(change_id)
    }
}

/// Requests grouped by record set, in first-seen order.
fn group_by_rrset<'a, T>(
    items: &'a [T],
    key: impl Fn(&T) -> (String, DnsRecordType),
) -> Vec<((String, DnsRecordType), Vec<&'a T>)> {
    let mut groups: Vec<((String, DnsRecordType), Vec<&T>)> = Vec::new();
    for item in items {
        let k = key(item);
        if let Some((_, members)) = groups.iter_mut().find(|(gk, _)| *gk == k) {
            members.push(item);
        } else {
            groups.push((k, vec![item]));
        }
    }
    groups
}

#[async_trait]
impl DnsProvider for Route53Provider {
    fn id(&self) -> &'static str {
        "route53"
    }

    async fn validate_credentials(&self) -> Result<bool> {
        match self
            .get_xml::<ListHostedZonesResponse>(
                &format!("/{API_VERSION}/hostedzone"),
                &[("maxitems", "1".to_string())],
                ErrorContext::default(),
            )
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.is_auth_error() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_zones(&self) -> Result<Vec<ProviderZone>> {
        let mut zones = Vec::new();
        let mut marker: Option<String> = None;

        loop {
            let mut query = vec![("maxitems", MAX_ITEMS.to_string())];
            if let Some(m) = &marker {
                query.push(("marker", m.clone()));
            }

            let response: ListHostedZonesResponse = self
                .get_xml(
                    &format!("/{API_VERSION}/hostedzone"),
                    &query,
                    ErrorContext::default(),
                )
                .await?;

            zones.extend(
                response
                    .hosted_zones
                    .hosted_zone
                    .into_iter()
                    .map(|zone| ProviderZone {
                        id: short_zone_id(&zone.id).to_string(),
                        name: normalize_domain_name(&zone.name),
                        provider: ProviderType::Route53,
                        status: ZoneStatus::Active,
                    }),
            );

            match response.next_marker {
                Some(next) if response.is_truncated => marker = Some(next),
                _ => break,
            }
        }

        Ok(zones)
    }

    async fn list_records(&self, zone_id: &str, query: &RecordQuery) -> Result<Vec<DnsRecord>> {
        if let Some(name) = &query.name {
            let wanted = normalize_domain_name(name);
            let mut params = vec![
                ("name", absolute_name(name)),
                ("maxitems", MAX_ITEMS.to_string()),
            ];
            if let Some(record_type) = query.record_type {
                params.push(("type", record_type.as_str().to_string()));
            }

            let response: ListResourceRecordSetsResponse = self
                .get_xml(&Self::rrset_path(zone_id), &params, ErrorContext::zone(zone_id))
                .await?;

            return Ok(response
                .resource_record_sets
                .resource_record_set
                .iter()
                .filter(|rrset| normalize_domain_name(&rrset.name) == wanted)
                .flat_map(|rrset| Self::rrset_to_records(zone_id, rrset))
                .filter(|r| query.record_type.is_none_or(|t| r.record_type == t))
                .collect());
        }

        let mut records = Vec::new();
        let mut next: Option<(String, String)> = None;

        loop {
            let mut params = vec![("maxitems", MAX_ITEMS.to_string())];
            if let Some((name, record_type)) = &next {
                params.push(("name", name.clone()));
                params.push(("type", record_type.clone()));
            }

            let response: ListResourceRecordSetsResponse = self
                .get_xml(&Self::rrset_path(zone_id), &params, ErrorContext::zone(zone_id))
                .await?;

            records.extend(
                response
                    .resource_record_sets
                    .resource_record_set
                    .iter()
                    .flat_map(|rrset| Self::rrset_to_records(zone_id, rrset))
                    .filter(|r| query.record_type.is_none_or(|t| r.record_type == t)),
            );

            match (
                response.is_truncated,
                response.next_record_name,
                response.next_record_type,
            ) {
                (true, Some(name), Some(record_type)) => next = Some((name, record_type)),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn create_record(&self, req: &CreateDnsRecordRequest) -> Result<DnsRecord> {
        let mut result = self.batch_create_records(std::slice::from_ref(req)).await?;
        result
            .created_records
            .pop()
            .ok_or_else(|| self.parse_error("Change batch returned no record"))
    }

    async fn delete_record(&self, record: &DnsRecord) -> Result<()> {
        self.batch_delete_records(std::slice::from_ref(record))
            .await
            .map(|_| ())
    }

    /// Submit every request as one atomic change batch.
    ///
    /// Requests for a record set that already exists are merged into it with
    /// `UPSERT` so existing values at the same name survive. Returns `Err` when
    /// Route53 rejects the batch; nothing is applied in that case.
    async fn batch_create_records(
        &self,
        requests: &[CreateDnsRecordRequest],
    ) -> Result<BatchCreateResult> {
        let Some(first) = requests.first() else {
            return Ok(BatchCreateResult::default());
        };
        let zone_id = first.zone_id.clone();
        if let Some(other) = requests.iter().find(|r| r.zone_id != zone_id) {
            return Err(ProviderError::InvalidParameter {
                provider: self.provider_name().to_string(),
                param: "zone_id".to_string(),
                detail: format!(
                    "A change batch targets one hosted zone, got '{zone_id}' and '{}'",
                    other.zone_id
                ),
            });
        }

        let groups = group_by_rrset(requests, |r| {
            (normalize_domain_name(&r.name), r.record_type)
        });

        let mut changes = Vec::with_capacity(groups.len());
        for ((name, record_type), members) in &groups {
            let existing = self.find_rrset(&zone_id, name, *record_type).await?;
            let ttl = members.iter().map(|r| r.ttl).max().unwrap_or_default();

            let mut values: Vec<String> = match (&existing, record_type) {
                (Some(rrset), DnsRecordType::Txt) => rrset
                    .resource_records
                    .resource_record
                    .iter()
                    .map(|rr| rr.value.clone())
                    .collect(),
                _ => Vec::new(),
            };
            for member in members {
                let encoded = encode_value(*record_type, &member.value);
                if !values.contains(&encoded) {
                    values.push(encoded);
                }
            }
            if *record_type == DnsRecordType::Cname {
                values.truncate(1);
            }

            let action = if existing.is_some() {
                ChangeAction::Upsert
            } else {
                ChangeAction::Create
            };
            log::debug!(
                "[route53] {} {record_type} {name} ({} values)",
                action.as_str(),
                values.len()
            );

            changes.push(Change {
                action: action.as_str(),
                resource_record_set: ResourceRecordSet {
                    name: absolute_name(name),
                    record_type: record_type.as_str().to_string(),
                    ttl: Some(ttl),
                    resource_records: ResourceRecords {
                        resource_record: values
                            .into_iter()
                            .map(|value| ResourceRecord { value })
                            .collect(),
                    },
                },
            });
        }

        let change_id = self
            .submit_changes(
                &zone_id,
                changes,
                "Email authentication records",
                ErrorContext {
                    record_name: Some(
                        groups
                            .iter()
                            .map(|((n, _), _)| n.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    ),
                    domain: Some(zone_id.clone()),
                    ..ErrorContext::default()
                },
            )
            .await?;

        Ok(BatchCreateResult {
            created_records: requests
                .iter()
                .map(|r| {
                    let name = normalize_domain_name(&r.name);
                    DnsRecord {
                        id: format!("{}:{name}", r.record_type.as_str()),
                        zone_id: short_zone_id(&zone_id).to_string(),
                        record_type: r.record_type,
                        name,
                        value: r.value.clone(),
                        ttl: r.ttl,
                    }
                })
                .collect(),
            failures: Vec::new(),
            change_id: Some(change_id),
        })
    }

    /// Remove the given values in one change batch.
    ///
    /// A record set losing all its values is deleted; otherwise it is rewritten
    /// with the remaining values. Values already gone are skipped.
    async fn batch_delete_records(&self, records: &[DnsRecord]) -> Result<Option<String>> {
        let Some(first) = records.first() else {
            return Ok(None);
        };
        let zone_id = first.zone_id.clone();

        let groups = group_by_rrset(records, |r| {
            (normalize_domain_name(&r.name), r.record_type)
        });

        let mut changes = Vec::new();
        for ((name, record_type), members) in &groups {
            let Some(existing) = self.find_rrset(&zone_id, name, *record_type).await? else {
                log::warn!("[route53] {record_type} {name} already absent, skipping");
                continue;
            };

            let remove: Vec<String> = members
                .iter()
                .map(|r| encode_value(*record_type, &r.value))
                .collect();
            let remaining: Vec<ResourceRecord> = existing
                .resource_records
                .resource_record
                .iter()
                .filter(|rr| {
                    let decoded = decode_value(*record_type, &rr.value);
                    !remove.contains(&rr.value)
                        && !members.iter().any(|m| m.value == decoded)
                })
                .cloned()
                .collect();

            if remaining.len() == existing.resource_records.resource_record.len() {
                log::warn!("[route53] No matching values left at {record_type} {name}, skipping");
                continue;
            }

            if remaining.is_empty() {
                changes.push(Change {
                    action: ChangeAction::Delete.as_str(),
                    resource_record_set: existing,
                });
            } else {
                changes.push(Change {
                    action: ChangeAction::Upsert.as_str(),
                    resource_record_set: ResourceRecordSet {
                        resource_records: ResourceRecords {
                            resource_record: remaining,
                        },
                        ..existing
                    },
                });
            }
        }

        if changes.is_empty() {
            return Ok(None);
        }

        let change_id = self
            .submit_changes(
                &zone_id,
                changes,
                "Remove email authentication records",
                ErrorContext {
                    record_id: Some(first.id.clone()),
                    domain: Some(zone_id.clone()),
                    ..ErrorContext::default()
                },
            )
            .await?;
        Ok(Some(change_id))
    }

    async fn change_status(&self, change_id: &str) -> Result<ChangeStatus> {
        let response: ChangeInfoResponse = self
            .get_xml(
                &format!("/{API_VERSION}/change/{}", short_change_id(change_id)),
                &[],
                ErrorContext {
                    record_id: Some(change_id.to_string()),
                    ..ErrorContext::default()
                },
            )
            .await?;
        Ok(ChangeStatus::parse(&response.change_info.status))
    }
}
