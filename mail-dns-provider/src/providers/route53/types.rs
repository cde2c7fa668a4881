//! Route53 REST/XML payloads (API version 2013-04-01)

use serde::{Deserialize, Serialize};

// ============ Hosted zones ============

#[derive(Debug, Deserialize)]
pub struct ListHostedZonesResponse {
    #[serde(rename = "HostedZones", default)]
    pub hosted_zones: HostedZones,
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "NextMarker")]
    pub next_marker: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HostedZones {
    #[serde(rename = "HostedZone", default)]
    pub hosted_zone: Vec<HostedZone>,
}

#[derive(Debug, Deserialize)]
pub struct HostedZone {
    /// `/hostedzone/Z123...`
    #[serde(rename = "Id")]
    pub id: String,
    /// Zone name with trailing dot.
    #[serde(rename = "Name")]
    pub name: String,
}

// ============ Record sets ============

#[derive(Debug, Deserialize)]
pub struct ListResourceRecordSetsResponse {
    #[serde(rename = "ResourceRecordSets", default)]
    pub resource_record_sets: ResourceRecordSets,
    #[serde(rename = "IsTruncated", default)]
    pub is_truncated: bool,
    #[serde(rename = "NextRecordName")]
    pub next_record_name: Option<String>,
    #[serde(rename = "NextRecordType")]
    pub next_record_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResourceRecordSets {
    #[serde(rename = "ResourceRecordSet", default)]
    pub resource_record_set: Vec<ResourceRecordSet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecordSet {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    /// Absent for alias records.
    #[serde(rename = "TTL", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(rename = "ResourceRecords", default)]
    pub resource_records: ResourceRecords,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecords {
    #[serde(rename = "ResourceRecord", default)]
    pub resource_record: Vec<ResourceRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// Presentation-format value; TXT values are quoted.
    #[serde(rename = "Value")]
    pub value: String,
}

// ============ Changes ============

#[derive(Debug, Serialize)]
pub struct ChangeResourceRecordSetsRequest {
    #[serde(rename = "@xmlns")]
    pub xmlns: &'static str,
    #[serde(rename = "ChangeBatch")]
    pub change_batch: ChangeBatch,
}

#[derive(Debug, Serialize)]
pub struct ChangeBatch {
    #[serde(rename = "Comment", skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(rename = "Changes")]
    pub changes: Changes,
}

#[derive(Debug, Serialize)]
pub struct Changes {
    #[serde(rename = "Change")]
    pub change: Vec<Change>,
}

#[derive(Debug, Serialize)]
pub struct Change {
    #[serde(rename = "Action")]
    pub action: &'static str,
    #[serde(rename = "ResourceRecordSet")]
    pub resource_record_set: ResourceRecordSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Create,
    Delete,
    Upsert,
}

impl ChangeAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
            Self::Upsert => "UPSERT",
        }
    }
}

/// Body of both `ChangeResourceRecordSetsResponse` and `GetChangeResponse`.
#[derive(Debug, Deserialize)]
pub struct ChangeInfoResponse {
    #[serde(rename = "ChangeInfo")]
    pub change_info: ChangeInfo,
}

#[derive(Debug, Deserialize)]
pub struct ChangeInfo {
    /// `/change/C123...`
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Status")]
    pub status: String,
}

// ============ Errors ============

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Error")]
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message", default)]
    pub message: String,
}

/// `InvalidChangeBatch` uses its own root element with a message list.
#[derive(Debug, Deserialize)]
pub struct InvalidChangeBatchResponse {
    #[serde(rename = "Messages")]
    pub messages: Messages,
}

#[derive(Debug, Deserialize)]
pub struct Messages {
    #[serde(rename = "Message", default)]
    pub message: Vec<String>,
}
