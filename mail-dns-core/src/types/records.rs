//! Email-authentication record types

use serde::{Deserialize, Serialize};

use mail_dns_provider::DnsRecordType;

/// Role a record plays in email authentication
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Ownership,
    Dkim,
    Spf,
    Dmarc,
    /// Customer-side CNAME of the subdomain method
    Delegation,
}

impl RecordKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Ownership => "Ownership verification",
            Self::Dkim => "DKIM",
            Self::Spf => "SPF",
            Self::Dmarc => "DMARC",
            Self::Delegation => "Delegation CNAME",
        }
    }
}

/// One record to publish or check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EmailDnsRecord {
    pub kind: RecordKind,
    pub record_type: DnsRecordType,
    /// Fully-qualified host name
    pub name: String,
    pub value: String,
    pub ttl: u32,
}

impl EmailDnsRecord {
    pub fn txt(kind: RecordKind, name: impl Into<String>, value: impl Into<String>, ttl: u32) -> Self {
        Self {
            kind,
            record_type: DnsRecordType::Txt,
            name: name.into(),
            value: value.into(),
            ttl,
        }
    }

    pub fn cname(name: impl Into<String>, target: impl Into<String>, ttl: u32) -> Self {
        Self {
            kind: RecordKind::Delegation,
            record_type: DnsRecordType::Cname,
            name: name.into(),
            value: target.into(),
            ttl,
        }
    }
}

/// What to do with a planned record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecordAction {
    Create,
    /// An equivalent record is already published; leave it alone
    SkipExisting,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlannedRecord {
    pub record: EmailDnsRecord,
    pub action: RecordAction,
}

/// The four email records for one host, in creation order
/// (ownership, DKIM, SPF, DMARC)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordPlan {
    pub entries: Vec<PlannedRecord>,
}

impl RecordPlan {
    /// Records that must be created, in order.
    pub fn to_create(&self) -> impl Iterator<Item = &EmailDnsRecord> {
        self.entries
            .iter()
            .filter(|e| e.action == RecordAction::Create)
            .map(|e| &e.record)
    }

    pub fn records(&self) -> impl Iterator<Item = &EmailDnsRecord> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn get(&self, kind: RecordKind) -> Option<&PlannedRecord> {
        self.entries.iter().find(|e| e.record.kind == kind)
    }

    pub fn is_skipped(&self, kind: RecordKind) -> bool {
        self.get(kind)
            .is_some_and(|e| e.action == RecordAction::SkipExisting)
    }
}
