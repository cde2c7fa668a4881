use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ============ Provider Types ============

/// Identifies which DNS hosting API a provider talks to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Cloudflare DNS (REST, bearer token). Requires feature `cloudflare`.
    Cloudflare,
    /// AWS Route53 (REST/XML, `SigV4`). Requires feature `route53`.
    Route53,
}

impl ProviderType {
    /// Human-readable provider name, used in user-facing messages.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Cloudflare => "Cloudflare",
            Self::Route53 => "AWS Route53",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloudflare => write!(f, "cloudflare"),
            Self::Route53 => write!(f, "route53"),
        }
    }
}

// ============ Zone Types ============

/// Status of a zone within a DNS provider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ZoneStatus {
    /// Zone is active and resolving.
    Active,
    /// Zone is pending activation (nameservers not yet delegated).
    Pending,
    /// Zone was moved away or paused.
    Paused,
    /// Status could not be determined.
    Unknown,
}

/// A zone (hosted zone) managed by a DNS provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProviderZone {
    /// Provider-specific zone identifier.
    pub id: String,
    /// Zone apex name without trailing dot (e.g., `"example.com"`).
    pub name: String,
    /// Which provider hosts this zone.
    pub provider: ProviderType,
    /// Current zone status.
    pub status: ZoneStatus,
}

// ============ DNS Record Types ============

/// DNS record types used for email authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DnsRecordType {
    /// Text record (ownership token, DKIM, SPF, DMARC).
    Txt,
    /// Canonical name record (subdomain delegation).
    Cname,
}

impl DnsRecordType {
    /// Wire name of the record type (`"TXT"`, `"CNAME"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Txt => "TXT",
            Self::Cname => "CNAME",
        }
    }
}

impl std::fmt::Display for DnsRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record as stored at a provider.
///
/// `name` is always the fully-qualified host name without trailing dot, and
/// `value` is the unquoted record content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    /// Provider-specific record identifier.
    pub id: String,
    /// Zone identifier this record belongs to.
    pub zone_id: String,
    /// Record type.
    pub record_type: DnsRecordType,
    /// Fully-qualified record name.
    pub name: String,
    /// Record content.
    pub value: String,
    /// Time to live in seconds.
    pub ttl: u32,
}

/// Request to create a new DNS record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDnsRecordRequest {
    /// Zone identifier to create the record in.
    pub zone_id: String,
    /// Record type.
    pub record_type: DnsRecordType,
    /// Fully-qualified record name.
    pub name: String,
    /// Record content (unquoted).
    pub value: String,
    /// Time to live in seconds.
    pub ttl: u32,
}

/// Filter used when listing records of a zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    /// Exact fully-qualified name to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Record type to match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_type: Option<DnsRecordType>,
}

impl RecordQuery {
    /// Query for records of one type at one name.
    pub fn new(name: impl Into<String>, record_type: DnsRecordType) -> Self {
        Self {
            name: Some(name.into()),
            record_type: Some(record_type),
        }
    }
}

// ============ Batch Operation Types ============

/// Result of a batch create operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateResult {
    /// Successfully created records, in request order.
    pub created_records: Vec<DnsRecord>,
    /// Details about each failed creation.
    pub failures: Vec<BatchCreateFailure>,
    /// Provider change identifier for asynchronously applied batches (Route53).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_id: Option<String>,
}

impl BatchCreateResult {
    /// Number of records that were created.
    pub fn success_count(&self) -> usize {
        self.created_records.len()
    }

    /// Number of records that failed.
    pub fn failed_count(&self) -> usize {
        self.failures.len()
    }
}

/// Information about a single failed record creation in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchCreateFailure {
    /// Index of the failed request in the original request slice.
    pub request_index: usize,
    /// Name of the record that failed.
    pub record_name: String,
    /// Human-readable reason for the failure.
    pub reason: String,
}

/// Propagation status of a submitted change batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeStatus {
    /// Change accepted but not yet applied on all authoritative servers.
    Pending,
    /// Change applied on all authoritative servers.
    Insync,
    /// Provider reported a status this library does not know; treated as failed.
    Failed(String),
}

impl ChangeStatus {
    /// Parse the status string returned by the provider API.
    pub fn parse(status: &str) -> Self {
        match status.trim().to_uppercase().as_str() {
            "PENDING" => Self::Pending,
            "INSYNC" => Self::Insync,
            other => Self::Failed(other.to_string()),
        }
    }
}

// ============ Credential Types ============

/// Validation error for provider credentials.
///
/// Returned when credential fields are missing or empty.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CredentialValidationError {
    /// A required credential field is missing entirely.
    MissingField {
        /// Which provider the error relates to.
        provider: ProviderType,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
    /// A credential field is present but empty/whitespace-only.
    EmptyField {
        /// Which provider the error relates to.
        provider: ProviderType,
        /// Machine-readable field key.
        field: String,
        /// Human-readable field label.
        label: String,
    },
}

impl std::fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { label, .. } => write!(f, "Missing required field: {label}"),
            Self::EmptyField { label, .. } => write!(f, "Field must not be empty: {label}"),
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Type-safe credential container for the supported DNS providers.
///
/// Pass this to [`create_provider()`](crate::create_provider) to instantiate a provider.
///
/// # Serialization
///
/// Serialized as a tagged enum with `"provider"` as the tag and `"credentials"` as the content:
///
/// ```json
/// { "provider": "cloudflare", "credentials": { "api_token": "..." } }
/// ```
///
/// `Debug` output never contains secret values.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", content = "credentials")]
pub enum ProviderCredentials {
    /// Cloudflare credentials.
    #[serde(rename = "cloudflare")]
    Cloudflare {
        /// Cloudflare API token (needs `Zone:Read` and `DNS:Edit`).
        api_token: String,
    },

    /// AWS Route53 credentials.
    #[serde(rename = "route53")]
    Route53 {
        /// AWS access key ID.
        access_key_id: String,
        /// AWS secret access key.
        secret_access_key: String,
        /// Signing region, `us-east-1` when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        region: Option<String>,
    },
}

impl std::fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloudflare { .. } => f
                .debug_struct("Cloudflare")
                .field("api_token", &"<redacted>")
                .finish(),
            Self::Route53 {
                access_key_id,
                region,
                ..
            } => f
                .debug_struct("Route53")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .field("region", region)
                .finish(),
        }
    }
}

impl ProviderCredentials {
    /// Construct credentials from a flat key-value map (e.g. a JSON request body),
    /// validating required fields.
    pub fn from_map(
        provider: ProviderType,
        map: &HashMap<String, String>,
    ) -> Result<Self, CredentialValidationError> {
        match provider {
            ProviderType::Cloudflare => Ok(Self::Cloudflare {
                api_token: Self::get_required_field(provider, map, "apiToken", "API Token")?,
            }),
            ProviderType::Route53 => Ok(Self::Route53 {
                access_key_id: Self::get_required_field(
                    provider,
                    map,
                    "accessKeyId",
                    "Access Key ID",
                )?,
                secret_access_key: Self::get_required_field(
                    provider,
                    map,
                    "secretAccessKey",
                    "Secret Access Key",
                )?,
                region: map
                    .get("region")
                    .map(|r| r.trim().to_string())
                    .filter(|r| !r.is_empty()),
            }),
        }
    }

    /// Obtain a required field from the map and verify that it is not empty
    fn get_required_field(
        provider: ProviderType,
        map: &HashMap<String, String>,
        key: &str,
        label: &str,
    ) -> Result<String, CredentialValidationError> {
        match map.get(key) {
            None => Err(CredentialValidationError::MissingField {
                provider,
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) if v.trim().is_empty() => Err(CredentialValidationError::EmptyField {
                provider,
                field: key.to_string(),
                label: label.to_string(),
            }),
            Some(v) => Ok(v.trim().to_string()),
        }
    }

    /// Returns the [`ProviderType`] corresponding to this credential variant.
    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::Cloudflare { .. } => ProviderType::Cloudflare,
            Self::Route53 { .. } => ProviderType::Route53,
        }
    }
}
