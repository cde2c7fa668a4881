//! Email DNS record set builder
//!
//! Pure functions: given a host, an ownership token and the settings, the plan
//! is always the same four records in the same order.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::AutomationSettings;
use crate::error::{CoreError, CoreResult};
use crate::types::{EmailDnsRecord, PlannedRecord, RecordAction, RecordKind, RecordPlan};

const MAX_DOMAIN_LENGTH: usize = 253;
const MAX_LABEL_LENGTH: usize = 63;
const TOKEN_BYTES: usize = 16;
const SHORT_ID_LENGTH: usize = 8;

/// Check that `domain` is a lowercase FQDN (no trailing dot).
pub fn validate_domain_name(domain: &str) -> CoreResult<()> {
    let invalid = |reason: &str| CoreError::InvalidDomain {
        domain: domain.to_string(),
        reason: reason.to_string(),
    };

    if domain.is_empty() || domain.len() > MAX_DOMAIN_LENGTH {
        return Err(invalid("length must be 1-253 characters"));
    }
    if domain.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("must be lowercase"));
    }
    if domain.contains("..") {
        return Err(invalid("empty label"));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(invalid("at least two labels required"));
    }
    for label in &labels {
        if label.is_empty() {
            return Err(invalid("empty label"));
        }
        if label.len() > MAX_LABEL_LENGTH {
            return Err(invalid("label longer than 63 characters"));
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err(invalid("label starts or ends with a hyphen"));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(invalid("invalid character"));
        }
    }
    if labels
        .last()
        .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_digit()))
    {
        return Err(invalid("top-level label must not be numeric"));
    }
    Ok(())
}

/// Fresh random ownership token (32 lowercase hex chars).
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Whether a TXT value is an SPF policy.
pub fn is_spf_record(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    v == "v=spf1" || v.starts_with("v=spf1 ")
}

/// Ownership record host: `_<service>-verification.<domain>`.
pub fn ownership_record_name(domain: &str, settings: &AutomationSettings) -> String {
    format!("_{}-verification.{domain}", settings.service_name)
}

/// Ownership record value: `<service>-verification=<token>`.
pub fn ownership_record_value(token: &str, settings: &AutomationSettings) -> String {
    format!("{}-verification={token}", settings.service_name)
}

pub fn dkim_record_name(domain: &str, settings: &AutomationSettings) -> String {
    format!("{}._domainkey.{domain}", settings.dkim_selector)
}

pub fn dmarc_record_name(domain: &str) -> String {
    format!("_dmarc.{domain}")
}

/// Plan the four email records for `domain`.
///
/// When `spf_exists` is set, the SPF entry is kept in the plan as
/// [`RecordAction::SkipExisting`] and never emitted for creation.
pub fn build_records(
    domain: &str,
    token: &str,
    settings: &AutomationSettings,
    spf_exists: bool,
) -> RecordPlan {
    let ttl = settings.record_ttl;
    let create = |record| PlannedRecord {
        record,
        action: RecordAction::Create,
    };

    let ownership = EmailDnsRecord::txt(
        RecordKind::Ownership,
        ownership_record_name(domain, settings),
        ownership_record_value(token, settings),
        ttl,
    );
    let dkim = EmailDnsRecord::txt(
        RecordKind::Dkim,
        dkim_record_name(domain, settings),
        format!("v=DKIM1; k=rsa; p={}", settings.dkim_public_key),
        ttl,
    );
    let spf = EmailDnsRecord::txt(
        RecordKind::Spf,
        domain,
        format!("v=spf1 include:{} ~all", settings.spf_include),
        ttl,
    );
    let dmarc = EmailDnsRecord::txt(
        RecordKind::Dmarc,
        dmarc_record_name(domain),
        format!(
            "v=DMARC1; p={}; rua=mailto:{}",
            settings.dmarc_policy, settings.dmarc_rua
        ),
        ttl,
    );

    RecordPlan {
        entries: vec![
            create(ownership),
            create(dkim),
            PlannedRecord {
                record: spf,
                action: if spf_exists {
                    RecordAction::SkipExisting
                } else {
                    RecordAction::Create
                },
            },
            create(dmarc),
        ],
    }
}

/// Stable 8-character label fragment for a user.
///
/// First eight alphanumerics of the user id (hyphens dropped), or a hash
/// prefix when the id has too few.
pub fn short_user_id(user_id: &str) -> String {
    let short: String = user_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(SHORT_ID_LENGTH)
        .collect();
    if short.len() == SHORT_ID_LENGTH {
        return short;
    }
    let digest = Sha256::digest(user_id.as_bytes());
    hex::encode(digest)[..SHORT_ID_LENGTH].to_string()
}

/// `mail-<short user id>`
pub fn delegation_label(user_id: &str) -> String {
    format!("mail-{}", short_user_id(user_id))
}

/// Customer-side CNAME host: `mail-<short user id>.<domain>`.
pub fn delegation_host(domain: &str, user_id: &str) -> String {
    format!("{}.{domain}", delegation_label(user_id))
}

/// Host inside the service zone carrying the delegated records of one
/// customer domain: `mail-<short user id>-<domain hash>.<controlled domain>`.
///
/// The domain hash keeps the hosts of one user's domains apart.
pub fn service_host(domain: &str, user_id: &str, settings: &AutomationSettings) -> String {
    let digest = Sha256::digest(domain.trim_end_matches('.').to_ascii_lowercase().as_bytes());
    format!(
        "{}-{}.{}",
        delegation_label(user_id),
        &hex::encode(digest)[..SHORT_ID_LENGTH],
        settings.controlled_domain
    )
}
