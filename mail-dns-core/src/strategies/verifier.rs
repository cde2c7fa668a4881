//! Checks planned records against live DNS

use std::sync::Arc;

use crate::config::AutomationSettings;
use crate::records::is_spf_record;
use crate::traits::{DnsLookupError, DnsResolver, LookupResult};
use crate::types::{
    CheckStatus, EmailDnsRecord, PlannedRecord, RecordAction, RecordCheck, RecordKind, RecordPlan,
};

/// Record verifier
///
/// Match rules per kind:
/// - ownership: a TXT value equal to the expected value
/// - DKIM: a `v=DKIM1` value carrying the configured public key
/// - SPF: a `v=spf1` value including the service include; any `v=spf1`
///   value when the plan left an existing SPF record alone
/// - DMARC: any `v=DMARC1` value
/// - delegation: a CNAME target equal to the controlled domain
#[derive(Clone)]
pub struct RecordVerifier {
    resolver: Arc<dyn DnsResolver>,
    settings: Arc<AutomationSettings>,
}

impl RecordVerifier {
    pub fn new(resolver: Arc<dyn DnsResolver>, settings: Arc<AutomationSettings>) -> Self {
        Self { resolver, settings }
    }

    /// Check every record of `plan`, in plan order.
    pub async fn check_plan(&self, plan: &RecordPlan) -> Vec<RecordCheck> {
        let mut checks = Vec::with_capacity(plan.entries.len());
        for entry in &plan.entries {
            checks.push(self.check_record(entry).await);
        }
        checks
    }

    pub async fn check_record(&self, planned: &PlannedRecord) -> RecordCheck {
        let record = &planned.record;
        let lookup = match record.kind {
            RecordKind::Delegation => self.resolver.cname_lookup(&record.name).await,
            _ => self.resolver.txt_lookup(&record.name).await,
        };
        let skipped = planned.action == RecordAction::SkipExisting;
        self.evaluate(record, skipped, lookup)
    }

    fn evaluate(&self, record: &EmailDnsRecord, skipped: bool, lookup: LookupResult) -> RecordCheck {
        let (found, status) = match lookup {
            Ok(values) => {
                let status = if values.iter().any(|v| self.matches(record, skipped, v)) {
                    CheckStatus::Passed
                } else if !has_candidate(record.kind, &values) {
                    CheckStatus::Missing
                } else {
                    CheckStatus::Mismatch
                };
                (values, status)
            }
            Err(DnsLookupError::NoRecords) => (Vec::new(), CheckStatus::Missing),
            Err(DnsLookupError::Failed(e)) => {
                log::warn!("DNS lookup for {} failed: {e}", record.name);
                (Vec::new(), CheckStatus::LookupError(e))
            }
        };
        RecordCheck {
            kind: record.kind,
            name: record.name.clone(),
            expected: record.value.clone(),
            found,
            status,
        }
    }

    fn matches(&self, record: &EmailDnsRecord, skipped: bool, value: &str) -> bool {
        let value = value.trim();
        match record.kind {
            RecordKind::Ownership => value == record.value,
            RecordKind::Dkim => {
                let compact = strip_whitespace(value);
                starts_with_ignore_case(&compact, "v=DKIM1")
                    && compact.contains(&format!(
                        "p={}",
                        strip_whitespace(&self.settings.dkim_public_key)
                    ))
            }
            RecordKind::Spf => {
                is_spf_record(value)
                    && (skipped
                        || value
                            .split_whitespace()
                            .any(|term| {
                                term.strip_prefix("include:")
                                    == Some(self.settings.spf_include.as_str())
                            }))
            }
            RecordKind::Dmarc => starts_with_ignore_case(value, "v=DMARC1"),
            RecordKind::Delegation => value.eq_ignore_ascii_case(&record.value),
        }
    }
}

/// Whether any value belongs to the expected record family, making a miss a
/// mismatch rather than an absence.
fn has_candidate(kind: RecordKind, values: &[String]) -> bool {
    values.iter().any(|v| {
        let v = v.trim();
        match kind {
            RecordKind::Dkim => starts_with_ignore_case(v, "v=DKIM1"),
            RecordKind::Spf => is_spf_record(v),
            RecordKind::Dmarc => starts_with_ignore_case(v, "v=DMARC1"),
            RecordKind::Ownership | RecordKind::Delegation => true,
        }
    })
}

fn strip_whitespace(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
