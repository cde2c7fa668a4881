//! DNS verification results

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::records::RecordKind;

/// Result of checking one expected record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    /// NXDOMAIN or no records of the type
    Missing,
    /// Records exist but none carries the expected value
    Mismatch,
    /// Resolver failure other than "no records"
    LookupError(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RecordCheck {
    pub kind: RecordKind,
    pub name: String,
    pub expected: String,
    /// Values the resolver returned
    pub found: Vec<String>,
    pub status: CheckStatus,
}

impl RecordCheck {
    pub fn passed(&self) -> bool {
        self.status == CheckStatus::Passed
    }
}

/// Result of one verification pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerificationResult {
    /// Every expected record resolved with the expected value
    pub verified: bool,
    pub checks: Vec<RecordCheck>,
    /// Suggested delay before the next pass; the poller default applies when absent
    pub next_check: Option<Duration>,
    /// Set when the provider reports a terminal failure; no further polling
    pub failure: Option<String>,
    /// Human-readable state for the progress message
    pub message: Option<String>,
}

impl VerificationResult {
    pub fn from_checks(checks: Vec<RecordCheck>) -> Self {
        let verified = !checks.is_empty() && checks.iter().all(RecordCheck::passed);
        Self {
            verified,
            checks,
            ..Self::default()
        }
    }

    /// Not verified yet, check again after `next_check`.
    pub fn pending(message: impl Into<String>, next_check: Option<Duration>) -> Self {
        Self {
            message: Some(message.into()),
            next_check,
            ..Self::default()
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            failure: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Number of checks that hit resolver failures.
    pub fn lookup_errors(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| matches!(c.status, CheckStatus::LookupError(_)))
            .count()
    }

    /// Kinds that did not pass.
    pub fn failing_kinds(&self) -> Vec<RecordKind> {
        self.checks
            .iter()
            .filter(|c| !c.passed())
            .map(|c| c.kind)
            .collect()
    }
}

/// What one poll did with a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Domain is terminal, setup never started, or the job belongs to an
    /// older setup run
    Skipped,
    Completed,
    /// Not verified yet; another poll was scheduled
    Rescheduled { next_check: Duration },
    /// Not verified yet after an on-demand check; the scheduled polls carry on
    Pending,
    Failed { reason: String },
}
