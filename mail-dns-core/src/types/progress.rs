//! Setup progress state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Step of a domain setup run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SetupStep {
    Initializing,
    CreatingRecords,
    WaitingPropagation,
    Verifying,
    Completed,
    Failed,
}

impl SetupStep {
    /// Percentage shown for this step.
    pub fn percentage(self) -> u8 {
        match self {
            Self::Initializing => 10,
            Self::CreatingRecords => 30,
            Self::WaitingPropagation => 60,
            Self::Verifying => 80,
            Self::Completed => 100,
            Self::Failed => 0,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether `next` may follow `self` within the state machine.
    ///
    /// `Initializing` starts a new run from anywhere. Terminal steps admit
    /// nothing else. `Failed` may follow any non-terminal step; every other
    /// move must not lower the percentage.
    pub fn can_advance_to(self, next: Self) -> bool {
        if next == Self::Initializing {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        next == Self::Failed || next.percentage() >= self.percentage()
    }
}

/// Progress of the current setup run, persisted on the domain row and
/// published on the domain's progress topic
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SetupProgress {
    pub step: SetupStep,
    /// 0-100
    pub percentage: u8,
    /// Message shown to the user
    pub message: String,
    /// Short user-facing failure summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SetupProgress {
    pub fn new(step: SetupStep, message: impl Into<String>) -> Self {
        Self {
            step,
            percentage: step.percentage(),
            message: message.into(),
            error: None,
            updated_at: Utc::now(),
        }
    }

    pub fn failed(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(SetupStep::Failed, message)
        }
    }
}

/// Payload published on `domain-setup:<domainId>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub domain_id: String,
    pub progress: SetupProgress,
}

/// Topic name for a domain's progress events.
pub fn progress_topic(domain_id: &str) -> String {
    format!("domain-setup:{domain_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SetupStep; 6] = [
        SetupStep::Initializing,
        SetupStep::CreatingRecords,
        SetupStep::WaitingPropagation,
        SetupStep::Verifying,
        SetupStep::Completed,
        SetupStep::Failed,
    ];

    #[test]
    fn percentages_follow_steps() {
        let pct: Vec<u8> = ALL.iter().map(|s| s.percentage()).collect();
        assert_eq!(pct, vec![10, 30, 60, 80, 100, 0]);
    }

    #[test]
    fn forward_moves_allowed() {
        use SetupStep as S;
        assert!(S::Initializing.can_advance_to(S::CreatingRecords));
        assert!(S::CreatingRecords.can_advance_to(S::WaitingPropagation));
        assert!(S::Initializing.can_advance_to(S::WaitingPropagation));
        assert!(S::WaitingPropagation.can_advance_to(S::Verifying));
        assert!(S::Verifying.can_advance_to(S::Verifying));
        assert!(S::Verifying.can_advance_to(S::Completed));
    }

    #[test]
    fn backward_and_terminal_moves_rejected() {
        use SetupStep as S;
        assert!(!S::Verifying.can_advance_to(S::WaitingPropagation));
        assert!(!S::Completed.can_advance_to(S::Verifying));
        assert!(!S::Completed.can_advance_to(S::Failed));
        assert!(!S::Failed.can_advance_to(S::Completed));
    }

    #[test]
    fn failed_from_any_live_step_and_restart_from_anywhere() {
        for step in ALL {
            assert!(step.can_advance_to(SetupStep::Initializing));
            assert_eq!(step.can_advance_to(SetupStep::Failed), !step.is_terminal());
        }
    }

    #[test]
    fn progress_payload_shape() {
        let event = ProgressEvent {
            domain_id: "d1".to_string(),
            progress: SetupProgress::failed("Setup failed", "Cloudflare rejected the credentials"),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["domainId"], "d1");
        assert_eq!(json["progress"]["step"], "failed");
        assert_eq!(json["progress"]["percentage"], 0);
        assert_eq!(json["progress"]["error"], "Cloudflare rejected the credentials");
        assert_eq!(progress_topic("d1"), "domain-setup:d1");
    }
}
