//! Delayed verification scheduling

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleMode {
    Immediate,
    Delayed(Duration),
}

/// A verification poll waiting to run
///
/// `setup_run` ties the job to one setup run of the domain; the poller drops
/// jobs whose run has been superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationJob {
    pub domain_id: String,
    pub setup_run: u64,
}

impl VerificationJob {
    pub fn new(domain_id: impl Into<String>, setup_run: u64) -> Self {
        Self {
            domain_id: domain_id.into(),
            setup_run,
        }
    }
}

/// Schedules verification polls
///
/// Jobs fire at least once, at or after the requested delay.
#[async_trait]
pub trait VerificationScheduler: Send + Sync {
    async fn schedule(&self, job: VerificationJob, mode: ScheduleMode) -> CoreResult<()>;
}

/// In-process scheduler delivering jobs on an mpsc channel
///
/// Feed the receiver to [`VerificationPoller::run`](crate::services::VerificationPoller::run).
/// Pending delays do not survive a restart; a durable queue implements the
/// trait for that.
#[derive(Clone)]
pub struct TokioVerificationScheduler {
    tx: mpsc::UnboundedSender<VerificationJob>,
}

impl TokioVerificationScheduler {
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<VerificationJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl VerificationScheduler for TokioVerificationScheduler {
    async fn schedule(&self, job: VerificationJob, mode: ScheduleMode) -> CoreResult<()> {
        if self.tx.is_closed() {
            return Err(CoreError::Scheduler(
                "verification queue is closed".to_string(),
            ));
        }
        match mode {
            ScheduleMode::Immediate => self
                .tx
                .send(job)
                .map_err(|_| CoreError::Scheduler("verification queue is closed".to_string())),
            ScheduleMode::Delayed(delay) => {
                let tx = self.tx.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if tx.send(job).is_err() {
                        log::warn!("Verification queue closed before a delayed job fired");
                    }
                });
                Ok(())
            }
        }
    }
}
