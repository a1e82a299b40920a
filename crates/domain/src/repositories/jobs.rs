use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;

use crate::entities::jobs::JobEntity;
use crate::value_objects::email_jobs::EmailJobPayload;

#[automock]
#[async_trait]
pub trait JobRepository {
    /// Enqueues an email job. Returns `None` when the payload's dedup
    /// key already exists (ON CONFLICT DO NOTHING), which is how a
    /// notification stays exactly-once under duplicate webhook delivery.
    async fn enqueue_email_job(&self, payload: EmailJobPayload) -> Result<Option<i64>>;

    /// Claims the next due queued email job with FOR UPDATE SKIP LOCKED
    /// and marks it running, inside one transaction.
    async fn lock_next_email_job(&self) -> Result<Option<JobEntity>>;

    async fn mark_job_done(&self, job_id: i64) -> Result<()>;

    /// Puts the job back in the queue for a later attempt.
    async fn reschedule_job(&self, job_id: i64, error: &str, run_at: DateTime<Utc>) -> Result<()>;

    /// Terminal failure after the retry budget is spent.
    async fn mark_job_failed(&self, job_id: i64, error: &str) -> Result<()>;
}
