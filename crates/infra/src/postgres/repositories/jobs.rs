use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::{Connection, insert_into, prelude::*, update};

use crate::postgres::postgres_connection::PgPoolSquad;
use domain::{
    entities::jobs::{InsertJobEntity, JobEntity},
    repositories::jobs::JobRepository,
    schema::jobs,
    value_objects::{
        email_jobs::{EMAIL_JOB_TYPE, EmailJobPayload},
        enums::job_statuses::JobStatus,
    },
};

pub struct JobsPostgres {
    db_pool: Arc<PgPoolSquad>,
    claimant: String,
}

impl JobsPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self {
            db_pool,
            claimant: format!("worker-{}", std::process::id()),
        }
    }
}

#[async_trait]
impl JobRepository for JobsPostgres {
    async fn enqueue_email_job(&self, payload: EmailJobPayload) -> Result<Option<i64>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let job = InsertJobEntity {
            type_: EMAIL_JOB_TYPE.to_string(),
            dedup_key: payload.dedup_key(),
            payload: serde_json::to_value(&payload)?,
            run_at: Utc::now(),
            attempts: 0,
            status: JobStatus::Queued.to_string(),
        };

        // NULL dedup keys never collide, so token mails always enqueue;
        // keyed mails hit the partial unique index at most once.
        let inserted = insert_into(jobs::table)
            .values(&job)
            .on_conflict(jobs::dedup_key)
            .do_nothing()
            .returning(jobs::id)
            .get_result::<i64>(&mut conn)
            .optional()?;

        Ok(inserted)
    }

    async fn lock_next_email_job(&self) -> Result<Option<JobEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;
        let claimant = self.claimant.clone();

        let claimed = conn.transaction::<Option<JobEntity>, diesel::result::Error, _>(|tx| {
            let candidate = jobs::table
                .filter(jobs::type_.eq(EMAIL_JOB_TYPE))
                .filter(jobs::status.eq(JobStatus::Queued.to_string()))
                .filter(jobs::run_at.le(Utc::now()))
                .order(jobs::run_at.asc())
                .limit(1)
                .select(jobs::id)
                .for_update()
                .skip_locked()
                .first::<i64>(tx)
                .optional()?;

            let Some(job_id) = candidate else {
                return Ok(None);
            };

            let job = update(jobs::table.find(job_id))
                .set((
                    jobs::status.eq(JobStatus::Running.to_string()),
                    jobs::attempts.eq(jobs::attempts + 1),
                    jobs::locked_at.eq(Utc::now()),
                    jobs::locked_by.eq(&claimant),
                ))
                .returning(JobEntity::as_returning())
                .get_result::<JobEntity>(tx)?;

            Ok(Some(job))
        })?;

        Ok(claimed)
    }

    async fn mark_job_done(&self, job_id: i64) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(JobStatus::Done.to_string()),
                jobs::locked_at.eq(None::<DateTime<Utc>>),
                jobs::locked_by.eq(None::<String>),
                jobs::error.eq(None::<String>),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn reschedule_job(&self, job_id: i64, error: &str, run_at: DateTime<Utc>) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(JobStatus::Queued.to_string()),
                jobs::run_at.eq(run_at),
                jobs::locked_at.eq(None::<DateTime<Utc>>),
                jobs::locked_by.eq(None::<String>),
                jobs::error.eq(error),
            ))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn mark_job_failed(&self, job_id: i64, error: &str) -> Result<()> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        update(jobs::table.find(job_id))
            .set((
                jobs::status.eq(JobStatus::Failed.to_string()),
                jobs::locked_at.eq(None::<DateTime<Utc>>),
                jobs::locked_by.eq(None::<String>),
                jobs::error.eq(error),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
