use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use tracing::{error, info, warn};

use domain::{
    entities::jobs::JobEntity,
    repositories::jobs::JobRepository,
    value_objects::email_jobs::{EmailJobPayload, EmailKind},
};

use crate::interfaces::mail::MailTransport;

const BASE_BACKOFF_SECS: i64 = 30;
const MAX_BACKOFF_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct EmailDispatchConfig {
    /// Public origin used to build activation and reset links.
    pub base_url: String,
    pub max_attempts: i32,
}

pub struct EmailDispatchUseCase<J, M>
where
    J: JobRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    job_repo: Arc<J>,
    mailer: Arc<M>,
    config: EmailDispatchConfig,
}

impl<J, M> EmailDispatchUseCase<J, M>
where
    J: JobRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    pub fn new(job_repo: Arc<J>, mailer: Arc<M>, config: EmailDispatchConfig) -> Self {
        Self {
            job_repo,
            mailer,
            config,
        }
    }

    /// Claims and delivers one queued email job. Returns `Ok(false)`
    /// when the queue is empty so the caller can sleep.
    pub async fn dispatch_next(&self) -> Result<bool> {
        let Some(job) = self.job_repo.lock_next_email_job().await? else {
            return Ok(false);
        };

        let payload: EmailJobPayload = match serde_json::from_value(job.payload.clone()) {
            Ok(payload) => payload,
            Err(err) => {
                // Retrying cannot fix a payload we wrote wrong.
                error!(job_id = job.id, parse_error = %err, "email: unreadable payload");
                self.job_repo
                    .mark_job_failed(job.id, &format!("unreadable payload: {}", err))
                    .await?;
                return Ok(true);
            }
        };

        let (subject, body) = self.render(&payload);
        match self.mailer.send(&payload.recipient, &subject, &body).await {
            Ok(()) => {
                self.job_repo.mark_job_done(job.id).await?;
                info!(
                    job_id = job.id,
                    kind = payload.kind.as_str(),
                    recipient = %payload.recipient,
                    "email: delivered"
                );
            }
            Err(err) => self.handle_send_failure(&job, &payload, err).await?,
        }
        Ok(true)
    }

    async fn handle_send_failure(
        &self,
        job: &JobEntity,
        payload: &EmailJobPayload,
        err: anyhow::Error,
    ) -> Result<()> {
        // The claim already incremented `attempts`.
        if job.attempts >= self.config.max_attempts {
            error!(
                job_id = job.id,
                attempts = job.attempts,
                kind = payload.kind.as_str(),
                send_error = ?err,
                "email: giving up after retry budget"
            );
            self.job_repo
                .mark_job_failed(job.id, &err.to_string())
                .await
        } else {
            let delay_secs = backoff_secs(job.attempts);
            let run_at = Utc::now() + Duration::seconds(delay_secs);
            warn!(
                job_id = job.id,
                attempts = job.attempts,
                delay_secs,
                send_error = ?err,
                "email: delivery failed, rescheduling"
            );
            self.job_repo
                .reschedule_job(job.id, &err.to_string(), run_at)
                .await
        }
    }

    fn render(&self, payload: &EmailJobPayload) -> (String, String) {
        let base = self.config.base_url.trim_end_matches('/');
        match payload.kind {
            EmailKind::Activation => {
                let token = payload.token.as_deref().unwrap_or_default();
                (
                    "Activate your account".to_string(),
                    format!(
                        "<p>Welcome! Activate your account by following \
                         <a href=\"{base}/accounts/activate?token={token}\">this link</a>. \
                         The link expires in 24 hours.</p>"
                    ),
                )
            }
            EmailKind::ActivationComplete => (
                "Your account is active".to_string(),
                format!(
                    "<p>Your account is now active. \
                     <a href=\"{base}/login\">Sign in</a> and start browsing.</p>"
                ),
            ),
            EmailKind::PasswordReset => {
                let token = payload.token.as_deref().unwrap_or_default();
                (
                    "Reset your password".to_string(),
                    format!(
                        "<p>Someone requested a password reset for this address. \
                         <a href=\"{base}/accounts/password-reset?token={token}\">Choose a new \
                         password</a> within the next hour, or ignore this mail.</p>"
                    ),
                )
            }
            EmailKind::PasswordResetComplete => (
                "Your password was changed".to_string(),
                format!(
                    "<p>Your password was changed. If this was not you, \
                     <a href=\"{base}/accounts/password-reset/request\">reset it</a> \
                     immediately.</p>"
                ),
            ),
            EmailKind::OrderConfirmation => {
                let order_id = payload.order_id.unwrap_or_default();
                let total = format_minor(payload.total_minor.unwrap_or_default());
                (
                    format!("Order #{order_id} confirmed"),
                    format!(
                        "<p>Thanks for your purchase! Order #{order_id} for {total} is paid \
                         and your movies are ready to watch.</p>"
                    ),
                )
            }
        }
    }
}

/// 30s, 60s, 120s, ... capped at one hour.
fn backoff_secs(attempts: i32) -> i64 {
    let exponent = attempts.clamp(0, 30) as u32;
    (BASE_BACKOFF_SECS.saturating_mul(1_i64 << exponent)).min(MAX_BACKOFF_SECS)
}

fn format_minor(amount_minor: i32) -> String {
    format!("${}.{:02}", amount_minor / 100, (amount_minor % 100).abs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::repositories::jobs::MockJobRepository;
    use domain::value_objects::email_jobs::EMAIL_JOB_TYPE;

    use crate::interfaces::mail::MockMailTransport;

    fn config() -> EmailDispatchConfig {
        EmailDispatchConfig {
            base_url: "https://cinema.example.com/".to_string(),
            max_attempts: 5,
        }
    }

    fn queued_job(attempts: i32, payload: serde_json::Value) -> JobEntity {
        JobEntity {
            id: 1,
            type_: EMAIL_JOB_TYPE.to_string(),
            payload,
            dedup_key: None,
            run_at: Utc::now(),
            attempts,
            locked_at: Some(Utc::now()),
            locked_by: Some("worker-1".to_string()),
            error: None,
            status: "running".to_string(),
            created_at: Utc::now(),
        }
    }

    fn activation_payload() -> serde_json::Value {
        serde_json::json!({
            "kind": "activation",
            "recipient": "user@example.com",
            "token": "tok123"
        })
    }

    #[tokio::test]
    async fn empty_queue_reports_false() {
        let mut job_repo = MockJobRepository::new();
        job_repo.expect_lock_next_email_job().returning(|| Ok(None));

        let usecase = EmailDispatchUseCase::new(
            Arc::new(job_repo),
            Arc::new(MockMailTransport::new()),
            config(),
        );
        assert!(!usecase.dispatch_next().await.unwrap());
    }

    #[tokio::test]
    async fn delivered_job_is_marked_done() {
        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_lock_next_email_job()
            .returning(|| Ok(Some(queued_job(1, activation_payload()))));
        job_repo
            .expect_mark_job_done()
            .with(mockall::predicate::eq(1))
            .times(1)
            .returning(|_| Ok(()));

        let mut mailer = MockMailTransport::new();
        mailer
            .expect_send()
            .withf(|recipient, subject, body| {
                recipient == "user@example.com"
                    && subject == "Activate your account"
                    && body.contains("https://cinema.example.com/accounts/activate?token=tok123")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let usecase = EmailDispatchUseCase::new(Arc::new(job_repo), Arc::new(mailer), config());
        assert!(usecase.dispatch_next().await.unwrap());
    }

    #[tokio::test]
    async fn failed_send_reschedules_with_backoff() {
        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_lock_next_email_job()
            .returning(|| Ok(Some(queued_job(2, activation_payload()))));
        job_repo
            .expect_reschedule_job()
            .withf(|job_id, error, run_at| {
                let delay = (*run_at - Utc::now()).num_seconds();
                *job_id == 1 && error.contains("smtp down") && (115..=120).contains(&delay)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut mailer = MockMailTransport::new();
        mailer
            .expect_send()
            .returning(|_, _, _| Err(anyhow::anyhow!("smtp down")));

        let usecase = EmailDispatchUseCase::new(Arc::new(job_repo), Arc::new(mailer), config());
        assert!(usecase.dispatch_next().await.unwrap());
    }

    #[tokio::test]
    async fn retry_budget_exhaustion_fails_the_job() {
        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_lock_next_email_job()
            .returning(|| Ok(Some(queued_job(5, activation_payload()))));
        job_repo
            .expect_mark_job_failed()
            .withf(|job_id, error| *job_id == 1 && error.contains("smtp down"))
            .times(1)
            .returning(|_, _| Ok(()));

        let mut mailer = MockMailTransport::new();
        mailer
            .expect_send()
            .returning(|_, _, _| Err(anyhow::anyhow!("smtp down")));

        let usecase = EmailDispatchUseCase::new(Arc::new(job_repo), Arc::new(mailer), config());
        assert!(usecase.dispatch_next().await.unwrap());
    }

    #[tokio::test]
    async fn unreadable_payload_fails_permanently() {
        let mut job_repo = MockJobRepository::new();
        job_repo
            .expect_lock_next_email_job()
            .returning(|| Ok(Some(queued_job(0, serde_json::json!({"bogus": true})))));
        job_repo
            .expect_mark_job_failed()
            .withf(|_, error| error.contains("unreadable payload"))
            .times(1)
            .returning(|_, _| Ok(()));

        let usecase = EmailDispatchUseCase::new(
            Arc::new(job_repo),
            Arc::new(MockMailTransport::new()),
            config(),
        );
        assert!(usecase.dispatch_next().await.unwrap());
    }

    #[test]
    fn backoff_doubles_and_caps_at_an_hour() {
        assert_eq!(backoff_secs(0), 30);
        assert_eq!(backoff_secs(1), 60);
        assert_eq!(backoff_secs(4), 480);
        assert_eq!(backoff_secs(10), 3600);
        assert_eq!(backoff_secs(50), 3600);
    }

    #[test]
    fn order_confirmation_formats_the_total() {
        let usecase = EmailDispatchUseCase::new(
            Arc::new(MockJobRepository::new()),
            Arc::new(MockMailTransport::new()),
            config(),
        );
        let (subject, body) = usecase.render(&EmailJobPayload {
            kind: EmailKind::OrderConfirmation,
            recipient: "user@example.com".to_string(),
            token: None,
            order_id: Some(77),
            total_minor: Some(1998),
        });
        assert_eq!(subject, "Order #77 confirmed");
        assert!(body.contains("$19.98"));
    }
}
