use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{error, info};

use application::{
    interfaces::mail::MailTransport, usecases::email_dispatch::EmailDispatchUseCase,
};
use domain::repositories::jobs::JobRepository;

/// Drains the email queue, sleeping only when it runs dry. A busy
/// queue is processed back to back so a burst of checkouts does not
/// wait a poll interval per mail.
pub async fn run<J, M>(
    usecase: Arc<EmailDispatchUseCase<J, M>>,
    poll_interval: Duration,
) -> Result<()>
where
    J: JobRepository + Send + Sync + 'static,
    M: MailTransport + Send + Sync + 'static,
{
    info!("email worker: starting loop");
    loop {
        match usecase.dispatch_next().await {
            Ok(true) => {}
            Ok(false) => tokio::time::sleep(poll_interval).await,
            Err(e) => {
                error!(error = %e, "email worker: dispatch failed");
                tokio::time::sleep(poll_interval).await;
            }
        }
    }
}
