use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::{error, info};

use application::usecases::{
    email_dispatch::{EmailDispatchConfig, EmailDispatchUseCase},
    maintenance::MaintenanceUseCase,
};
use infra::{
    email::smtp_mailer::SmtpMailer,
    postgres::{
        postgres_connection,
        repositories::{jobs::JobsPostgres, tokens::TokensPostgres},
    },
};
use worker::{config::config_loader, services};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        error!("Worker exited with error: {}", error);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    infra::observability::init_observability("worker")?;

    let dotenvy_env = config_loader::load()?;
    info!("ENV has been loaded");

    let postgres_pool = postgres_connection::establish_connection(&dotenvy_env.database.url)?;
    info!("Postgres connection has been established");
    let db_pool = Arc::new(postgres_pool);

    let jobs_repository = Arc::new(JobsPostgres::new(Arc::clone(&db_pool)));
    let tokens_repository = Arc::new(TokensPostgres::new(Arc::clone(&db_pool)));

    let mailer = Arc::new(SmtpMailer::new(
        &dotenvy_env.smtp.host,
        dotenvy_env.smtp.port,
        dotenvy_env.smtp.username.clone(),
        dotenvy_env.smtp.password.clone(),
        dotenvy_env.smtp.from.clone(),
    )?);

    let email_dispatch_usecase = Arc::new(EmailDispatchUseCase::new(
        jobs_repository,
        mailer,
        EmailDispatchConfig {
            base_url: dotenvy_env.worker.base_url.clone(),
            max_attempts: dotenvy_env.worker.max_attempts,
        },
    ));
    let maintenance_usecase = Arc::new(MaintenanceUseCase::new(tokens_repository));

    let email_loop = tokio::spawn(services::worker_loop::run(
        email_dispatch_usecase,
        Duration::from_secs(dotenvy_env.worker.poll_interval_secs),
    ));
    let cleanup_loop = tokio::spawn(services::cleanup_loop::run(
        maintenance_usecase,
        Duration::from_secs(dotenvy_env.worker.cleanup_interval_secs),
    ));

    tokio::select! {
        result = email_loop => result??,
        result = cleanup_loop => result??,
    };
    Ok(())
}
