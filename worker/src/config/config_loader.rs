use anyhow::{Ok, Result};

use super::config_model::{Database, DotEnvyConfig, Smtp, Worker};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let smtp = Smtp {
        host: std::env::var("SMTP_HOST").expect("SMTP_HOST is invalid"),
        port: std::env::var("SMTP_PORT")
            .expect("SMTP_PORT is invalid")
            .parse()?,
        username: std::env::var("SMTP_USERNAME").expect("SMTP_USERNAME is invalid"),
        password: std::env::var("SMTP_PASSWORD").expect("SMTP_PASSWORD is invalid"),
        from: std::env::var("SMTP_FROM").expect("SMTP_FROM is invalid"),
    };

    let worker = Worker {
        base_url: std::env::var("APP_BASE_URL").expect("APP_BASE_URL is invalid"),
        poll_interval_secs: std::env::var("WORKER_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?,
        max_attempts: std::env::var("WORKER_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()?,
        cleanup_interval_secs: std::env::var("WORKER_CLEANUP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()?,
    };

    Ok(DotEnvyConfig {
        database,
        smtp,
        worker,
    })
}
