#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub database: Database,
    pub smtp: Smtp,
    pub worker: Worker,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Smtp {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct Worker {
    /// Public origin used in email links.
    pub base_url: String,
    pub poll_interval_secs: u64,
    pub max_attempts: i32,
    pub cleanup_interval_secs: u64,
}
