use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tracing::error;

use application::usecases::maintenance::MaintenanceUseCase;
use domain::repositories::tokens::TokenRepository;

pub async fn run<T>(usecase: Arc<MaintenanceUseCase<T>>, interval: Duration) -> Result<()>
where
    T: TokenRepository + Send + Sync + 'static,
{
    loop {
        if let Err(e) = usecase.purge_expired_tokens().await {
            error!(error = %e, "cleanup: token purge failed");
        }

        tokio::time::sleep(interval).await;
    }
}
