use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use domain::repositories::tokens::TokenRepository;

/// Housekeeping run periodically by the worker.
pub struct MaintenanceUseCase<T>
where
    T: TokenRepository + Send + Sync + 'static,
{
    token_repo: Arc<T>,
}

impl<T> MaintenanceUseCase<T>
where
    T: TokenRepository + Send + Sync + 'static,
{
    pub fn new(token_repo: Arc<T>) -> Self {
        Self { token_repo }
    }

    /// Deletes activation, reset and refresh tokens past their expiry.
    pub async fn purge_expired_tokens(&self) -> Result<u64> {
        let purged = self.token_repo.delete_expired_tokens().await?;
        if purged > 0 {
            info!(purged, "maintenance: removed expired tokens");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::repositories::tokens::MockTokenRepository;

    #[tokio::test]
    async fn reports_purge_count() {
        let mut token_repo = MockTokenRepository::new();
        token_repo
            .expect_delete_expired_tokens()
            .times(1)
            .returning(|| Ok(3));

        let usecase = MaintenanceUseCase::new(Arc::new(token_repo));
        assert_eq!(usecase.purge_expired_tokens().await.unwrap(), 3);
    }
}
