use crate::domain::models::{BlockingSchedule, Sirens};
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;

/// Applies blocking on the host (overlay, DNS filter, ...).
#[async_trait]
pub trait SirenTier: Send + Sync {
    async fn target(&self, sirens: Sirens) -> Result<(), InfraError>;

    async fn block(&self, siren_id: &str) -> Result<(), InfraError>;

    async fn update_blocking_schedule(
        &self,
        schedule: Vec<BlockingSchedule>,
    ) -> Result<(), InfraError>;
}
