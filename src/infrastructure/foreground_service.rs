use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ForegroundServiceConfig {
    pub title: String,
    pub body: String,
}

impl Default for ForegroundServiceConfig {
    fn default() -> Self {
        Self {
            title: "Block session running".to_string(),
            body: "Sirens are being blocked".to_string(),
        }
    }
}

/// Keeps the watch process alive while a session is active.
#[async_trait]
pub trait ForegroundService: Send + Sync {
    async fn start(&self, config: Option<ForegroundServiceConfig>) -> Result<(), InfraError>;

    async fn stop(&self) -> Result<(), InfraError>;

    fn is_running(&self) -> bool;
}
