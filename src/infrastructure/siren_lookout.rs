use crate::domain::models::SirenKind;
use crate::infrastructure::error::InfraError;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedSiren {
    pub kind: SirenKind,
    pub siren_id: String,
}

impl DetectedSiren {
    pub fn new(kind: SirenKind, siren_id: impl Into<String>) -> Self {
        Self {
            kind,
            siren_id: siren_id.into(),
        }
    }
}

pub type SirenDetectedCallback = Arc<dyn Fn(DetectedSiren) + Send + Sync>;

/// Observes foreground apps, sites and keywords on the host.
#[async_trait]
pub trait SirenLookout: Send + Sync {
    async fn start_watching(&self) -> Result<(), InfraError>;

    async fn stop_watching(&self) -> Result<(), InfraError>;

    /// Replaces the set of android packages being observed.
    async fn watch_sirens(&self, sirens: Vec<String>) -> Result<(), InfraError>;

    /// Registers the detection callback, replacing any previous one.
    fn on_siren_detected(&self, callback: SirenDetectedCallback);

    async fn is_enabled(&self) -> Result<bool, InfraError>;

    async fn ask_permission(&self) -> Result<(), InfraError>;
}
