use crate::application::clock::spawn_clock_ticker;
use crate::application::listener::ListenerHandle;
use crate::application::schedule_sync::{register_schedule_change_listener, ScheduleSyncContext};
use crate::application::session_presence::register_session_presence_listener;
use crate::application::session_store::BlockSessionStore;
use crate::application::siren_detection::{register_siren_detection_handler, DetectionHandle};
use crate::infrastructure::config::EngineConfig;
use crate::infrastructure::date_provider::DateProvider;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::foreground_service::ForegroundService;
use crate::infrastructure::logger::Logger;
use crate::infrastructure::siren_lookout::SirenLookout;
use crate::infrastructure::siren_tier::SirenTier;
use std::sync::Arc;
use std::time::Duration;

/// Host-provided adapters the engine drives.
#[derive(Clone)]
pub struct EnginePorts {
    pub lookout: Arc<dyn SirenLookout>,
    pub tier: Arc<dyn SirenTier>,
    pub foreground: Arc<dyn ForegroundService>,
    pub logger: Arc<dyn Logger>,
    pub date_provider: Arc<dyn DateProvider>,
}

pub struct BlockingEngine {
    config: EngineConfig,
    ports: EnginePorts,
    store: Arc<BlockSessionStore>,
}

impl BlockingEngine {
    pub fn new(config: EngineConfig, ports: EnginePorts) -> Result<Self, InfraError> {
        config.validate()?;
        Ok(Self {
            config,
            ports,
            store: Arc::new(BlockSessionStore::new()),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> Arc<BlockSessionStore> {
        Arc::clone(&self.store)
    }

    /// Runs the permission check, then wires listeners, detection and the ticker.
    /// Must be called from within a tokio runtime.
    pub async fn start(&self) -> EngineHandle {
        self.ensure_lookout_permission().await;

        let device_id = self.config.device_id.clone();
        let presence = register_session_presence_listener(
            &self.store,
            Arc::clone(&self.ports.lookout),
            Arc::clone(&self.ports.logger),
            device_id.clone(),
        );
        let schedule = register_schedule_change_listener(
            &self.store,
            ScheduleSyncContext {
                lookout: Arc::clone(&self.ports.lookout),
                tier: Arc::clone(&self.ports.tier),
                foreground: Arc::clone(&self.ports.foreground),
                logger: Arc::clone(&self.ports.logger),
                date_provider: Arc::clone(&self.ports.date_provider),
                foreground_config: self.config.foreground_service.clone(),
                device_id: device_id.clone(),
            },
        );
        let detection = register_siren_detection_handler(
            &self.store,
            self.ports.lookout.as_ref(),
            Arc::clone(&self.ports.tier),
            Arc::clone(&self.ports.logger),
            Arc::clone(&self.ports.date_provider),
            device_id,
        );
        let ticker = spawn_clock_ticker(
            Arc::clone(&self.store),
            Duration::from_secs(self.config.tick_interval_seconds),
        );

        self.ports.logger.info(&format!(
            "{} engine started (tick every {}s)",
            self.config.app_name, self.config.tick_interval_seconds
        ));
        EngineHandle {
            presence,
            schedule,
            detection,
            ticker,
            logger: Arc::clone(&self.ports.logger),
        }
    }

    async fn ensure_lookout_permission(&self) {
        let lookout = &self.ports.lookout;
        let logger = &self.ports.logger;
        match lookout.is_enabled().await {
            Ok(true) => {}
            Ok(false) => {
                logger.warn("siren lookout is not enabled, asking for permission");
                if let Err(error) = lookout.ask_permission().await {
                    logger.error(&format!("failed to ask for lookout permission: {error}"));
                }
            }
            Err(error) => logger.error(&format!("failed to query lookout permission: {error}")),
        }
    }
}

pub struct EngineHandle {
    presence: ListenerHandle,
    schedule: ListenerHandle,
    detection: DetectionHandle,
    ticker: ListenerHandle,
    logger: Arc<dyn Logger>,
}

impl EngineHandle {
    pub fn is_running(&self) -> bool {
        self.presence.is_active()
            && self.schedule.is_active()
            && self.detection.is_active()
            && self.ticker.is_active()
    }

    /// Enforcement already handed to the host is left as is.
    pub fn shutdown(self) {
        self.ticker.unsubscribe();
        self.detection.unsubscribe();
        self.schedule.unsubscribe();
        self.presence.unsubscribe();
        self.logger.info("engine stopped");
    }
}
