use crate::application::session_store::{BlockSessionStore, EngineSnapshot};
use crate::domain::models::SirenKind;
use crate::domain::schedule::{active_sessions, aggregate_sirens, sessions_for_device};
use crate::infrastructure::date_provider::DateProvider;
use crate::infrastructure::logger::Logger;
use crate::infrastructure::siren_lookout::{DetectedSiren, SirenLookout};
use crate::infrastructure::siren_tier::SirenTier;
use chrono::NaiveTime;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A detection is blocked only when an active session on this device lists it.
pub fn should_block(
    snapshot: &EngineSnapshot,
    device_id: Option<&str>,
    now: NaiveTime,
    detected: &DetectedSiren,
) -> bool {
    if !matches!(
        detected.kind,
        SirenKind::Android | SirenKind::Websites | SirenKind::Keywords
    ) {
        return false;
    }
    let sessions = sessions_for_device(&snapshot.sessions, device_id);
    active_sessions(&sessions, now).into_iter().any(|session| {
        aggregate_sirens(session, &snapshot.blocklists).contains(detected.kind, &detected.siren_id)
    })
}

#[derive(Debug)]
pub struct DetectionHandle {
    active: Arc<AtomicBool>,
}

impl DetectionHandle {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Later detections are ignored. The lookout keeps its callback slot.
    pub fn unsubscribe(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

/// Must be called from within a tokio runtime; blocking calls are spawned on it.
pub fn register_siren_detection_handler(
    store: &BlockSessionStore,
    lookout: &dyn SirenLookout,
    tier: Arc<dyn SirenTier>,
    logger: Arc<dyn Logger>,
    date_provider: Arc<dyn DateProvider>,
    device_id: Option<String>,
) -> DetectionHandle {
    let active = Arc::new(AtomicBool::new(true));
    let receiver = store.subscribe();
    let runtime = tokio::runtime::Handle::current();
    let callback_active = Arc::clone(&active);

    lookout.on_siren_detected(Arc::new(move |detected: DetectedSiren| {
        if !callback_active.load(Ordering::SeqCst) {
            return;
        }
        let now = match date_provider.time_of_day(date_provider.now_ms()) {
            Ok(now) => now,
            Err(error) => {
                logger.error(&format!("failed to read clock for detection: {error}"));
                return;
            }
        };
        let block = should_block(&receiver.borrow(), device_id.as_deref(), now, &detected);
        if !block {
            return;
        }

        let tier = Arc::clone(&tier);
        let logger = Arc::clone(&logger);
        runtime.spawn(async move {
            match tier.block(&detected.siren_id).await {
                Ok(()) => logger.info(&format!(
                    "blocked {} siren {}",
                    detected.kind, detected.siren_id
                )),
                Err(error) => logger.error(&format!(
                    "failed to block siren {}: {error}",
                    detected.siren_id
                )),
            }
        });
    }));

    DetectionHandle { active }
}
