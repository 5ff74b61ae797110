//! Recording fakes for the host-facing ports.

use crate::domain::models::{AndroidSiren, BlockSession, BlockingSchedule, Blocklist, Sirens};
use crate::infrastructure::error::InfraError;
use crate::infrastructure::foreground_service::{ForegroundService, ForegroundServiceConfig};
use crate::infrastructure::siren_lookout::{DetectedSiren, SirenDetectedCallback, SirenLookout};
use crate::infrastructure::siren_tier::SirenTier;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct CallJournal {
    calls: Mutex<Vec<String>>,
}

impl CallJournal {
    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().expect("journal lock").push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("journal lock").clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with(prefix))
            .count()
    }

    pub fn position(&self, call: &str) -> Option<usize> {
        self.calls().iter().position(|recorded| recorded == call)
    }
}

pub struct FakeLookout {
    journal: Arc<CallJournal>,
    enabled: AtomicBool,
    fail: AtomicBool,
    callback: Mutex<Option<SirenDetectedCallback>>,
}

impl FakeLookout {
    pub fn new(journal: Arc<CallJournal>) -> Self {
        Self {
            journal,
            enabled: AtomicBool::new(true),
            fail: AtomicBool::new(false),
            callback: Mutex::new(None),
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn emit(&self, detected: DetectedSiren) {
        let callback = self.callback.lock().expect("callback lock").clone();
        if let Some(callback) = callback {
            callback(detected);
        }
    }

    fn outcome(&self, call: String) -> Result<(), InfraError> {
        self.journal.record(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(InfraError::port("siren lookout", "observation unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SirenLookout for FakeLookout {
    async fn start_watching(&self) -> Result<(), InfraError> {
        self.outcome("lookout.start".to_string())
    }

    async fn stop_watching(&self) -> Result<(), InfraError> {
        self.outcome("lookout.stop".to_string())
    }

    async fn watch_sirens(&self, sirens: Vec<String>) -> Result<(), InfraError> {
        self.outcome(format!("lookout.watch:[{}]", sirens.join(",")))
    }

    fn on_siren_detected(&self, callback: SirenDetectedCallback) {
        *self.callback.lock().expect("callback lock") = Some(callback);
    }

    async fn is_enabled(&self) -> Result<bool, InfraError> {
        Ok(self.enabled.load(Ordering::SeqCst))
    }

    async fn ask_permission(&self) -> Result<(), InfraError> {
        self.outcome("lookout.ask_permission".to_string())
    }
}

pub struct FakeTier {
    journal: Arc<CallJournal>,
    fail: AtomicBool,
    schedules: Mutex<Vec<Vec<BlockingSchedule>>>,
}

impl FakeTier {
    pub fn new(journal: Arc<CallJournal>) -> Self {
        Self {
            journal,
            fail: AtomicBool::new(false),
            schedules: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn schedules(&self) -> Vec<Vec<BlockingSchedule>> {
        self.schedules.lock().expect("schedules lock").clone()
    }

    fn outcome(&self, call: String) -> Result<(), InfraError> {
        self.journal.record(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(InfraError::port("siren tier", "enforcement unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SirenTier for FakeTier {
    async fn target(&self, sirens: Sirens) -> Result<(), InfraError> {
        self.outcome(format!("tier.target:{}", sirens.android.len()))
    }

    async fn block(&self, siren_id: &str) -> Result<(), InfraError> {
        self.outcome(format!("tier.block:{siren_id}"))
    }

    async fn update_blocking_schedule(
        &self,
        schedule: Vec<BlockingSchedule>,
    ) -> Result<(), InfraError> {
        let ids = schedule
            .iter()
            .map(|entry| entry.id.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.schedules
            .lock()
            .expect("schedules lock")
            .push(schedule.clone());
        self.outcome(format!("tier.schedule:[{ids}]"))
    }
}

pub struct FakeForegroundService {
    journal: Arc<CallJournal>,
    running: AtomicBool,
}

impl FakeForegroundService {
    pub fn new(journal: Arc<CallJournal>) -> Self {
        Self {
            journal,
            running: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ForegroundService for FakeForegroundService {
    async fn start(&self, config: Option<ForegroundServiceConfig>) -> Result<(), InfraError> {
        let title = config.map(|config| config.title).unwrap_or_default();
        self.journal.record(format!("foreground.start:{title}"));
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<(), InfraError> {
        self.journal.record("foreground.stop");
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub fn session(id: &str, start: &str, end: &str, blocklist_ids: &[&str]) -> BlockSession {
    BlockSession {
        id: id.to_string(),
        name: format!("Session {id}"),
        started_at: start.to_string(),
        ended_at: end.to_string(),
        blocklist_ids: blocklist_ids.iter().map(|id| id.to_string()).collect(),
        blocklists: Vec::new(),
        devices: Vec::new(),
        blocking_conditions: Vec::new(),
        start_notification_id: None,
        end_notification_id: None,
    }
}

pub fn android_blocklist(id: &str, packages: &[&str]) -> Blocklist {
    Blocklist {
        id: id.to_string(),
        name: format!("Blocklist {id}"),
        sirens: Sirens {
            android: packages
                .iter()
                .map(|package| AndroidSiren::new(*package, *package))
                .collect(),
            ..Sirens::default()
        },
    }
}

/// Polls until `condition` holds; panics after two seconds.
pub async fn wait_until<F>(description: &str, condition: F)
where
    F: Fn() -> bool,
{
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for {description}");
}

/// Lets spawned listener tasks drain pending notifications.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}
