use crate::application::listener::ListenerHandle;
use crate::application::session_store::{BlockSessionStore, EngineSnapshot};
use crate::domain::models::BlockingSchedule;
use crate::domain::schedule::{compute_schedule, schedule_key, sessions_for_device};
use crate::infrastructure::date_provider::DateProvider;
use crate::infrastructure::foreground_service::{ForegroundService, ForegroundServiceConfig};
use crate::infrastructure::logger::Logger;
use crate::infrastructure::siren_lookout::SirenLookout;
use crate::infrastructure::siren_tier::SirenTier;
use chrono::NaiveTime;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityTransition {
    Started,
    Stopped,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleReaction {
    /// Present when the schedule differs from the last synchronized one.
    pub schedule: Option<Vec<BlockingSchedule>>,
    pub transition: ActivityTransition,
}

/// Remembers the last synchronized schedule and whether a session was active.
#[derive(Debug, Default)]
pub struct ScheduleChangeTracker {
    last_schedule_key: Option<String>,
    was_active_now: bool,
    device_id: Option<String>,
}

impl ScheduleChangeTracker {
    pub fn new(device_id: Option<String>) -> Self {
        Self {
            last_schedule_key: None,
            was_active_now: false,
            device_id,
        }
    }

    pub fn last_schedule_key(&self) -> Option<&str> {
        self.last_schedule_key.as_deref()
    }

    pub fn was_active_now(&self) -> bool {
        self.was_active_now
    }

    /// Updates the comparison state before returning, so the caller may await
    /// the reaction without a later change seeing stale flags.
    pub fn evaluate(&mut self, snapshot: &EngineSnapshot, now: NaiveTime) -> Option<ScheduleReaction> {
        let sessions = sessions_for_device(&snapshot.sessions, self.device_id.as_deref());
        let selection = compute_schedule(&sessions, &snapshot.blocklists, now);
        let key = schedule_key(&selection.schedule);

        let schedule_changed = self.last_schedule_key.as_deref() != Some(key.as_str());
        let transition = match (self.was_active_now, selection.has_active_session) {
            (false, true) => ActivityTransition::Started,
            (true, false) => ActivityTransition::Stopped,
            _ => ActivityTransition::Unchanged,
        };
        if !schedule_changed && transition == ActivityTransition::Unchanged {
            return None;
        }

        self.last_schedule_key = Some(key);
        self.was_active_now = selection.has_active_session;

        Some(ScheduleReaction {
            schedule: schedule_changed.then_some(selection.schedule),
            transition,
        })
    }
}

#[derive(Clone)]
pub struct ScheduleSyncContext {
    pub lookout: Arc<dyn SirenLookout>,
    pub tier: Arc<dyn SirenTier>,
    pub foreground: Arc<dyn ForegroundService>,
    pub logger: Arc<dyn Logger>,
    pub date_provider: Arc<dyn DateProvider>,
    pub foreground_config: ForegroundServiceConfig,
    pub device_id: Option<String>,
}

impl ScheduleSyncContext {
    /// Failures are logged, never propagated; the tracker has already moved on.
    async fn apply(&self, reaction: ScheduleReaction) {
        if let Some(schedule) = reaction.schedule {
            let entries = schedule.len();
            match self.tier.update_blocking_schedule(schedule).await {
                Ok(()) => self
                    .logger
                    .info(&format!("blocking schedule synchronized ({entries} entries)")),
                Err(error) => self
                    .logger
                    .error(&format!("failed to synchronize blocking schedule: {error}")),
            }
        }

        match reaction.transition {
            ActivityTransition::Started => {
                if let Err(error) = self.lookout.start_watching().await {
                    self.logger
                        .error(&format!("failed to start watching sirens: {error}"));
                }
                if let Err(error) = self
                    .foreground
                    .start(Some(self.foreground_config.clone()))
                    .await
                {
                    self.logger
                        .error(&format!("failed to start foreground service: {error}"));
                }
            }
            ActivityTransition::Stopped => {
                if let Err(error) = self.lookout.stop_watching().await {
                    self.logger
                        .error(&format!("failed to stop watching sirens: {error}"));
                }
                if let Err(error) = self.foreground.stop().await {
                    self.logger
                        .error(&format!("failed to stop foreground service: {error}"));
                }
            }
            ActivityTransition::Unchanged => {}
        }
    }

    fn react(&self, tracker: &mut ScheduleChangeTracker, snapshot: &EngineSnapshot) -> Option<ScheduleReaction> {
        let now = match self.date_provider.time_of_day(self.date_provider.now_ms()) {
            Ok(now) => now,
            Err(error) => {
                self.logger
                    .error(&format!("failed to read wall-clock time: {error}"));
                return None;
            }
        };
        tracker.evaluate(snapshot, now)
    }
}

/// Evaluates immediately so sessions present at registration are enforced.
/// Must be called from within a tokio runtime.
pub fn register_schedule_change_listener(
    store: &BlockSessionStore,
    context: ScheduleSyncContext,
) -> ListenerHandle {
    let mut receiver = store.subscribe();
    let mut tracker = ScheduleChangeTracker::new(context.device_id.clone());
    let initial = context.react(&mut tracker, &receiver.borrow_and_update());

    ListenerHandle::spawn(async move {
        if let Some(reaction) = initial {
            context.apply(reaction).await;
        }
        while receiver.changed().await.is_ok() {
            let snapshot = (*receiver.borrow_and_update()).clone();
            if let Some(reaction) = context.react(&mut tracker, &snapshot) {
                context.apply(reaction).await;
            }
        }
    })
}
