use crate::application::listener::ListenerHandle;
use crate::application::session_store::{BlockSessionStore, EngineSnapshot};
use crate::domain::schedule::{sessions_for_device, watched_android_sirens};
use crate::infrastructure::logger::Logger;
use crate::infrastructure::siren_lookout::SirenLookout;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceAction {
    Watch(Vec<String>),
    StopWatching,
}

/// Count-based guard around the low-level observation subscription.
#[derive(Debug, Default)]
pub struct SessionPresenceTracker {
    session_count: usize,
    watched_sirens: Vec<String>,
    device_id: Option<String>,
}

impl SessionPresenceTracker {
    pub fn new(device_id: Option<String>) -> Self {
        Self {
            session_count: 0,
            watched_sirens: Vec::new(),
            device_id,
        }
    }

    pub fn is_watching(&self) -> bool {
        self.session_count > 0
    }

    pub fn evaluate(&mut self, snapshot: &EngineSnapshot) -> Option<PresenceAction> {
        let sessions = sessions_for_device(&snapshot.sessions, self.device_id.as_deref());
        let count = sessions.len();
        let sirens = watched_android_sirens(&sessions, &snapshot.blocklists);
        let previous_count = self.session_count;

        let action = match (previous_count, count) {
            (0, 0) => None,
            (_, 0) => Some(PresenceAction::StopWatching),
            (0, _) => Some(PresenceAction::Watch(sirens.clone())),
            (before, after) if before != after || sirens != self.watched_sirens => {
                Some(PresenceAction::Watch(sirens.clone()))
            }
            _ => None,
        };

        self.session_count = count;
        self.watched_sirens = if count > 0 { sirens } else { Vec::new() };
        action
    }
}

async fn apply_presence_action(
    lookout: &dyn SirenLookout,
    logger: &dyn Logger,
    action: PresenceAction,
) {
    match action {
        PresenceAction::Watch(sirens) => {
            let count = sirens.len();
            match lookout.watch_sirens(sirens).await {
                Ok(()) => logger.info(&format!("watching {count} android sirens")),
                Err(error) => logger.error(&format!("failed to watch sirens: {error}")),
            }
        }
        PresenceAction::StopWatching => match lookout.stop_watching().await {
            Ok(()) => logger.info("no block sessions left, stopped watching sirens"),
            Err(error) => logger.error(&format!("failed to stop watching sirens: {error}")),
        },
    }
}

/// Must be called from within a tokio runtime.
pub fn register_session_presence_listener(
    store: &BlockSessionStore,
    lookout: Arc<dyn SirenLookout>,
    logger: Arc<dyn Logger>,
    device_id: Option<String>,
) -> ListenerHandle {
    let mut receiver = store.subscribe();
    let mut tracker = SessionPresenceTracker::new(device_id);
    let initial = tracker.evaluate(&receiver.borrow_and_update());

    ListenerHandle::spawn(async move {
        if let Some(action) = initial {
            apply_presence_action(lookout.as_ref(), logger.as_ref(), action).await;
        }
        while receiver.changed().await.is_ok() {
            let snapshot = (*receiver.borrow_and_update()).clone();
            if let Some(action) = tracker.evaluate(&snapshot) {
                apply_presence_action(lookout.as_ref(), logger.as_ref(), action).await;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Device;
    use crate::infrastructure::logger::{InMemoryLogger, LogLevel};
    use crate::testing::{android_blocklist, session, settle, wait_until, CallJournal, FakeLookout};

    fn snapshot_with(sessions: usize, packages: &[&str]) -> EngineSnapshot {
        let mut snapshot = EngineSnapshot::default();
        let blocklist = android_blocklist("bl-1", packages);
        snapshot.blocklists.insert(blocklist.id.clone(), blocklist);
        snapshot.sessions = (0..sessions)
            .map(|index| session(&format!("ses-{index}"), "09:00", "10:00", &["bl-1"]))
            .collect();
        snapshot
    }

    #[test]
    fn tracker_follows_count_transitions() {
        let mut tracker = SessionPresenceTracker::new(None);
        assert_eq!(tracker.evaluate(&snapshot_with(0, &["pkgA"])), None);
        assert!(!tracker.is_watching());

        assert_eq!(
            tracker.evaluate(&snapshot_with(1, &["pkgA"])),
            Some(PresenceAction::Watch(vec!["pkgA".to_string()]))
        );
        assert!(tracker.is_watching());

        assert_eq!(tracker.evaluate(&snapshot_with(1, &["pkgA"])), None);

        assert_eq!(
            tracker.evaluate(&snapshot_with(2, &["pkgA"])),
            Some(PresenceAction::Watch(vec!["pkgA".to_string()]))
        );

        assert_eq!(
            tracker.evaluate(&snapshot_with(0, &["pkgA"])),
            Some(PresenceAction::StopWatching)
        );
        assert!(!tracker.is_watching());
        assert_eq!(tracker.evaluate(&snapshot_with(0, &["pkgA"])), None);
    }

    #[test]
    fn tracker_reissues_watch_when_sirens_change_at_same_count() {
        let mut tracker = SessionPresenceTracker::new(None);
        tracker.evaluate(&snapshot_with(1, &["pkgA"]));
        assert_eq!(
            tracker.evaluate(&snapshot_with(1, &["pkgA", "pkgB"])),
            Some(PresenceAction::Watch(vec![
                "pkgA".to_string(),
                "pkgB".to_string()
            ]))
        );
        assert!(tracker.is_watching());
    }

    #[test]
    fn tracker_ignores_sessions_of_other_devices() {
        let mut tracker = SessionPresenceTracker::new(Some("dev-laptop".to_string()));
        let mut snapshot = snapshot_with(1, &["pkgA"]);
        snapshot.sessions[0].devices = vec![Device {
            id: "dev-phone".to_string(),
            name: "Phone".to_string(),
            device_type: "android".to_string(),
        }];
        assert_eq!(tracker.evaluate(&snapshot), None);
        assert!(!tracker.is_watching());
    }

    #[tokio::test]
    async fn listener_starts_and_stops_watching_with_sessions() {
        let journal = Arc::new(CallJournal::default());
        let lookout = Arc::new(FakeLookout::new(Arc::clone(&journal)));
        let logger = Arc::new(InMemoryLogger::default());
        let store = BlockSessionStore::new();
        store
            .upsert_blocklist(android_blocklist("bl-1", &["pkgA"]))
            .expect("blocklist");

        let handle = register_session_presence_listener(&store, lookout, logger, None);
        settle().await;
        assert!(journal.calls().is_empty());

        store
            .upsert_session(session("ses-1", "09:00", "10:00", &["bl-1"]))
            .expect("session");
        wait_until("watch call", || journal.count("lookout.watch") == 1).await;
        assert_eq!(journal.calls(), vec!["lookout.watch:[pkgA]".to_string()]);

        store
            .upsert_blocklist(android_blocklist("bl-1", &["pkgA", "pkgB"]))
            .expect("blocklist edit");
        wait_until("re-issued watch", || journal.count("lookout.watch") == 2).await;
        assert_eq!(
            journal.calls().last().map(String::as_str),
            Some("lookout.watch:[pkgA,pkgB]")
        );

        assert!(store.delete_session("ses-1"));
        wait_until("stop call", || journal.count("lookout.stop") == 1).await;

        handle.unsubscribe();
    }

    #[tokio::test]
    async fn listener_watches_sessions_present_at_registration() {
        let journal = Arc::new(CallJournal::default());
        let lookout = Arc::new(FakeLookout::new(Arc::clone(&journal)));
        let store = BlockSessionStore::new();
        store
            .upsert_blocklist(android_blocklist("bl-1", &["pkgA"]))
            .expect("blocklist");
        store
            .upsert_session(session("ses-1", "09:00", "10:00", &["bl-1"]))
            .expect("session");

        let handle = register_session_presence_listener(
            &store,
            lookout,
            Arc::new(InMemoryLogger::default()),
            None,
        );
        wait_until("initial watch", || journal.count("lookout.watch") == 1).await;
        handle.unsubscribe();
    }

    #[tokio::test]
    async fn observation_failures_are_logged() {
        let journal = Arc::new(CallJournal::default());
        let lookout = Arc::new(FakeLookout::new(Arc::clone(&journal)));
        lookout.set_failing(true);
        let logger = Arc::new(InMemoryLogger::default());
        let store = BlockSessionStore::new();

        let handle = register_session_presence_listener(
            &store,
            lookout,
            Arc::clone(&logger) as Arc<dyn Logger>,
            None,
        );
        store
            .upsert_session(session("ses-1", "09:00", "10:00", &[]))
            .expect("session");
        wait_until("logged failure", || !logger.messages(LogLevel::Error).is_empty()).await;
        assert!(logger.messages(LogLevel::Error)[0].contains("failed to watch sirens"));
        handle.unsubscribe();
    }
}
