use crate::application::listener::ListenerHandle;
use crate::application::session_store::BlockSessionStore;
use std::sync::Arc;
use tokio::time::{Duration, MissedTickBehavior};

const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

/// Ticks the store so window boundaries are noticed without any edit.
/// Must be called from within a tokio runtime.
/// A zero period is raised to one millisecond.
pub fn spawn_clock_ticker(store: Arc<BlockSessionStore>, period: Duration) -> ListenerHandle {
    let period = period.max(MIN_TICK_PERIOD);
    ListenerHandle::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            store.tick();
        }
    })
}
