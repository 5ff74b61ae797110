use crate::domain::models::{BlockSession, Blocklist, LockedSirens, SirenKind};
use crate::domain::schedule::{active_sessions, aggregate_sirens};
use chrono::NaiveTime;
use serde::Serialize;
use std::collections::HashMap;

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;
const DAY_MS: i64 = 24 * HOUR_MS;

pub const MAX_TIMER_DURATION_MS: i64 = 30 * DAY_MS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerDuration {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl TimerDuration {
    pub fn new(days: i64, hours: i64, minutes: i64) -> Self {
        Self {
            days,
            hours,
            minutes,
        }
    }

    pub fn minutes(minutes: i64) -> Self {
        Self::new(0, 0, minutes)
    }

    pub fn hours(hours: i64) -> Self {
        Self::new(0, hours, 0)
    }

    pub fn as_millis(&self) -> i64 {
        self.days
            .saturating_mul(DAY_MS)
            .saturating_add(self.hours.saturating_mul(HOUR_MS))
            .saturating_add(self.minutes.saturating_mul(MINUTE_MS))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct TimeLeft {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
    pub total_ms: i64,
}

impl TimeLeft {
    pub fn from_millis(total_ms: i64) -> Self {
        let total_ms = total_ms.max(0);
        Self {
            days: total_ms / DAY_MS,
            hours: (total_ms % DAY_MS) / HOUR_MS,
            minutes: (total_ms % HOUR_MS) / MINUTE_MS,
            seconds: (total_ms % MINUTE_MS) / 1000,
            total_ms,
        }
    }
}

/// Only android packages, websites and keywords are lock-enforced.
pub fn is_siren_locked(locked: Option<&LockedSirens>, kind: SirenKind, siren_id: &str) -> bool {
    let Some(locked) = locked else {
        return false;
    };
    match kind {
        SirenKind::Android => locked.android.contains(siren_id),
        SirenKind::Websites => locked.websites.contains(siren_id),
        SirenKind::Keywords => locked.keywords.contains(siren_id),
        SirenKind::Ios | SirenKind::Windows | SirenKind::Macos | SirenKind::Linux => false,
    }
}

/// Union of the sirens of every active session while strict mode runs.
pub fn select_locked_sirens(
    sessions: &[BlockSession],
    blocklists_by_id: &HashMap<String, Blocklist>,
    now: NaiveTime,
    strict_mode_active: bool,
) -> Option<LockedSirens> {
    if !strict_mode_active {
        return None;
    }
    let active = active_sessions(sessions, now);
    if active.is_empty() {
        return None;
    }

    let mut locked = LockedSirens::default();
    for session in active {
        locked.absorb(&aggregate_sirens(session, blocklists_by_id));
    }
    (!locked.is_empty()).then_some(locked)
}

/// Locked sirens of one blocklist, present only when an active session uses it.
pub fn select_locked_sirens_for_blocklist(
    sessions: &[BlockSession],
    blocklists_by_id: &HashMap<String, Blocklist>,
    now: NaiveTime,
    strict_mode_active: bool,
    blocklist_id: &str,
) -> Option<LockedSirens> {
    if !strict_mode_active {
        return None;
    }
    let blocklist = blocklists_by_id.get(blocklist_id)?;
    let referenced = active_sessions(sessions, now)
        .into_iter()
        .any(|session| session.blocklist_ids.iter().any(|id| id == blocklist_id));
    if !referenced {
        return None;
    }

    let mut locked = LockedSirens::default();
    locked.absorb(&blocklist.sirens);
    (!locked.is_empty()).then_some(locked)
}
