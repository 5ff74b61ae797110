use crate::domain::models::{BlockSession, BlockingSchedule, Blocklist, SirenKind, Sirens};
use chrono::NaiveTime;
use std::collections::HashMap;

const FIELD_SEPARATOR: &str = "|";
const VALUE_SEPARATOR: &str = ",";
const ENTRY_SEPARATOR: &str = ";";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleSelection {
    pub schedule: Vec<BlockingSchedule>,
    pub has_active_session: bool,
}

pub fn is_session_active(session: &BlockSession, now: NaiveTime) -> bool {
    session
        .window()
        .map(|window| window.contains(now))
        .unwrap_or(false)
}

/// Every siren of every blocklist the session references, first occurrence wins.
pub fn aggregate_sirens(
    session: &BlockSession,
    blocklists_by_id: &HashMap<String, Blocklist>,
) -> Sirens {
    let mut sirens = Sirens::default();
    for blocklist_id in &session.blocklist_ids {
        let resolved = blocklists_by_id.get(blocklist_id).or_else(|| {
            session
                .blocklists
                .iter()
                .find(|embedded| &embedded.id == blocklist_id)
        });
        if let Some(blocklist) = resolved {
            sirens.merge(&blocklist.sirens);
        }
    }
    sirens
}

/// Sessions repeat daily, so a session that is not active is scheduled for its
/// next occurrence and still gets an entry.
pub fn compute_schedule(
    sessions: &[BlockSession],
    blocklists_by_id: &HashMap<String, Blocklist>,
    now: NaiveTime,
) -> ScheduleSelection {
    let schedule = sessions
        .iter()
        .map(|session| BlockingSchedule {
            id: session.id.clone(),
            start_time: session.started_at.clone(),
            end_time: session.ended_at.clone(),
            sirens: aggregate_sirens(session, blocklists_by_id),
        })
        .collect();
    let has_active_session = sessions
        .iter()
        .any(|session| is_session_active(session, now));

    ScheduleSelection {
        schedule,
        has_active_session,
    }
}

/// Sessions currently inside their window, in input order.
pub fn active_sessions(sessions: &[BlockSession], now: NaiveTime) -> Vec<&BlockSession> {
    sessions
        .iter()
        .filter(|session| is_session_active(session, now))
        .collect()
}

/// Order-independent fingerprint of a schedule.
pub fn schedule_key(schedule: &[BlockingSchedule]) -> String {
    let mut entries = schedule.iter().map(entry_key).collect::<Vec<_>>();
    entries.sort();
    entries.join(ENTRY_SEPARATOR)
}

fn entry_key(entry: &BlockingSchedule) -> String {
    let mut fields = vec![
        key_value(&entry.id),
        key_value(&entry.start_time),
        key_value(&entry.end_time),
    ];
    for kind in SirenKind::ALL {
        let values = entry
            .sirens
            .ids(kind)
            .into_iter()
            .map(key_value)
            .collect::<Vec<_>>();
        fields.push(values.join(VALUE_SEPARATOR));
    }
    fields.join(FIELD_SEPARATOR)
}

/// Length prefix keeps separators inside values from merging fields.
fn key_value(value: &str) -> String {
    format!("{}:{value}", value.len())
}

/// Android package names across all sessions, deduplicated in first-seen order.
pub fn watched_android_sirens(
    sessions: &[BlockSession],
    blocklists_by_id: &HashMap<String, Blocklist>,
) -> Vec<String> {
    let mut aggregate = Sirens::default();
    for session in sessions {
        aggregate.merge(&aggregate_sirens(session, blocklists_by_id));
    }
    aggregate
        .android
        .into_iter()
        .map(|siren| siren.package_name)
        .collect()
}

pub fn sessions_for_device(sessions: &[BlockSession], device_id: Option<&str>) -> Vec<BlockSession> {
    match device_id {
        Some(device_id) => sessions
            .iter()
            .filter(|session| session.applies_to_device(device_id))
            .cloned()
            .collect(),
        None => sessions.to_vec(),
    }
}
