use crate::domain::models::{BlockSession, Blocklist};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::watch;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid block session: {0}")]
    InvalidSession(String),
    #[error("invalid blocklist: {0}")]
    InvalidBlocklist(String),
}

/// Everything the listeners derive from. `revision` moves on every mutation and tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSnapshot {
    pub sessions: Vec<BlockSession>,
    pub blocklists: HashMap<String, Blocklist>,
    pub revision: u64,
}

impl EngineSnapshot {
    pub fn session(&self, session_id: &str) -> Option<&BlockSession> {
        self.sessions.iter().find(|session| session.id == session_id)
    }
}

/// Change-notification bus for block sessions and blocklists.
#[derive(Debug)]
pub struct BlockSessionStore {
    sender: watch::Sender<EngineSnapshot>,
}

impl Default for BlockSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockSessionStore {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(EngineSnapshot::default());
        Self { sender }
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.sender.subscribe()
    }

    pub fn upsert_session(&self, session: BlockSession) -> Result<(), StoreError> {
        session.validate().map_err(StoreError::InvalidSession)?;
        self.sender.send_modify(|snapshot| {
            match snapshot
                .sessions
                .iter_mut()
                .find(|existing| existing.id == session.id)
            {
                Some(existing) => *existing = session,
                None => snapshot.sessions.push(session),
            }
            snapshot.revision += 1;
        });
        Ok(())
    }

    pub fn delete_session(&self, session_id: &str) -> bool {
        self.sender.send_if_modified(|snapshot| {
            let before = snapshot.sessions.len();
            snapshot.sessions.retain(|session| session.id != session_id);
            let removed = snapshot.sessions.len() != before;
            if removed {
                snapshot.revision += 1;
            }
            removed
        })
    }

    pub fn upsert_blocklist(&self, blocklist: Blocklist) -> Result<(), StoreError> {
        blocklist.validate().map_err(StoreError::InvalidBlocklist)?;
        self.sender.send_modify(|snapshot| {
            snapshot.blocklists.insert(blocklist.id.clone(), blocklist);
            snapshot.revision += 1;
        });
        Ok(())
    }

    /// Removes the blocklist and detaches it from every session.
    pub fn delete_blocklist(&self, blocklist_id: &str) -> bool {
        self.sender.send_if_modified(|snapshot| {
            if snapshot.blocklists.remove(blocklist_id).is_none() {
                return false;
            }
            for session in &mut snapshot.sessions {
                session.blocklist_ids.retain(|id| id != blocklist_id);
                session.blocklists.retain(|embedded| embedded.id != blocklist_id);
            }
            snapshot.revision += 1;
            true
        })
    }

    /// Applies `edit` to one blocklist; listeners are notified only when it reports a change.
    /// Returns `None` for an unknown blocklist.
    pub fn modify_blocklist<F>(&self, blocklist_id: &str, edit: F) -> Option<bool>
    where
        F: FnOnce(&mut Blocklist) -> bool,
    {
        let mut outcome = None;
        self.sender.send_if_modified(|snapshot| {
            let Some(blocklist) = snapshot.blocklists.get_mut(blocklist_id) else {
                return false;
            };
            let changed = edit(blocklist);
            outcome = Some(changed);
            if changed {
                snapshot.revision += 1;
            }
            changed
        });
        outcome
    }

    /// Wakes listeners so time-window transitions are re-evaluated.
    pub fn tick(&self) {
        self.sender.send_modify(|snapshot| snapshot.revision += 1);
    }
}
