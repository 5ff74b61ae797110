use crate::application::session_store::BlockSessionStore;
use crate::application::strict_mode::{StrictModeError, StrictModeService};
use crate::domain::models::{LockedSirens, SirenKind};
use crate::domain::schedule::sessions_for_device;
use crate::domain::strict_mode::{is_siren_locked, select_locked_sirens, select_locked_sirens_for_blocklist};
use crate::infrastructure::auth::AuthGateway;
use crate::infrastructure::timer_repository::TimerRepository;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlocklistEditError {
    #[error("unknown blocklist: {0}")]
    UnknownBlocklist(String),
    #[error("{kind} siren '{siren_id}' is locked by strict mode")]
    SirenLocked { kind: SirenKind, siren_id: String },
    #[error(transparent)]
    StrictMode(#[from] StrictModeError),
}

/// Blocklist edits that honour strict-mode locks: additions are always allowed,
/// removals of sirens held by an active session are refused.
pub struct BlocklistEditor<R, A>
where
    R: TimerRepository,
    A: AuthGateway,
{
    store: Arc<BlockSessionStore>,
    strict_mode: Arc<StrictModeService<R, A>>,
    device_id: Option<String>,
}

impl<R, A> BlocklistEditor<R, A>
where
    R: TimerRepository,
    A: AuthGateway,
{
    pub fn new(
        store: Arc<BlockSessionStore>,
        strict_mode: Arc<StrictModeService<R, A>>,
        device_id: Option<String>,
    ) -> Self {
        Self {
            store,
            strict_mode,
            device_id,
        }
    }

    /// Returns whether the siren was newly added.
    pub fn add_siren(
        &self,
        blocklist_id: &str,
        kind: SirenKind,
        siren_id: &str,
    ) -> Result<bool, BlocklistEditError> {
        self.store
            .modify_blocklist(blocklist_id, |blocklist| blocklist.sirens.insert(kind, siren_id))
            .ok_or_else(|| BlocklistEditError::UnknownBlocklist(blocklist_id.to_string()))
    }

    /// Returns whether the siren was present and removed.
    pub fn remove_siren(
        &self,
        blocklist_id: &str,
        kind: SirenKind,
        siren_id: &str,
    ) -> Result<bool, BlocklistEditError> {
        let locked = self.locked_sirens(blocklist_id)?;
        if is_siren_locked(locked.as_ref(), kind, siren_id) {
            return Err(BlocklistEditError::SirenLocked {
                kind,
                siren_id: siren_id.to_string(),
            });
        }
        self.store
            .modify_blocklist(blocklist_id, |blocklist| blocklist.sirens.remove(kind, siren_id))
            .ok_or_else(|| BlocklistEditError::UnknownBlocklist(blocklist_id.to_string()))
    }

    pub fn locked_sirens(&self, blocklist_id: &str) -> Result<Option<LockedSirens>, BlocklistEditError> {
        let snapshot = self.store.snapshot();
        if !snapshot.blocklists.contains_key(blocklist_id) {
            return Err(BlocklistEditError::UnknownBlocklist(blocklist_id.to_string()));
        }
        let active = self.strict_mode.is_active()?;
        let now = self.now()?;
        let sessions = sessions_for_device(&snapshot.sessions, self.device_id.as_deref());
        Ok(select_locked_sirens_for_blocklist(
            &sessions,
            &snapshot.blocklists,
            now,
            active,
            blocklist_id,
        ))
    }

    /// Sirens locked across every active session of this device.
    pub fn all_locked_sirens(&self) -> Result<Option<LockedSirens>, BlocklistEditError> {
        let snapshot = self.store.snapshot();
        let active = self.strict_mode.is_active()?;
        let now = self.now()?;
        let sessions = sessions_for_device(&snapshot.sessions, self.device_id.as_deref());
        Ok(select_locked_sirens(&sessions, &snapshot.blocklists, now, active))
    }

    fn now(&self) -> Result<chrono::NaiveTime, StrictModeError> {
        let date_provider = self.strict_mode.date_provider();
        Ok(date_provider.time_of_day(date_provider.now_ms())?)
    }
}
