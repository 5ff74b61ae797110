use crate::infrastructure::error::InfraError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Stores the strict-mode expiry (ISO-8601) per user.
pub trait TimerRepository: Send + Sync {
    fn save_timer(&self, user_id: &str, ended_at: &str) -> Result<(), InfraError>;
    fn load_timer(&self, user_id: &str) -> Result<Option<String>, InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteTimerRepository {
    db_path: PathBuf,
}

impl SqliteTimerRepository {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        Connection::open(&self.db_path).map_err(InfraError::from)
    }
}

impl TimerRepository for SqliteTimerRepository {
    fn save_timer(&self, user_id: &str, ended_at: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO strict_mode_timers (user_id, ended_at, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET
               ended_at = excluded.ended_at,
               updated_at = excluded.updated_at",
            params![user_id, ended_at, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    fn load_timer(&self, user_id: &str) -> Result<Option<String>, InfraError> {
        let connection = self.connect()?;
        let ended_at = connection
            .query_row(
                "SELECT ended_at FROM strict_mode_timers WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(ended_at)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryTimerRepository {
    timers: Mutex<HashMap<String, String>>,
}

impl TimerRepository for InMemoryTimerRepository {
    fn save_timer(&self, user_id: &str, ended_at: &str) -> Result<(), InfraError> {
        let mut timers = self
            .timers
            .lock()
            .map_err(|_| InfraError::LockPoisoned("timer repository"))?;
        timers.insert(user_id.to_string(), ended_at.to_string());
        Ok(())
    }

    fn load_timer(&self, user_id: &str) -> Result<Option<String>, InfraError> {
        let timers = self
            .timers
            .lock()
            .map_err(|_| InfraError::LockPoisoned("timer repository"))?;
        Ok(timers.get(user_id).cloned())
    }
}
