use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Database schema version {0} is newer than supported")]
    SchemaTooNew(i64),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("{port} failed: {message}")]
    Port { port: &'static str, message: String },
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

impl InfraError {
    pub fn port(port: &'static str, message: impl Into<String>) -> Self {
        Self::Port {
            port,
            message: message.into(),
        }
    }
}
