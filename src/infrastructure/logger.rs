use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

pub trait Logger: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Installs the fmt subscriber once; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[derive(Debug, Clone)]
pub struct TracingLogger {
    scope: String,
}

impl TracingLogger {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
        }
    }
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new("engine")
    }
}

impl Logger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(scope = %self.scope, "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(scope = %self.scope, "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(scope = %self.scope, "{message}");
    }
}

/// One JSON object per line, appended under a lock. Write failures are dropped.
#[derive(Debug)]
pub struct JsonLinesLogger {
    path: PathBuf,
    scope: String,
    guard: Mutex<()>,
}

impl JsonLinesLogger {
    pub fn new(logs_dir: impl AsRef<Path>, scope: impl Into<String>) -> Self {
        Self {
            path: logs_dir.as_ref().join("engine.log"),
            scope: scope.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, level: LogLevel, message: &str) {
        let Ok(_guard) = self.guard.lock() else {
            return;
        };
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let payload = serde_json::json!({
            "timestamp": Utc::now().to_rfc3339(),
            "level": level.as_str(),
            "scope": self.scope,
            "message": message,
        });

        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(file, "{}", payload);
        }
    }
}

impl Logger for JsonLinesLogger {
    fn info(&self, message: &str) {
        self.append(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.append(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.append(LogLevel::Error, message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct InMemoryLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl InMemoryLogger {
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }

    fn push(&self, level: LogLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level,
                message: message.to_string(),
            });
        }
    }
}

impl Logger for InMemoryLogger {
    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }
}
