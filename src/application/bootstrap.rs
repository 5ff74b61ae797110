use crate::infrastructure::config::{ensure_default_configs, load_engine_config, EngineConfig};
use crate::infrastructure::date_provider::SystemDateProvider;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::logger::JsonLinesLogger;
use crate::infrastructure::storage::initialize_database;
use crate::infrastructure::timer_repository::SqliteTimerRepository;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub database_path: PathBuf,
    pub logs_dir: PathBuf,
    pub config: EngineConfig,
}

impl BootstrapResult {
    pub fn timer_repository(&self) -> SqliteTimerRepository {
        SqliteTimerRepository::new(&self.database_path)
    }

    pub fn date_provider(&self) -> SystemDateProvider {
        SystemDateProvider::new(self.config.timezone)
    }

    pub fn file_logger(&self, scope: impl Into<String>) -> JsonLinesLogger {
        JsonLinesLogger::new(&self.logs_dir, scope)
    }
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    let state_dir = workspace_root.join("state");
    let logs_dir = workspace_root.join("logs");
    let database_path = state_dir.join("sirenblock.sqlite");

    fs::create_dir_all(&config_dir)?;
    fs::create_dir_all(&state_dir)?;
    fs::create_dir_all(&logs_dir)?;

    ensure_default_configs(&config_dir)?;
    let config = load_engine_config(&config_dir)?;
    initialize_database(&database_path)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        database_path,
        logs_dir,
        config,
    })
}
