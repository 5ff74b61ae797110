use crate::infrastructure::error::InfraError;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

const SCHEMA_SQL: &str = include_str!("../../sql/schema.sql");
pub const SCHEMA_VERSION: i64 = 1;

/// Opens (creating if needed) the timer database and brings it to `SCHEMA_VERSION`.
/// Existing rows are kept.
pub fn initialize_database(path: &Path) -> Result<(), InfraError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let connection = Connection::open(path)?;
    let version = schema_version(&connection)?;
    if version > SCHEMA_VERSION {
        return Err(InfraError::SchemaTooNew(version));
    }
    connection.execute_batch(SCHEMA_SQL)?;
    if version < SCHEMA_VERSION {
        connection.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    }
    Ok(())
}

fn schema_version(connection: &Connection) -> Result<i64, InfraError> {
    connection
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(InfraError::from)
}
