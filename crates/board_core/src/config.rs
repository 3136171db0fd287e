//! Store configuration.
//!
//! Hosts either deserialize [`BoardConfig`] from their own config file or
//! read it from `BOARD_*` environment variables.

use crate::auditing::Auditing;
use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::default_log_level;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "BOARD_DB_PATH";
pub const ENV_ACTOR: &str = "BOARD_ACTOR";
pub const ENV_LOG_LEVEL: &str = "BOARD_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "BOARD_LOG_DIR";

const DEFAULT_ACTOR: &str = "system";

/// Where the store lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseLocation {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    pub database: DatabaseLocation,
    /// Actor recorded in `created_by` / `modified_by`.
    pub actor: String,
    pub log_level: String,
    /// File logging stays off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::Memory,
            actor: DEFAULT_ACTOR.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl BoardConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_env_vars(std::env::vars())
    }

    /// Reads configuration from `BOARD_*` pairs; unknown keys and blank
    /// values are ignored, missing ones fall back to defaults.
    pub fn from_env_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in vars {
            let value: String = value.into();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                ENV_DB_PATH => config.database = DatabaseLocation::File(PathBuf::from(value)),
                ENV_ACTOR => config.actor = value.to_string(),
                ENV_LOG_LEVEL => config.log_level = value.to_string(),
                ENV_LOG_DIR => config.log_dir = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        config
    }

    /// Opens and migrates the configured store.
    pub fn open_store(&self) -> DbResult<Connection> {
        match &self.database {
            DatabaseLocation::File(path) => open_db(path),
            DatabaseLocation::Memory => open_db_in_memory(),
        }
    }

    /// Audit collaborators: the configured actor on the wall clock.
    pub fn auditing(&self) -> Auditing {
        Auditing::with_actor(self.actor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{BoardConfig, DatabaseLocation, ENV_ACTOR, ENV_DB_PATH, ENV_LOG_DIR};
    use std::path::PathBuf;

    #[test]
    fn env_vars_override_defaults() {
        let config = BoardConfig::from_env_vars([
            (ENV_DB_PATH, "/var/lib/board/board.sqlite3"),
            (ENV_ACTOR, " jmj "),
            (ENV_LOG_DIR, ""),
            ("PATH", "/usr/bin"),
        ]);

        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("/var/lib/board/board.sqlite3"))
        );
        assert_eq!(config.actor, "jmj");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn empty_environment_yields_in_memory_defaults() {
        let config = BoardConfig::from_env_vars(Vec::<(String, String)>::new());
        assert_eq!(config, BoardConfig::default());
        assert_eq!(config.database, DatabaseLocation::Memory);
    }

    #[test]
    fn deserializes_partial_config() {
        let config: BoardConfig = serde_json::from_value(serde_json::json!({
            "database": { "file": "board.sqlite3" },
            "actor": "admin"
        }))
        .unwrap();

        assert_eq!(
            config.database,
            DatabaseLocation::File(PathBuf::from("board.sqlite3"))
        );
        assert_eq!(config.actor, "admin");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn memory_store_opens_migrated() {
        let conn = BoardConfig::default().open_store().unwrap();
        let version: u32 = conn
            .query_row("PRAGMA user_version;", [], |row| row.get(0))
            .unwrap();
        assert!(version > 0);
    }
}
