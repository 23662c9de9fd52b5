//! Shared application state, passed explicitly to every request handler.
//!
//! There is no ambient session or user-type store: handlers receive
//! `CoreState` through the router state and open a per-request database
//! connection from it.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::Config;
use crate::db::{self, DatabaseError};

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Filesystem error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct CoreState {
    pub data_dir: PathBuf,
}

impl CoreState {
    pub fn new(config: &Config) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("database").join("citasalud.db")
    }

    /// Directory where uploaded document payloads are stored.
    pub fn documents_dir(&self) -> PathBuf {
        self.data_dir.join("documents")
    }

    /// Create the data directories if missing. Called once at startup.
    pub fn ensure_dirs(&self) -> Result<(), CoreError> {
        std::fs::create_dir_all(self.data_dir.join("database"))?;
        std::fs::create_dir_all(self.documents_dir())?;
        Ok(())
    }

    /// Open a database connection. Most common operation in handlers;
    /// each request gets its own connection.
    pub fn open_db(&self) -> Result<rusqlite::Connection, CoreError> {
        db::open_database(&self.db_path()).map_err(CoreError::Database)
    }
}
