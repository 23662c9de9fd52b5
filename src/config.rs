use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "CitaSalud";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default bind address when `CITASALUD_BIND` is unset.
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Upload cap for appointment documents: 10 MB.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Request body cap. Uploads arrive base64-encoded inside a JSON envelope,
/// so the transport limit must sit above the decoded cap (4/3 encoding
/// overhead plus headroom); the handler's decoded-size check is the real
/// gate.
pub const MAX_REQUEST_BYTES: usize = MAX_UPLOAD_BYTES / 2 * 3;

/// MIME types accepted for document uploads.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "image/jpeg",
    "image/png",
    "text/plain",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("CITASALUD_BIND is not a valid socket address: {0}")]
    InvalidBind(String),
    #[error("CITASALUD_DATA_DIR is empty")]
    EmptyDataDir,
    #[error("Cannot determine home directory and CITASALUD_DATA_DIR is unset")]
    NoHomeDir,
}

/// Runtime configuration, read from the process environment once at startup.
/// Values are parsed and validated here rather than failing downstream.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub bind: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = match std::env::var("CITASALUD_DATA_DIR") {
            Ok(v) if v.trim().is_empty() => return Err(ConfigError::EmptyDataDir),
            Ok(v) => PathBuf::from(v),
            Err(_) => default_data_dir().ok_or(ConfigError::NoHomeDir)?,
        };

        let bind_raw =
            std::env::var("CITASALUD_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidBind(bind_raw))?;

        Ok(Self { data_dir, bind })
    }
}

/// ~/CitaSalud/ on all platforms (user-visible data directory).
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{}=info,tower_http=info", env!("CARGO_PKG_NAME"))
}
