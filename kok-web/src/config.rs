//! Server configuration.

use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "kok_data.db";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Resolved settings for [`crate::serve`].
///
/// Filled from command-line flags and their environment fallbacks by the
/// `serve` subcommand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// SQLite database file, created if missing.
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
