mod config;
pub mod database;
pub mod progress;

pub use config::{Config, CuesConfig, DisplayConfig, KeepAliveConfig, TimerConfig};
pub use database::Database;
pub use progress::{ProgressRecord, SqliteProgressStore};

use std::path::PathBuf;

/// Returns the data directory, creating it if needed.
///
/// `PACER_DATA_DIR` overrides the location entirely. Otherwise this is
/// `~/.config/pacer[-dev]/`, with `PACER_ENV=dev` selecting the development
/// directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> std::io::Result<PathBuf> {
    let dir = match std::env::var_os("PACER_DATA_DIR") {
        Some(custom) => PathBuf::from(custom),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("PACER_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pacer-dev")
            } else {
                base_dir.join("pacer")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
