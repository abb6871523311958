use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

const APP_DIR_NAME: &str = "KeyboardHeatMap";
pub const DB_FILE_NAME: &str = "keystrokes.db";

/// Per-user application-data directory, created on first use.
pub fn app_data_dir() -> Result<PathBuf> {
    let base = {
        #[cfg(windows)]
        {
            PathBuf::from(env::var("APPDATA").context("APPDATA should be present on Windows")?)
        }
        #[cfg(target_os = "macos")]
        {
            let home = env::var("HOME").context("HOME is not set")?;
            PathBuf::from(home).join("Library/Application Support")
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| {
                    env::var("HOME").map(|home| PathBuf::from(home).join(".local/state"))
                })
                .context("neither XDG_STATE_HOME nor HOME is set")?
        }
    };

    let dir = base.join(APP_DIR_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("create app data dir {}", dir.display()))?;
    Ok(dir)
}

pub fn default_db_path() -> Result<PathBuf> {
    Ok(app_data_dir()?.join(DB_FILE_NAME))
}
