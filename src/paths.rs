//! Application path management for portable and installed modes.
//!
//! - **Dev mode** (debug builds): a `config.yaml` in the current working
//!   directory makes the cwd the base for everything.
//! - **Portable mode**: a `.portable` marker next to the executable keeps
//!   all data beside it.
//! - **Installed mode** (default): data lives in the platform data directory
//!   (`%APPDATA%\lpadder`, `~/.local/share/lpadder`, ...).

use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application name used for directories in installed mode
const APP_NAME: &str = "lpadder";

/// Application paths for config, data, and logs.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Path to the configuration file
    pub config: PathBuf,
    /// Device profiles and the project database live here
    pub data_dir: PathBuf,
    pub logs_dir: PathBuf,
    /// Whether data sits next to the executable (or the cwd in dev mode)
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect the appropriate paths based on environment.
    ///
    /// Called before logging is initialized, so diagnostics go to stderr.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        #[cfg(debug_assertions)]
        {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            if cwd.join("config.yaml").exists() {
                eprintln!("[paths] Running in DEV mode (config.yaml found in {})", cwd.display());
                return Self::rooted_at(&cwd, true);
            }
        }

        if exe_dir.join(".portable").exists() {
            #[cfg(debug_assertions)]
            eprintln!("[paths] Running in PORTABLE mode (.portable marker found)");
            return Self::rooted_at(&exe_dir, true);
        }

        let app_data = dirs::data_dir()
            .unwrap_or_else(|| {
                eprintln!("[paths] WARNING: no platform data directory, falling back to exe dir");
                exe_dir.clone()
            })
            .join(APP_NAME);

        #[cfg(debug_assertions)]
        eprintln!("[paths] Running in INSTALLED mode (data dir: {})", app_data.display());

        Self::rooted_at(&app_data, false)
    }

    /// Lay every path out under one base directory
    pub fn rooted_at(base: &Path, is_portable: bool) -> Self {
        Self {
            config: base.join("config.yaml"),
            data_dir: base.join("data"),
            logs_dir: base.join("logs"),
            is_portable,
        }
    }

    /// Ensure data and log directories exist
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [&self.data_dir, &self.logs_dir] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }

        Ok(())
    }

    /// Default device profile file
    pub fn profiles_file(&self) -> PathBuf {
        self.data_dir.join("devices.json")
    }

    /// Default sled database for projects
    pub fn projects_db(&self) -> PathBuf {
        self.data_dir.join("projects")
    }
}
