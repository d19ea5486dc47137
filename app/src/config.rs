//! FILENAME: app/src/config.rs
// PURPOSE: Host configuration: file paths, session role, lookup settings.
// CONTEXT: Read once at startup. A JSON file named by GRID_APP_CONFIG
// supplies the base; GRID_APP_ROLE and GRID_APP_LOG override single fields.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub const CONFIG_ENV: &str = "GRID_APP_CONFIG";
pub const ROLE_ENV: &str = "GRID_APP_ROLE";
pub const LOG_ENV: &str = "GRID_APP_LOG";

pub const DEFAULT_LOG_FILE: &str = "grid-app.log";
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_path: PathBuf,
    /// Role of the session user, checked against `signed_by_role`.
    pub user_role: Option<String>,
    /// Schema document loaded at startup.
    pub schema_path: Option<PathBuf>,
    /// Row records (a JSON array) loaded at startup.
    pub data_path: Option<PathBuf>,
    /// Option lists for lookup fields, keyed by field id.
    pub lookup_options_path: Option<PathBuf>,
    /// Base URL that relative column endpoints are joined onto.
    pub lookup_base_url: Option<String>,
    pub lookup_timeout_ms: u64,
    /// When set, the demo lookup endpoint is served on this address.
    pub demo_endpoint_addr: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
            user_role: None,
            schema_path: None,
            data_path: None,
            lookup_options_path: None,
            lookup_base_url: None,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
            demo_endpoint_addr: None,
        }
    }
}

impl AppConfig {
    /// Configuration from the process environment.
    pub fn load() -> Result<AppConfig, AppError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Configuration from an arbitrary variable source.
    pub fn load_with<F>(var: F) -> Result<AppConfig, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match var(CONFIG_ENV).filter(|p| !p.trim().is_empty()) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => AppConfig::default(),
        };

        if let Some(role) = var(ROLE_ENV) {
            config.user_role = Some(role).filter(|r| !r.is_empty());
        }
        if let Some(log) = var(LOG_ENV).filter(|l| !l.is_empty()) {
            config.log_path = PathBuf::from(log);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<AppConfig, AppError> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|source| AppError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn lookup_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.lookup_timeout_ms)
    }
}
