//! FILENAME: app/src/config.rs
//! Application configuration: optional JSON file, then environment overrides.

use crate::error::AppError;
use pivot_engine::MeasureUnit;
use report_client::ClientConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_API_URL: &str = "PLANIN_API_URL";
pub const ENV_API_TOKEN: &str = "PLANIN_API_TOKEN";
pub const ENV_COUNTRY: &str = "PLANIN_COUNTRY";
pub const ENV_EXPORT_DIR: &str = "PLANIN_EXPORT_DIR";
pub const ENV_LOG_FILE: &str = "PLANIN_LOG_FILE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ClientConfig,
    /// Directory for spreadsheet exports.
    pub export_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub default_unit: MeasureUnit,
    /// Export file name without extension.
    pub file_name_base: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            api: ClientConfig::default(),
            export_dir: PathBuf::from("."),
            log_file: None,
            default_unit: MeasureUnit::Minutes,
            file_name_base: "productividad".to_string(),
        }
    }
}

impl AppConfig {
    /// Reads `path` (when given), applies the process environment and
    /// validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => AppConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| AppError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Overrides from `PLANIN_*` variables. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(ENV_API_URL) {
            self.api.base_url = url;
        }
        if let Some(token) = get(ENV_API_TOKEN) {
            self.api.token = token;
        }
        if let Some(country) = get(ENV_COUNTRY) {
            self.api.country_code = country;
        }
        if let Some(dir) = get(ENV_EXPORT_DIR) {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(file) = get(ENV_LOG_FILE) {
            self.log_file = Some(PathBuf::from(file));
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.api.validate()?;
        if self.file_name_base.trim().is_empty() {
            return Err(AppError::Config("file_name_base must not be empty".to_string()));
        }
        Ok(())
    }
}
