use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::erp::catalog::error::{Result, SyncError};
use crate::erp::catalog::merge::MergeOptions;
use crate::erp::catalog::stock::StockConfig;

/// Run configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Directory receiving the delta files and the apply report.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub merge: MergeOptions,
    pub system_a: SystemConfig,
    pub system_b: SystemConfig,
    /// Warehouse stock sync; absent when the run only reconciles catalogs.
    pub stock: Option<StockConfig>,
}

/// Catalog location and product API of one ERP company account.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Human-readable label used in logs.
    pub name: String,
    /// JSON dump of the system's product list.
    pub catalog: PathBuf,
    pub base_url: String,
    pub update_path: String,
    pub add_path: String,
    /// Environment variable holding the API secret key.
    pub secret_key_env: String,
    /// Environment variable holding the company id.
    pub company_id_env: String,
}

/// Secret key and company id sent with every product API request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub secret_key: String,
    pub company_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("secret_key", &"***")
            .field("company_id", &self.company_id)
            .finish()
    }
}

impl SystemConfig {
    /// Resolves the credentials from the environment variables this system
    /// names.
    pub fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            secret_key: read_env(&self.secret_key_env)?,
            company_id: read_env(&self.company_id_env)?,
        })
    }
}

fn read_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| SyncError::MissingCredential(name.to_string()))
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("delta")
}

/// Loads the run configuration from `path`.
pub fn load_config(path: &Path) -> Result<SyncConfig> {
    if !path.exists() {
        return Err(SyncError::MissingInput(path.to_path_buf()));
    }
    info!(path = %path.display(), "loading configuration");
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses a configuration document.
pub fn parse_config(contents: &str) -> Result<SyncConfig> {
    Ok(toml::from_str(contents)?)
}
