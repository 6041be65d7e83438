//! Application configuration.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const APP_DIR: &str = "krishi";
const CONFIG_FILE: &str = "config.toml";
/// File name shared with earlier tools that managed the same records.
pub const DATA_FILE_NAME: &str = "user.txt";

/// Runtime configuration for the portal binary.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Location of the pipe-delimited account records file.
    pub data_file: PathBuf,
}

impl AppConfig {
    /// Load configuration from the default file, if present, with
    /// `KRISHI_*` environment overrides on top.
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default(
                "data_file",
                default_data_file().to_string_lossy().into_owned(),
            )
            .context("failed to set default data_file")?
            .add_source(File::from(config_file()).required(false))
            .add_source(Environment::with_prefix("KRISHI"))
            .build()
            .context("failed to load configuration")?;
        settings
            .try_deserialize()
            .context("invalid configuration")
    }
}

/// Directory holding the config file and, by default, the data file.
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn config_file() -> PathBuf {
    config_root().join(CONFIG_FILE)
}

/// Default location of the account records file.
pub fn default_data_file() -> PathBuf {
    config_root().join(DATA_FILE_NAME)
}

/// Write a commented default configuration on first run so users have a
/// file to edit. Existing files are left alone.
pub fn ensure_default_config() -> Result<()> {
    let path = config_file();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let contents = format!(
        "# krishi configuration\n#\n# data_file: pipe-delimited account records, loaded at start\n# and saved once at exit.\ndata_file = \"{}\"\n",
        default_data_file().display()
    );
    fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))
}
