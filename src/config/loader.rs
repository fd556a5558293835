use std::{fs, fs::File, io::Write, path::Path};

use anyhow::{Context, Result};
use config::{Config, Environment};
use log::info;

use super::defaults::ExplorerConfig;

const ENV_PREFIX: &str = "NAMASTE";

pub fn get_default_config() -> &'static str {
    include_str!("../../config/config.toml")
}

/// Loads the layered configuration: TOML file, then `NAMASTE_EXPLORER__*`
/// environment variables.
///
/// A default file is written to `path` when none exists.
pub fn load_configuration(path: &Path) -> Result<Config> {
    if !path.exists() {
        let sources = get_default_config();
        write_config_to(path, sources).context("Could not create default config")?;
        info!(path:% = path.display(); "Created new configuration file");
    }

    let filename = path.to_str().context("Invalid config file path")?;

    Config::builder()
        .add_source(config::File::with_name(filename))
        .add_source(Environment::with_prefix(ENV_PREFIX).prefix_separator("_").separator("__"))
        .build()
        .context("Could not build config")
}

/// Loads and deserializes the `[explorer]` table, falling back to defaults
/// for any missing key.
pub fn load_explorer_config(path: &Path) -> Result<ExplorerConfig> {
    let cfg = load_configuration(path)?;
    match cfg.get::<ExplorerConfig>(ExplorerConfig::main_key_prefix()) {
        Ok(explorer) => Ok(explorer),
        Err(config::ConfigError::NotFound(_)) => Ok(ExplorerConfig::default()),
        Err(e) => Err(e).context("Invalid explorer configuration"),
    }
}

pub fn write_config_to(path: &Path, source: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create parent directories")?;
    };

    let mut file = File::create(path).context("Failed to create config file")?;
    file.write_all(source.as_bytes())
        .context("Failed to write config content")?;
    file.write_all(b"\n").context("Failed to write newline")?;
    Ok(())
}
