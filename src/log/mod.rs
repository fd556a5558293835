pub mod structured_console_encoder;

use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::{Context, anyhow};
use log::{debug, info};
use log4rs::{
    Config,
    config::{Deserializers, RawConfig},
};

use crate::log::structured_console_encoder::StructuredConsoleEncoderDeserializer;

const LOG_CONFIG_ENV: &str = "NAMASTE_LOG_CONFIG";
const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

fn deserializers() -> Deserializers {
    let mut deserializers = Deserializers::default();
    deserializers.insert("structured_console", StructuredConsoleEncoderDeserializer);
    deserializers
}

/// Initializes logging.
///
/// Reads the file named by `NAMASTE_LOG_CONFIG` (default `log4rs.yml`) when it
/// exists, otherwise the embedded defaults: structured console output on stderr.
pub fn init_logging() -> anyhow::Result<()> {
    let path = std::env::var(LOG_CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_CONFIG));

    if path.exists() {
        log4rs::init_file(&path, deserializers())
            .with_context(|| format!("Failed to load logging configuration from {}", path.display()))?;
        info!(path:% = path.display(); "Logging initialized from external configuration");
        return Ok(());
    }

    log4rs::init_config(embedded_config()?).context("Failed to initialize logging from embedded config")?;
    debug!("Logging initialized from embedded defaults");
    Ok(())
}

fn embedded_config() -> anyhow::Result<Config> {
    let yaml_content = include_str!("../../resources/default_log4rs.yml");
    let raw_config: RawConfig =
        serde_yaml::from_str(yaml_content).context("Embedded logging configuration is invalid YAML")?;

    let (appenders, errors) = raw_config.appenders_lossy(&deserializers());
    if !errors.is_empty() {
        return Err(anyhow!("Errors parsing embedded appenders: {:?}", errors));
    }

    Config::builder()
        .appenders(appenders)
        .loggers(raw_config.loggers())
        .build(raw_config.root())
        .map_err(|e| anyhow!("Failed to build logging config: {:?}", e))
}

fn reveal_pii() -> bool {
    static REVEAL_PII_CACHE: OnceLock<bool> = OnceLock::new();

    *REVEAL_PII_CACHE.get_or_init(|| {
        std::env::var("REVEAL_PII")
            .map(|v| {
                let val = v.to_lowercase();
                val == "true" || val == "1"
            })
            .unwrap_or(false)
    })
}

/// Masks a patient identifier for logging.
/// If REVEAL_PII is true, returns the original identifier.
pub fn mask_identifier(id: &str) -> String {
    if reveal_pii() {
        return id.to_string();
    }
    mask(id)
}

fn mask(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= 4 {
        return "***".to_string();
    }
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("***{}", tail)
}
