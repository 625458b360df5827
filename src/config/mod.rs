mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use std::path::Path;
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    let mut config = parse_file(Path::new(&config_path)).await?;

    if let Ok(url) = env::var("INFERENCE_BACKEND_URL") {
        debug!("Backend URL overridden from environment");
        config.backend.base_url = url;
    }
    if let Ok(db_path) = env::var("MENU_DB_PATH") {
        config.server.database_path = db_path;
    }

    validate(&config)?;
    Ok(config)
}

pub async fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let config = parse_file(path.as_ref()).await?;
    validate(&config)?;
    Ok(config)
}

async fn parse_file(path: &Path) -> Result<Config> {
    debug!("Loading configuration from: {}", path.display());

    let config_str = tokio::fs::read_to_string(path).await?;
    Ok(serde_yaml::from_str(&config_str)?)
}

pub fn validate(config: &Config) -> Result<()> {
    let url = reqwest::Url::parse(&config.backend.base_url).map_err(|e| {
        Error::config(format!(
            "Invalid backend.base_url '{}': {}",
            config.backend.base_url, e
        ))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::config(format!(
            "backend.base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }
    if config.backend.timeout_secs == 0 {
        return Err(Error::config("backend.timeout_secs must be greater than zero"));
    }
    Ok(())
}
