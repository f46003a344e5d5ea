use std::{path::Path, time::Duration};

use toml::{map::Map, Value};

use crate::{response::IntoResponse, Response, RetryPolicy};

pub static DEFAULT_BASE_URL: &str = "https://api.notion.com/v1";
pub static DEFAULT_VERSION: &str = "2022-06-28";

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub base_url: String,
    pub version: String,
    pub database_id: String,
    pub retry: RetryPolicy,
}

/// Reads a TOML file into a table. Used for both the config and the secrets.
pub fn load_toml(path: &Path) -> Response<Map<String, Value>> {
    let text = std::fs::read_to_string(path).into_response(&format!(
        "failed to read {}",
        path.display()
    ))?;

    toml::from_str::<Map<String, Value>>(&text)
        .into_response(&format!("failed to parse {}", path.display()))
}

impl Config {
    pub fn from_toml(config: &Map<String, Value>) -> Response<Self> {
        let notion = config
            .get("notion")
            .into_response("failed to load notion config")?;

        let base_url = match notion.get("base_url") {
            Some(base_url) => base_url
                .as_str()
                .into_response("failed to parse base_url config")?,
            None => DEFAULT_BASE_URL,
        };

        let version = match notion.get("version") {
            Some(version) => version
                .as_str()
                .into_response("failed to parse version config")?,
            None => DEFAULT_VERSION,
        };

        let database_id = notion
            .get("database_id")
            .into_response("failed to load database_id config")?
            .as_str()
            .into_response("failed to parse database_id config")?;

        let mut retry = RetryPolicy::default();
        if let Some(section) = config.get("retry") {
            if let Some(attempts) = section.get("attempts") {
                retry.attempts = attempts
                    .as_integer()
                    .and_then(|n| u32::try_from(n).ok())
                    .into_response("failed to parse attempts config")?;
            }
            if let Some(pause_secs) = section.get("pause_secs") {
                let pause_secs = pause_secs
                    .as_integer()
                    .and_then(|n| u64::try_from(n).ok())
                    .into_response("failed to parse pause_secs config")?;
                retry.pause = Duration::from_secs(pause_secs);
            }
        }

        Ok(Self {
            base_url: base_url.to_string(),
            version: version.to_string(),
            database_id: database_id.to_string(),
            retry,
        })
    }
}
