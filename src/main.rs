use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::Path,
};

use anyhow::Context as _;
use notion_sync::{config::load_toml, Config, NotionClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Pulls every paragraph out of the configured database and writes one JSON
/// record per line to stdout for the embedding step.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let out_file = OpenOptions::new()
        .append(true)
        .create(true)
        .open("log.txt")
        .context("failed to open log.txt")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(out_file)
        .init();

    let secrets = load_toml(Path::new("Secrets.toml"))?;
    let notion_token = secrets
        .get("NOTION_TOKEN")
        .context("NOTION_TOKEN was not found")?
        .as_str()
        .context("failed to parse NOTION_TOKEN")?;

    let config_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Config.toml".to_string());
    let config = Config::from_toml(&load_toml(Path::new(&config_name))?)?;

    let client = NotionClient::from_config(notion_token, &config)?;

    info!(task = "start extraction", database_id = %config.database_id);

    let records = client.paragraph_records(&config.database_id).await?;

    let mut stdout = io::stdout().lock();
    for record in &records {
        serde_json::to_writer(&mut stdout, record)?;
        writeln!(stdout)?;
    }

    info!(task = "finish extraction", count = records.len());

    Ok(())
}
