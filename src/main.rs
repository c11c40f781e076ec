use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod error;
mod manga;
mod settings;
use manga::get::Cli;
use manga::source::HttpSource;
use settings::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    debug!(?cli, "Parsed arguments");

    let path = match &cli.settings {
        Some(path) => path.clone(),
        None => Settings::default_path()?,
    };
    let mut settings = Settings::load_or_init(&path)
        .with_context(|| format!("Loading settings from {:?}", path))?;

    cli.command
        .run(&mut settings, Arc::new(HttpSource::new()))
        .await
}
