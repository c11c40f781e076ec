use super::progress::{BarProgress, PageProgress};
use super::provider::Provider;
use super::source::Source;
use super::{starting_chapter, Manga};
use crate::settings::{History, Settings};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file to use instead of the one in the user's config directory
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Log debug output
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch a manga from a chapter up to the last one available
    Fetch(FetchManga),
    /// List followed mangas and flag the ones with a new chapter out
    List,
    /// Set the default output path and provider
    Config(SetDefaults),
    /// Rewrite the history of a followed manga
    Update(UpdateHistory),
}

#[derive(Args, Debug)]
pub struct FetchManga {
    /// Title of the manga as it appears in the provider's URLs
    #[arg(short, long)]
    pub manga: String,

    /// Chapter to start from, defaults to the one after the last fetched
    #[arg(short, long)]
    pub chapter: Option<u32>,

    /// Site to fetch from, defaults to the configured provider
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Where the archives are written, defaults to the configured output path
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Start at the given chapter even if the history is already past it
    #[arg(short, long)]
    pub force: bool,

    /// Don't display the download progress bar
    #[arg(short, long)]
    pub silent: bool,
}

#[derive(Args, Debug)]
pub struct SetDefaults {
    /// Default output path for archives
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Default provider
    #[arg(short, long)]
    pub provider: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateHistory {
    /// Title of the manga to update
    #[arg(short, long)]
    pub manga: String,

    /// Provider to use from now on
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Last fetched chapter to record
    #[arg(short, long)]
    pub next: Option<u32>,
}

impl Command {
    pub async fn run(&self, settings: &mut Settings, source: Arc<dyn Source>) -> Result<()> {
        match self {
            Command::Fetch(fetch) => fetch.run(settings, source).await,
            Command::List => list(settings, source).await,
            Command::Config(defaults) => {
                let changed = settings
                    .set_defaults(defaults.output.clone(), defaults.provider.clone())
                    .context("Saving the new defaults")?;
                let config = settings.config();
                println!(
                    "Output path {:?}, provider {}{}",
                    config.output_path,
                    config.provider,
                    if changed {
                        format!(" (saved to {:?})", settings.path())
                    } else {
                        String::new()
                    }
                );
                Ok(())
            }
            Command::Update(update) => {
                settings
                    .override_entry(&update.manga, update.next, update.provider.clone())
                    .with_context(|| format!("Updating the history of {}", update.manga))?;
                if let Some(entry) = settings.entry(&update.manga) {
                    println!(
                        "{} is now at chapter {} on {}",
                        entry.title, entry.chapter, entry.provider
                    );
                }
                Ok(())
            }
        }
    }
}

impl FetchManga {
    /// Works out the provider, output path and starting chapter from the
    /// arguments and the history, then fetches until no chapter is left.
    pub async fn run(&self, settings: &mut Settings, source: Arc<dyn Source>) -> Result<()> {
        let provider = Provider::new(
            self.provider
                .clone()
                .unwrap_or_else(|| settings.default_provider().to_string()),
        );
        let output = self
            .path
            .clone()
            .unwrap_or_else(|| settings.config().output_path.clone());
        let recorded = settings
            .is_tracked(&self.manga)
            .then(|| settings.last_chapter(&self.manga));
        let start = starting_chapter(self.chapter, recorded, self.force);

        println!(
            "Fetching {} from {} starting at chapter {} into {:?}",
            self.manga, provider, start, output
        );

        let manga = Manga::new(source, provider, &self.manga, output);
        let available = manga
            .is_available(start)
            .await
            .with_context(|| format!("Looking for chapter {} of {}", start, self.manga))?;
        if !available {
            println!("Chapter {} of {} is not available yet.", start, manga.title());
            return Ok(());
        }

        let bar = if self.silent {
            None
        } else {
            Some(BarProgress::new()?)
        };
        let run = manga
            .fetch_from(
                start,
                settings,
                bar.as_ref().map(|bar| bar as &dyn PageProgress),
            )
            .await
            .with_context(|| format!("Fetching {}", self.manga))?;

        println!(
            "Fetched {} chapter(s) of {}, chapter {} is not out yet.",
            run.archives.len(),
            manga.title(),
            run.next
        );
        Ok(())
    }
}

/// Prints the history, marking titles whose next chapter can be fetched.
async fn list(settings: &Settings, source: Arc<dyn Source>) -> Result<()> {
    let output = settings.config().output_path.clone();
    println!("  {:<40} {:>12}  {}", "Name", "Last chapter", "Provider");
    for entry in settings.entries() {
        let manga = Manga::new(
            source.clone(),
            Provider::new(&entry.provider),
            &entry.title,
            &output,
        );
        let new_chapter = match manga.is_available(entry.chapter + 1).await {
            Ok(available) => available,
            Err(err) if err.is_transport() => {
                warn!(title = %entry.title, error = %err, "Unable to check for a new chapter");
                false
            }
            Err(err) => return Err(err.into()),
        };
        println!(
            "{} {:<40} {:>12}  {}",
            if new_chapter { ">" } else { " " },
            entry.title,
            entry.chapter,
            entry.provider
        );
    }
    Ok(())
}
