use crate::error::{FetchError, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_PROVIDER: &str = "mangareader.net";

/// What the fetch loop needs to know about earlier runs.
pub trait History {
    /// Last chapter fetched for `title`, 1 when the title was never fetched.
    fn last_chapter(&self, title: &str) -> u32;
    fn is_tracked(&self, title: &str) -> bool;
    fn default_provider(&self) -> &str;
    /// Called once for each chapter archived, in chapter order.
    fn record_chapter_fetched(&mut self, title: &str, chapter: u32, provider: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub output_path: PathBuf,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub title: String,
    pub chapter: u32,
    pub provider: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Titles {
    pub titles: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct SettingsFile {
    config: Config,
    #[serde(default)]
    history: Titles,
}

/// Defaults and per-title history, persisted as JSON after every change.
#[derive(Debug)]
pub struct Settings {
    path: PathBuf,
    data: SettingsFile,
}

impl Settings {
    pub fn default_path() -> Result<PathBuf> {
        ProjectDirs::from("net", "mangareader", "mangareader-dl")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .ok_or_else(|| FetchError::Settings {
                path: PathBuf::from("settings.json"),
                reason: "no home directory to keep settings in".to_string(),
            })
    }

    pub fn default_config() -> Result<Config> {
        let home = BaseDirs::new().ok_or_else(|| FetchError::Settings {
            path: PathBuf::from("settings.json"),
            reason: "no home directory for the default output path".to_string(),
        })?;
        Ok(Config {
            output_path: home.home_dir().join("mangas"),
            provider: DEFAULT_PROVIDER.to_string(),
        })
    }

    pub fn new(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            data: SettingsFile {
                config,
                history: Titles::default(),
            },
        }
    }

    /// Reads `path`, writing the default settings there first if it does not exist.
    pub fn load_or_init(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            let settings = Settings::new(&path, Settings::default_config()?);
            settings.save()?;
            info!(path = ?path, "Wrote default settings");
            return Ok(settings);
        }
        Settings::load(path)
    }

    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path).map_err(FetchError::fs(&path))?;
        let data = serde_json::from_str(&contents).map_err(|err| FetchError::Settings {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        debug!(path = ?path, "Loaded settings");
        Ok(Self { path, data })
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(FetchError::fs(parent))?;
        }
        let json = serde_json::to_string_pretty(&self.data).map_err(|err| FetchError::Settings {
            path: self.path.clone(),
            reason: err.to_string(),
        })?;
        fs::write(&self.path, json).map_err(FetchError::fs(&self.path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Config {
        &self.data.config
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.data.history.titles
    }

    pub fn entry(&self, title: &str) -> Option<&HistoryEntry> {
        self.entries().iter().find(|entry| entry.title == title)
    }

    /// Changes the defaults, saving only if something differs. Returns whether it did.
    pub fn set_defaults(
        &mut self,
        output_path: Option<PathBuf>,
        provider: Option<String>,
    ) -> Result<bool> {
        let mut config = self.data.config.clone();
        if let Some(output_path) = output_path {
            config.output_path = output_path;
        }
        if let Some(provider) = provider {
            config.provider = provider;
        }
        if config == self.data.config {
            return Ok(false);
        }
        self.data.config = config;
        self.save()?;
        Ok(true)
    }

    /// Rewrites the entry for `title`. Unset values keep what the entry held,
    /// falling back to chapter 1 and the default provider.
    pub fn override_entry(
        &mut self,
        title: &str,
        chapter: Option<u32>,
        provider: Option<String>,
    ) -> Result<()> {
        let existing = self.entry(title).cloned();
        let chapter = chapter
            .or(existing.as_ref().map(|entry| entry.chapter))
            .unwrap_or(1);
        let provider = provider
            .or(existing.map(|entry| entry.provider))
            .unwrap_or_else(|| self.data.config.provider.clone());
        self.put(title, chapter, provider)
    }

    fn put(&mut self, title: &str, chapter: u32, provider: String) -> Result<()> {
        let titles = &mut self.data.history.titles;
        titles.retain(|entry| entry.title != title);
        titles.push(HistoryEntry {
            title: title.to_string(),
            chapter,
            provider,
        });
        self.save()?;
        info!(title, chapter, "History updated");
        Ok(())
    }
}

impl History for Settings {
    fn last_chapter(&self, title: &str) -> u32 {
        self.entry(title).map_or(1, |entry| entry.chapter)
    }

    fn is_tracked(&self, title: &str) -> bool {
        self.entry(title).is_some()
    }

    fn default_provider(&self) -> &str {
        &self.data.config.provider
    }

    fn record_chapter_fetched(&mut self, title: &str, chapter: u32, provider: &str) -> Result<()> {
        self.put(title, chapter, provider.to_string())
    }
}
