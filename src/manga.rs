use crate::error::{FetchError, Result};
use crate::settings::History;
use futures::{stream, StreamExt, TryStreamExt};
use regex::Regex;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, info, warn};

pub mod archive;
pub mod chapter;
pub mod get;
pub mod locate;
pub mod page;
pub mod progress;
pub mod provider;
pub mod source;
#[cfg(test)]
mod testing;

use chapter::{ChapterRef, PageImage};
use progress::PageProgress;
use provider::Provider;
use source::Source;

/// Page files are numbered on three digits, more pages would not sort.
pub const MAX_PAGES: usize = 1000;

/// Result of asking for one chapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    Archived {
        archive: PathBuf,
        pages: usize,
        next: u32,
    },
    Unavailable,
}

/// What a multi-chapter run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub archives: Vec<PathBuf>,
    /// The first chapter that was found unavailable.
    pub next: u32,
}

/// The chapter to begin a run with. `force` takes the requested chapter as
/// is, otherwise the run never goes back before the recorded one. Without a
/// request a tracked title resumes after its last chapter.
pub fn starting_chapter(requested: Option<u32>, recorded: Option<u32>, force: bool) -> u32 {
    match (requested, recorded) {
        (Some(chapter), _) if force => chapter,
        (Some(chapter), Some(last)) => chapter.max(last),
        (Some(chapter), None) => chapter,
        (None, Some(last)) => last + 1,
        (None, None) => 1,
    }
}

/// One title on one provider, archived under `output/<title>/`.
pub struct Manga {
    source: Arc<dyn Source>,
    provider: Provider,
    title: String,
    output: PathBuf,
}

impl Manga {
    pub fn new(
        source: Arc<dyn Source>,
        provider: Provider,
        title: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            provider,
            title: title.into(),
            output: output.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn chapter(&self, chapter: u32) -> ChapterRef {
        ChapterRef::new(self.provider.clone(), self.title.clone(), chapter)
    }

    async fn locate(&self, chapter: &ChapterRef) -> Result<Vec<String>> {
        locate::locate_pages(self.source.as_ref(), chapter).await
    }

    /// Whether `chapter` has at least one page.
    pub async fn is_available(&self, chapter: u32) -> Result<bool> {
        Ok(!self.locate(&self.chapter(chapter)).await?.is_empty())
    }

    /// Downloads and archives a single chapter. With `progress` the pages are
    /// fetched concurrently and reported as they land, without it they are
    /// fetched one after another.
    pub async fn fetch_chapter(
        &self,
        chapter: u32,
        progress: Option<&dyn PageProgress>,
    ) -> Result<Fetched> {
        let chapter = self.chapter(chapter);
        let pages = self.locate(&chapter).await?;
        if pages.is_empty() {
            info!(title = %chapter.title, chapter = chapter.chapter, "Chapter not available");
            return Ok(Fetched::Unavailable);
        }
        info!(
            title = %chapter.title,
            chapter = chapter.chapter,
            pages = pages.len(),
            "Found pages"
        );

        if pages.len() > MAX_PAGES {
            return Err(FetchError::Parse {
                url: chapter.landing_url(),
                reason: format!(
                    "{} pages listed, page file names only order up to {}",
                    pages.len(),
                    MAX_PAGES
                ),
            });
        }

        let pattern = self.provider.image_pattern(&self.title)?;
        let working_dir = chapter.working_dir(&self.output);
        prepare_working_dir(&working_dir)?;

        if let Some(progress) = progress {
            progress.start(&chapter, pages.len());
        }
        let downloaded = self
            .download_pages(&working_dir, &pattern, &pages, progress)
            .await;
        if let Some(progress) = progress {
            progress.finish(&chapter);
        }
        if let Err(err) = downloaded {
            discard_working_dir(&working_dir);
            return Err(err);
        }

        let archive = archive::build_archive(
            &chapter.title_dir(&self.output),
            &working_dir,
            &chapter.title,
            chapter.chapter,
        )
        .map_err(|err| {
            discard_working_dir(&working_dir);
            err
        })?;
        Ok(Fetched::Archived {
            archive,
            pages: pages.len(),
            next: chapter.chapter + 1,
        })
    }

    async fn download_pages(
        &self,
        dir: &Path,
        pattern: &Regex,
        pages: &[String],
        progress: Option<&dyn PageProgress>,
    ) -> Result<()> {
        match progress {
            Some(progress) => {
                let mut downloads = stream::iter(pages.iter().enumerate())
                    .map(|(index, url)| self.download_page(dir, pattern, index, url))
                    .buffer_unordered(pages.len());
                // Returning early drops `downloads`, which cancels every page
                // still in flight before the error reaches the caller.
                while let Some(path) = downloads.try_next().await? {
                    debug!(path = ?path, "Saved page");
                    progress.advance();
                }
            }
            None => {
                for (index, url) in pages.iter().enumerate() {
                    let path = self.download_page(dir, pattern, index, url).await?;
                    debug!(path = ?path, "Saved page");
                }
            }
        }
        Ok(())
    }

    async fn download_page(
        &self,
        dir: &Path,
        pattern: &Regex,
        index: usize,
        url: &str,
    ) -> Result<PathBuf> {
        let image = locate::resolve_image(self.source.as_ref(), pattern, url).await?;
        page::fetch_image(self.source.as_ref(), dir, &PageImage::new(index, image)).await
    }

    /// Fetches `start`, `start + 1`, ... until a chapter is unavailable,
    /// recording each archived chapter in `history` as it completes. A hard
    /// failure stops the run with the history left at the last good chapter.
    pub async fn fetch_from(
        &self,
        start: u32,
        history: &mut dyn History,
        progress: Option<&dyn PageProgress>,
    ) -> Result<Run> {
        let mut chapter = start;
        let mut archives = Vec::new();
        loop {
            match self.fetch_chapter(chapter, progress).await? {
                Fetched::Archived {
                    archive,
                    pages,
                    next,
                } => {
                    info!(archive = ?archive, pages, "Chapter {} archived", chapter);
                    history.record_chapter_fetched(&self.title, chapter, self.provider.domain())?;
                    archives.push(archive);
                    chapter = next;
                }
                Fetched::Unavailable => break,
            }
        }
        Ok(Run {
            archives,
            next: chapter,
        })
    }
}

/// Best effort removal of a chapter's working directory after a failure.
fn discard_working_dir(dir: &Path) {
    if let Err(cleanup) = fs::remove_dir_all(dir) {
        warn!(dir = ?dir, error = %cleanup, "Unable to remove working directory");
    }
}

/// Makes sure `dir` exists, is a directory and is empty.
fn prepare_working_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir).map_err(FetchError::fs(dir))?;
    }
    let metadata = fs::metadata(dir).map_err(FetchError::fs(dir))?;
    if !metadata.is_dir() {
        return Err(FetchError::State {
            path: dir.to_path_buf(),
        });
    }
    for entry in fs::read_dir(dir).map_err(FetchError::fs(dir))? {
        let path = entry.map_err(FetchError::fs(dir))?.path();
        if path.is_dir() {
            fs::remove_dir_all(&path).map_err(FetchError::fs(&path))?;
        } else {
            fs::remove_file(&path).map_err(FetchError::fs(&path))?;
        }
    }
    Ok(())
}
