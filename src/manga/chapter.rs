use super::provider::Provider;
use std::path::{Path, PathBuf};

/// One chapter of one title on one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    pub provider: Provider,
    pub title: String,
    pub chapter: u32,
}

impl ChapterRef {
    pub fn new(provider: Provider, title: impl Into<String>, chapter: u32) -> Self {
        Self {
            provider,
            title: title.into(),
            chapter,
        }
    }

    pub fn landing_url(&self) -> String {
        self.provider.chapter_url(&self.title, self.chapter)
    }

    /// `<root>/<title>`, where the archives of a title end up.
    pub fn title_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.title)
    }

    /// `<root>/<title>/<chapter:03>`, the transient download directory.
    pub fn working_dir(&self, root: &Path) -> PathBuf {
        self.title_dir(root).join(format!("{:03}", self.chapter))
    }
}

pub fn archive_file_name(title: &str, chapter: u32) -> String {
    format!("{}-{:03}.cbz", title, chapter)
}

/// A page whose image has been resolved. The index is the page position and
/// fixes the file name, so completion order never affects the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub index: usize,
    pub url: String,
}

impl PageImage {
    pub fn new(index: usize, url: impl Into<String>) -> Self {
        Self {
            index,
            url: url.into(),
        }
    }

    /// `page_<index:03>.jpg`. Names only sort in page order below index
    /// 1000, chapters with more pages are refused before download.
    pub fn file_name(&self) -> String {
        format!("page_{:03}.jpg", self.index)
    }
}
