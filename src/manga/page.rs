use super::chapter::PageImage;
use super::source::Source;
use crate::error::{FetchError, Result};
use std::path::{Path, PathBuf};

/// Downloads one page image into `dir` as `page_<index:03>.jpg`.
pub async fn fetch_image(source: &dyn Source, dir: &Path, page: &PageImage) -> Result<PathBuf> {
    let bytes = source.bytes(&page.url).await?;
    let path = dir.join(page.file_name());
    tokio::fs::write(&path, &bytes)
        .await
        .map_err(FetchError::fs(&path))?;
    Ok(path)
}
