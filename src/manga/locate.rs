use super::chapter::ChapterRef;
use super::provider::Provider;
use super::source::Source;
use crate::error::{FetchError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;

lazy_static! {
    static ref PAGE_SELECTOR: Selector = Selector::parse("option").unwrap();
    static ref IMAGE_SELECTOR: Selector = Selector::parse("img").unwrap();
}

/// Every page selector value on a chapter landing page, made absolute, in
/// document order. Options without a value are skipped.
pub fn page_urls(provider: &Provider, html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    doc.select(&PAGE_SELECTOR)
        .filter_map(|option| option.value().attr("value"))
        .map(|value| provider.page_url(value))
        .collect()
}

/// The first `<img>` whose whole `src` matches `pattern`.
pub fn find_image(pattern: &Regex, html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    doc.select(&IMAGE_SELECTOR)
        .filter_map(|img| img.value().attr("src"))
        .find(|src| pattern.is_match(src))
        .map(str::to_string)
}

/// Fetches the landing page of `chapter` and lists its pages. An empty list
/// means the chapter does not exist (yet).
pub async fn locate_pages(source: &dyn Source, chapter: &ChapterRef) -> Result<Vec<String>> {
    let url = chapter.landing_url();
    let html = source.text(&url).await?;
    let pages = page_urls(&chapter.provider, &html);
    debug!(url, pages = pages.len(), "Located pages");
    Ok(pages)
}

/// Fetches a single page and returns the direct URL of its image.
pub async fn resolve_image(source: &dyn Source, pattern: &Regex, page_url: &str) -> Result<String> {
    let html = source.text(page_url).await?;
    find_image(pattern, &html).ok_or_else(|| FetchError::Parse {
        url: page_url.to_string(),
        reason: "no image matching the title was found".to_string(),
    })
}
