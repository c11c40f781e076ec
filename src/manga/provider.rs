use crate::error::{FetchError, Result};
use regex::Regex;
use std::fmt;

/// A reader site. The domain suffix drives every URL the pipeline touches:
/// landing pages live under `https://www.<domain>`, page selectors hold paths
/// relative to that root, and images are served from any subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provider {
    domain: String,
}

impl Provider {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn base_url(&self) -> String {
        format!("https://www.{}", self.domain)
    }

    /// The first page of a chapter, which also lists every other page.
    pub fn chapter_url(&self, title: &str, chapter: u32) -> String {
        format!("{}/{}/{}/1", self.base_url(), title, chapter)
    }

    pub fn page_url(&self, selector_value: &str) -> String {
        format!("{}{}", self.base_url(), selector_value)
    }

    /// Full-match pattern for the image of a single page of `title`.
    pub fn image_pattern(&self, title: &str) -> Result<Regex> {
        let pattern = format!(
            r"^http.*://.+\.{}/{}/\d+/.+\..+$",
            regex::escape(&self.domain),
            regex::escape(title)
        );
        Regex::new(&pattern).map_err(|err| FetchError::Parse {
            url: self.base_url(),
            reason: format!("invalid image pattern {pattern:?}: {err}"),
        })
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.domain)
    }
}
