use super::source::Source;
use crate::error::{FetchError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

pub const DOMAIN: &str = "example.com";

#[derive(Debug, Clone)]
struct Canned {
    body: Vec<u8>,
    status: u16,
    delay: Duration,
}

/// In-memory site. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct StaticSource {
    responses: HashMap<String, Canned>,
    requested: Mutex<Vec<String>>,
}

impl StaticSource {
    pub fn page(self, url: &str, html: &str) -> Self {
        self.image(url, html.as_bytes())
    }

    pub fn image(mut self, url: &str, bytes: &[u8]) -> Self {
        self.responses.insert(
            url.to_string(),
            Canned {
                body: bytes.to_vec(),
                status: 200,
                delay: Duration::ZERO,
            },
        );
        self
    }

    pub fn failing(mut self, url: &str, status: u16) -> Self {
        let canned = self.responses.entry(url.to_string()).or_insert(Canned {
            body: Vec::new(),
            status,
            delay: Duration::ZERO,
        });
        canned.status = status;
        self
    }

    pub fn delayed(mut self, url: &str, delay: Duration) -> Self {
        if let Some(canned) = self.responses.get_mut(url) {
            canned.delay = delay;
        }
        self
    }

    /// Publishes a chapter of `title` on [`DOMAIN`] whose page selector
    /// holds `paths`. Page `i` shows `https://i<i>.example.com/<title>/<chapter>/<title>-<i>.jpg`,
    /// whose body is [`image_body`].
    pub fn chapter(mut self, title: &str, chapter: u32, paths: &[&str]) -> Self {
        let options: String = paths
            .iter()
            .map(|path| format!(r#"<option value="{path}">{path}</option>"#))
            .collect();
        self = self.page(
            &format!("https://www.{DOMAIN}/{title}/{chapter}/1"),
            &format!("<html><body><select>{options}</select></body></html>"),
        );
        for (index, path) in paths.iter().enumerate() {
            let image = image_url(title, chapter, index);
            self = self
                .page(
                    &format!("https://www.{DOMAIN}{path}"),
                    &format!(
                        r#"<html><body><img src="https://www.{DOMAIN}/logo.png"><img src="{image}"></body></html>"#
                    ),
                )
                .image(&image, &image_body(title, chapter, index));
        }
        self
    }

    /// A landing page that exists but lists no pages.
    pub fn empty_chapter(self, title: &str, chapter: u32) -> Self {
        self.page(
            &format!("https://www.{DOMAIN}/{title}/{chapter}/1"),
            "<html><body><p>Coming soon</p></body></html>",
        )
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_default()
    }

    async fn respond(&self, url: &str) -> Result<Vec<u8>> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        let canned = self.responses.get(url).cloned().ok_or(FetchError::Status {
            url: url.to_string(),
            status: 404,
        })?;
        if !canned.delay.is_zero() {
            tokio::time::sleep(canned.delay).await;
        }
        if canned.status != 200 {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: canned.status,
            });
        }
        Ok(canned.body)
    }
}

pub fn image_url(title: &str, chapter: u32, index: usize) -> String {
    format!("https://i{index}.{DOMAIN}/{title}/{chapter}/{title}-{index}.jpg")
}

pub fn image_body(title: &str, chapter: u32, index: usize) -> Vec<u8> {
    format!("{title}-{chapter}-{index}").into_bytes()
}

#[async_trait]
impl Source for StaticSource {
    async fn text(&self, url: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.respond(url).await?).into_owned())
    }

    async fn bytes(&self, url: &str) -> Result<Vec<u8>> {
        self.respond(url).await
    }
}
