use crate::error::{FetchError, Result};
use async_trait::async_trait;
use reqwest::{header::CACHE_CONTROL, Client, Response};
use tracing::debug;

/// Where markup and images come from.
#[async_trait]
pub trait Source: Send + Sync {
    async fn text(&self, url: &str) -> Result<String>;
    async fn bytes(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain HTTP retrieval. Every request asks intermediaries not to serve a
/// cached copy, and only 2xx responses are accepted.
#[derive(Debug, Clone, Default)]
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new() -> Self {
        Self::default()
    }

    async fn get(&self, url: &str) -> Result<Response> {
        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl Source for HttpSource {
    async fn text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        // Reader sites declare their charset in the markup, so decode the
        // bytes as UTF-8 the same way regardless of headers.
        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }

    async fn bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.get(url).await?;
        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;
        Ok(body.to_vec())
    }
}
