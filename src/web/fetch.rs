// HTTP page fetching.
// Loads pages with reqwest and returns cleaned HTML for the agent.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::USER_AGENT};

use crate::error::{Result, ScoutError};

use super::clean::clean_html;

const DEFAULT_USER_AGENT: &str = concat!("contact-scout/", env!("CARGO_PKG_VERSION"));

/// Anything that can turn a URL into cleaned page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain HTTP fetcher. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ScoutError::Http)?;
        Ok(Self { client })
    }

    /// Load the raw page, returning the final URL after redirects and the body.
    pub async fn load(&self, url: &str) -> Result<(String, String)> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .send()
            .await
            .map_err(ScoutError::Http)?;

        let status = response.status();
        let final_url = response.url().to_string();
        match status {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => {
                return Err(ScoutError::Other(format!("Page not found: {}", final_url)));
            }
            s => return Err(ScoutError::Other(format!("HTTP {} for {}", s, final_url))),
        }

        let body = response.text().await?;
        Ok((final_url, body))
    }
}

#[async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let (final_url, body) = self.load(url).await?;
        clean_html(&body, &final_url)
    }
}
