//! Gitea repository listing
//!
//! Walks `GET {url}/api/v1/repos/search?page=N` one page at a time and exposes
//! the result as a lazy stream of [`Repository`] descriptors. The stream ends
//! at the first page whose `data` array is empty.

use anyhow::{Context, Result};
use futures::stream::{self, Stream, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::Config;

/// One remote repository as returned by the search API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Repository {
    /// Browsing URL, its last path segment names the local checkout
    pub html_url: String,
    pub clone_url: String,
    pub owner: Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Owner {
    pub login: String,
}

impl Repository {
    /// Final non-empty path segment of `html_url`
    pub fn name(&self) -> &str {
        self.html_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Display name (owner/name format)
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner.login, self.name())
    }
}

/// Envelope of a `/repos/search` response
#[derive(Debug, Deserialize)]
pub struct SearchPage {
    #[serde(default)]
    pub ok: bool,
    /// Absent or `null` on error envelopes
    #[serde(default)]
    pub data: Option<Vec<Repository>>,
}

/// Client for the repository search endpoint of a Gitea server
pub struct GiteaClient {
    http: reqwest::Client,
    base_url: String,
    page_size: Option<u32>,
}

impl GiteaClient {
    /// Create a client for the server at `base_url`
    pub fn new(base_url: &str, config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("saverepos/", env!("CARGO_PKG_VERSION")));

        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    pub fn search_url(&self) -> String {
        format!("{}/api/v1/repos/search", self.base_url)
    }

    /// Fetch and decode a single page of search results
    ///
    /// Transport failures, non-2xx statuses and malformed bodies are errors.
    /// An `ok: false` envelope is only logged; its `data` is still returned.
    pub async fn fetch_page(&self, page: u32) -> Result<Vec<Repository>> {
        let url = self.search_url();
        debug!("Retrieving: {}?page={}", url, page);

        let mut request = self.http.get(&url).query(&[("page", page)]);
        if let Some(limit) = self.page_size {
            request = request.query(&[("limit", limit)]);
        }

        let body = request
            .send()
            .await
            .with_context(|| format!("Failed to fetch repositories page {}", page))?
            .error_for_status()
            .with_context(|| format!("Server rejected repositories page {}", page))?
            .text()
            .await
            .with_context(|| format!("Failed to read repositories page {}", page))?;

        let parsed: SearchPage = serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse repositories page {}", page))?;

        if !parsed.ok {
            error!("Server reported an error for page {}: {}", page, body.trim());
        }

        let repos = parsed.data.unwrap_or_default();
        debug!("Page {} returned {} repositories", page, repos.len());
        Ok(repos)
    }

    /// Lazy stream of result pages, starting at page 1
    ///
    /// The stream ends on the first empty page, or right after yielding an
    /// error. It cannot be restarted.
    pub fn pages(&self) -> impl Stream<Item = Result<Vec<Repository>>> + '_ {
        stream::try_unfold(1u32, move |page| async move {
            let repos = self.fetch_page(page).await?;
            let next = if repos.is_empty() {
                info!("Listing finished after {} page(s)", page - 1);
                None
            } else {
                Some((repos, page + 1))
            };
            Ok::<_, anyhow::Error>(next)
        })
    }

    /// Lazy stream of every repository on the server, in API order
    pub fn repositories(&self) -> impl Stream<Item = Result<Repository>> + '_ {
        self.pages()
            .map_ok(|repos| stream::iter(repos.into_iter().map(Ok::<_, anyhow::Error>)))
            .try_flatten()
    }
}
