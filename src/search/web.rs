//! Tavily and Brave web search over `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::SearchProvider;
use crate::agent::AgentConfig;
use crate::error::SearchError;

const TAVILY_URL: &str = "https://api.tavily.com/search";
const BRAVE_URL: &str = "https://api.search.brave.com/res/v1/web/search";

/// Maximum characters kept from each result snippet.
const MAX_SNIPPET_CHARS: usize = 600;

/// Supported web search APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchBackend {
    /// <https://tavily.com>
    Tavily,
    /// <https://brave.com/search/api>
    Brave,
}

impl SearchBackend {
    /// Parses a backend name.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::UnknownBackend`] for unknown names.
    pub fn parse(name: &str) -> Result<Self, SearchError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tavily" => Ok(Self::Tavily),
            "brave" => Ok(Self::Brave),
            other => Err(SearchError::UnknownBackend {
                name: other.to_string(),
            }),
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Tavily => "tavily",
            Self::Brave => "brave",
        }
    }
}

/// Web search provider backed by Tavily or Brave.
pub struct WebSearchProvider {
    client: reqwest::Client,
    backend: SearchBackend,
    api_key: String,
    max_results: usize,
    timeout: Duration,
}

impl WebSearchProvider {
    /// Creates a provider for an explicit backend.
    #[must_use]
    pub fn new(
        backend: SearchBackend,
        api_key: impl Into<String>,
        max_results: usize,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            backend,
            api_key: api_key.into(),
            max_results: max_results.max(1),
            timeout,
        }
    }

    /// Creates a provider from the search settings in [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::NotConfigured`] if no key is set, or
    /// [`SearchError::UnknownBackend`] for an unknown backend name.
    pub fn from_config(config: &AgentConfig) -> Result<Self, SearchError> {
        let api_key = config
            .search_api_key
            .clone()
            .ok_or(SearchError::NotConfigured)?;
        let backend = config
            .search_backend
            .as_deref()
            .map_or(Ok(SearchBackend::Tavily), SearchBackend::parse)?;
        Ok(Self::new(
            backend,
            api_key,
            config.search_max_results,
            config.timeout,
        ))
    }

    async fn search_tavily(&self, query: &str) -> Result<String, SearchError> {
        let body = serde_json::json!({
            "api_key": self.api_key,
            "query": query,
            "max_results": self.max_results,
            "search_depth": "basic"
        });

        let request = self.client.post(TAVILY_URL).json(&body);
        let result = self.send(request).await?;

        Ok(format_results(
            result["results"].as_array().map(Vec::as_slice),
            "content",
        ))
    }

    async fn search_brave(&self, query: &str) -> Result<String, SearchError> {
        let request = self
            .client
            .get(BRAVE_URL)
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", &self.max_results.to_string())]);
        let result = self.send(request).await?;

        Ok(format_results(
            result["web"]["results"].as_array().map(Vec::as_slice),
            "description",
        ))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value, SearchError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout(self.timeout)
            } else {
                SearchError::Request {
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SearchError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response.json().await.map_err(|e| SearchError::Request {
            message: format!("failed to parse response: {e}"),
        })
    }
}

impl std::fmt::Debug for WebSearchProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearchProvider")
            .field("backend", &self.backend)
            .field("max_results", &self.max_results)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SearchProvider for WebSearchProvider {
    fn name(&self) -> &'static str {
        self.backend.name()
    }

    async fn search(&self, query: &str) -> Result<String, SearchError> {
        debug!(backend = self.backend.name(), query, "web search");
        match self.backend {
            SearchBackend::Tavily => self.search_tavily(query).await,
            SearchBackend::Brave => self.search_brave(query).await,
        }
    }
}

/// Formats result objects as a numbered list; empty when there are none.
fn format_results(results: Option<&[Value]>, snippet_key: &str) -> String {
    let Some(results) = results else {
        return String::new();
    };

    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let title = r["title"].as_str().unwrap_or("(no title)");
            let url = r["url"].as_str().unwrap_or("");
            let snippet: String = r[snippet_key]
                .as_str()
                .unwrap_or("")
                .chars()
                .take(MAX_SNIPPET_CHARS)
                .collect();
            format!("{}. {title}\n   {url}\n   {snippet}\n", i + 1)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
