//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default maximum concurrently running research agents.
const DEFAULT_MAX_CONCURRENCY: usize = 6;
/// Default extraction max tokens.
const DEFAULT_EXTRACTION_MAX_TOKENS: u32 = 4096;
/// Default synthesizer max tokens.
const DEFAULT_SYNTHESIZER_MAX_TOKENS: u32 = 4096;
/// Default per-call timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// Default number of search results requested per query.
const DEFAULT_SEARCH_MAX_RESULTS: usize = 5;
/// Default idle lifetime of a planning session.
const DEFAULT_SESSION_TTL_SECS: u64 = 60 * 60;
/// Default maximum number of live sessions.
const DEFAULT_MAX_SESSIONS: usize = 1024;
/// Default model for every role.
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// Default model for synthesis.
const DEFAULT_SYNTHESIZER_MODEL: &str = "gpt-4o";

/// Configuration for the planning system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model turning search text into structured records.
    pub extraction_model: String,
    /// Model rewriting weak search queries.
    pub refiner_model: String,
    /// Model driving the requirement-collection conversation.
    pub collector_model: String,
    /// Model writing the final plan.
    pub synthesizer_model: String,
    /// Maximum concurrently running research agents.
    pub max_concurrency: usize,
    /// Maximum tokens for extraction responses.
    pub extraction_max_tokens: u32,
    /// Maximum tokens for synthesizer responses.
    pub synthesizer_max_tokens: u32,
    /// Deadline applied to each search and model call.
    pub timeout: Duration,
    /// Directory containing prompt template files.
    ///
    /// Missing files fall back to compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
    /// Web search backend name (`"tavily"` or `"brave"`).
    pub search_backend: Option<String>,
    /// API key for the web search backend.
    pub search_api_key: Option<String>,
    /// Results requested per search query.
    pub search_max_results: usize,
    /// Idle lifetime of a planning session.
    pub session_ttl: Duration,
    /// Maximum number of live sessions.
    pub max_sessions: usize,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    extraction_model: Option<String>,
    refiner_model: Option<String>,
    collector_model: Option<String>,
    synthesizer_model: Option<String>,
    max_concurrency: Option<usize>,
    extraction_max_tokens: Option<u32>,
    synthesizer_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    prompt_dir: Option<PathBuf>,
    search_backend: Option<String>,
    search_api_key: Option<String>,
    search_max_results: Option<usize>,
    session_ttl: Option<Duration>,
    max_sessions: Option<usize>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("TRIP_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .or_else(|_| std::env::var("TRIP_API_KEY"))
                .ok();
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL")
                .or_else(|_| std::env::var("TRIP_BASE_URL"))
                .ok();
        }
        if self.extraction_model.is_none() {
            self.extraction_model = std::env::var("TRIP_EXTRACTION_MODEL").ok();
        }
        if self.refiner_model.is_none() {
            self.refiner_model = std::env::var("TRIP_REFINER_MODEL").ok();
        }
        if self.collector_model.is_none() {
            self.collector_model = std::env::var("TRIP_COLLECTOR_MODEL").ok();
        }
        if self.synthesizer_model.is_none() {
            self.synthesizer_model = std::env::var("TRIP_SYNTHESIZER_MODEL").ok();
        }
        if self.max_concurrency.is_none() {
            self.max_concurrency = env_parse("TRIP_MAX_CONCURRENCY");
        }
        if self.timeout.is_none() {
            self.timeout = env_parse("TRIP_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("TRIP_PROMPT_DIR").ok().map(PathBuf::from);
        }
        if self.search_backend.is_none() {
            self.search_backend = std::env::var("TRIP_SEARCH_BACKEND").ok();
        }
        if self.search_api_key.is_none() {
            self.search_api_key = match self.search_backend.as_deref() {
                Some("brave") => std::env::var("BRAVE_API_KEY").ok(),
                Some(_) => std::env::var("TAVILY_API_KEY").ok(),
                None => {
                    if let Ok(key) = std::env::var("TAVILY_API_KEY") {
                        self.search_backend = Some("tavily".to_string());
                        Some(key)
                    } else if let Ok(key) = std::env::var("BRAVE_API_KEY") {
                        self.search_backend = Some("brave".to_string());
                        Some(key)
                    } else {
                        None
                    }
                }
            };
        }
        if self.search_max_results.is_none() {
            self.search_max_results = env_parse("TRIP_SEARCH_MAX_RESULTS");
        }
        if self.session_ttl.is_none() {
            self.session_ttl = env_parse("TRIP_SESSION_TTL_SECS").map(Duration::from_secs);
        }
        if self.max_sessions.is_none() {
            self.max_sessions = env_parse("TRIP_MAX_SESSIONS");
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the extraction model.
    #[must_use]
    pub fn extraction_model(mut self, model: impl Into<String>) -> Self {
        self.extraction_model = Some(model.into());
        self
    }

    /// Sets the query refiner model.
    #[must_use]
    pub fn refiner_model(mut self, model: impl Into<String>) -> Self {
        self.refiner_model = Some(model.into());
        self
    }

    /// Sets the collection model.
    #[must_use]
    pub fn collector_model(mut self, model: impl Into<String>) -> Self {
        self.collector_model = Some(model.into());
        self
    }

    /// Sets the synthesizer model.
    #[must_use]
    pub fn synthesizer_model(mut self, model: impl Into<String>) -> Self {
        self.synthesizer_model = Some(model.into());
        self
    }

    /// Sets the maximum concurrency.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Sets the extraction max tokens.
    #[must_use]
    pub const fn extraction_max_tokens(mut self, n: u32) -> Self {
        self.extraction_max_tokens = Some(n);
        self
    }

    /// Sets the synthesizer max tokens.
    #[must_use]
    pub const fn synthesizer_max_tokens(mut self, n: u32) -> Self {
        self.synthesizer_max_tokens = Some(n);
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the web search backend.
    #[must_use]
    pub fn search_backend(mut self, backend: impl Into<String>) -> Self {
        self.search_backend = Some(backend.into());
        self
    }

    /// Sets the web search API key.
    #[must_use]
    pub fn search_api_key(mut self, key: impl Into<String>) -> Self {
        self.search_api_key = Some(key.into());
        self
    }

    /// Sets the results requested per search query.
    #[must_use]
    pub const fn search_max_results(mut self, n: usize) -> Self {
        self.search_max_results = Some(n);
        self
    }

    /// Sets the session idle lifetime.
    #[must_use]
    pub const fn session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    /// Sets the maximum number of live sessions.
    #[must_use]
    pub const fn max_sessions(mut self, n: usize) -> Self {
        self.max_sessions = Some(n);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;
        let model = |m: Option<String>| m.unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(AgentConfig {
            provider: self.provider.unwrap_or_else(|| "openai".to_string()),
            api_key,
            base_url: self.base_url,
            extraction_model: model(self.extraction_model),
            refiner_model: model(self.refiner_model),
            collector_model: model(self.collector_model),
            synthesizer_model: self
                .synthesizer_model
                .unwrap_or_else(|| DEFAULT_SYNTHESIZER_MODEL.to_string()),
            max_concurrency: self
                .max_concurrency
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MAX_CONCURRENCY),
            extraction_max_tokens: self
                .extraction_max_tokens
                .unwrap_or(DEFAULT_EXTRACTION_MAX_TOKENS),
            synthesizer_max_tokens: self
                .synthesizer_max_tokens
                .unwrap_or(DEFAULT_SYNTHESIZER_MAX_TOKENS),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            prompt_dir: self.prompt_dir,
            search_backend: self.search_backend,
            search_api_key: self.search_api_key,
            search_max_results: self
                .search_max_results
                .unwrap_or(DEFAULT_SEARCH_MAX_RESULTS),
            session_ttl: self
                .session_ttl
                .unwrap_or(Duration::from_secs(DEFAULT_SESSION_TTL_SECS)),
            max_sessions: self
                .max_sessions
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MAX_SESSIONS),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
        assert_eq!(config.extraction_model, DEFAULT_MODEL);
        assert_eq!(config.synthesizer_model, DEFAULT_SYNTHESIZER_MODEL);
        assert_eq!(config.search_max_results, DEFAULT_SEARCH_MAX_RESULTS);
        assert!(config.search_backend.is_none());
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = AgentConfig::builder().build();
        assert!(matches!(result, Err(AgentError::ApiKeyMissing)));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .provider("custom")
            .extraction_model("gpt-4.1-mini")
            .max_concurrency(2)
            .timeout(Duration::from_secs(30))
            .search_backend("brave")
            .search_api_key("brave-key")
            .session_ttl(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "custom");
        assert_eq!(config.extraction_model, "gpt-4.1-mini");
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.search_backend.as_deref(), Some("brave"));
        assert_eq!(config.session_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_zero_concurrency_uses_default() {
        let config = AgentConfig::builder()
            .api_key("key")
            .max_concurrency(0)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.max_concurrency, DEFAULT_MAX_CONCURRENCY);
    }
}
