//! Query refinement after a weak or failed search attempt.

use std::sync::Arc;

use async_trait::async_trait;
use unicode_segmentation::UnicodeSegmentation;

use super::config::AgentConfig;
use super::prompt::{REFINER_PREVIEW_GRAPHEMES, build_refiner_prompt};
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::error::AgentError;

/// Capability that rewrites a search query.
#[async_trait]
pub trait QueryRefiner: Send + Sync {
    /// Produces a new query from the previous query and its raw results.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the model call fails or produces no
    /// usable query.
    async fn refine(&self, previous_query: &str, previous_raw: &str)
    -> Result<String, AgentError>;
}

/// Agent that writes the refined query.
pub struct RefinerAgent {
    model: String,
    system_prompt: String,
}

impl RefinerAgent {
    /// Creates a refiner agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.refiner_model.clone(),
            system_prompt,
        }
    }
}

#[async_trait]
impl Agent for RefinerAgent {
    fn name(&self) -> &'static str {
        "refiner"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn max_tokens(&self) -> u32 {
        256
    }
}

/// [`QueryRefiner`] backed by a language model.
pub struct LlmQueryRefiner {
    provider: Arc<dyn LlmProvider>,
    agent: RefinerAgent,
}

impl LlmQueryRefiner {
    /// Creates a refiner over the given provider.
    #[must_use]
    pub const fn new(provider: Arc<dyn LlmProvider>, agent: RefinerAgent) -> Self {
        Self { provider, agent }
    }
}

impl std::fmt::Debug for LlmQueryRefiner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmQueryRefiner")
            .field("provider", &self.provider.name())
            .field("model", &self.agent.model)
            .finish()
    }
}

#[async_trait]
impl QueryRefiner for LlmQueryRefiner {
    async fn refine(
        &self,
        previous_query: &str,
        previous_raw: &str,
    ) -> Result<String, AgentError> {
        let preview = grapheme_prefix(previous_raw, REFINER_PREVIEW_GRAPHEMES);
        let response = self
            .agent
            .execute(&*self.provider, &build_refiner_prompt(previous_query, preview))
            .await?;

        clean_query(&response.content).ok_or_else(|| AgentError::ResponseParse {
            message: "refiner returned an empty query".to_string(),
            content: response.content,
        })
    }
}

/// Returns the first `max` grapheme clusters of `text`.
#[must_use]
pub fn grapheme_prefix(text: &str, max: usize) -> &str {
    text.grapheme_indices(true)
        .nth(max)
        .map_or(text, |(idx, _)| &text[..idx])
}

/// Reduces model output to a single plain query line.
fn clean_query(content: &str) -> Option<String> {
    let line = content.lines().map(str::trim).find(|l| !l.is_empty())?;
    let unquoted = line
        .trim_matches(|c| matches!(c, '"' | '\'' | '`'))
        .trim();
    (!unquoted.is_empty()).then(|| unquoted.to_string())
}
