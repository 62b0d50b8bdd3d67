//! Final itinerary synthesis.
//!
//! The model writes the narrative; the budget breakdown and the notes for
//! unresearched sections are attached deterministically so that neither
//! depends on the model following instructions.

use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::budget::BudgetBreakdown;
use super::config::AgentConfig;
use super::prompt::build_synthesizer_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{Category, ResearchBundle, TripRequest};
use crate::error::AgentError;

/// Agent that writes the final trip plan.
pub struct SynthesizerAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl SynthesizerAgent {
    /// Creates a new synthesizer agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.synthesizer_model.clone(),
            max_tokens: config.synthesizer_max_tokens,
            system_prompt,
        }
    }
}

#[async_trait]
impl Agent for SynthesizerAgent {
    fn name(&self) -> &'static str {
        "synthesizer"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        0.3
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

/// A finished plan and the budget attached to it.
#[derive(Debug, Clone)]
pub struct SynthesizedPlan {
    /// Markdown plan text, budget section included.
    pub text: String,
    /// Computed per-person budget.
    pub budget: BudgetBreakdown,
}

/// Turns a research bundle into the final plan.
pub struct Synthesizer {
    provider: Arc<dyn LlmProvider>,
    agent: SynthesizerAgent,
    timeout: Duration,
}

impl Synthesizer {
    /// Creates a synthesizer over the given provider.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, agent: SynthesizerAgent, timeout: Duration) -> Self {
        Self {
            provider,
            agent,
            timeout,
        }
    }

    /// Writes the plan for `request`.
    ///
    /// Every category whose agent failed without records gets an explicit
    /// "could not be researched" line, whether or not the model wrote one.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the model call fails or times out.
    pub async fn synthesize(
        &self,
        request: &TripRequest,
        bundle: &ResearchBundle,
        failed_agents: &[String],
    ) -> Result<SynthesizedPlan, AgentError> {
        let unresearched = unresearched_categories(bundle, failed_agents);
        let prompt = build_synthesizer_prompt(request, bundle, &unresearched);

        let response = tokio::time::timeout(
            self.timeout,
            self.agent.execute(&*self.provider, &prompt),
        )
        .await
        .map_err(|_| AgentError::Timeout {
            operation: "synthesis",
            after: self.timeout,
        })??;
        debug!(
            completion_tokens = response.usage.completion_tokens,
            unresearched = unresearched.len(),
            "plan synthesized"
        );

        let mut text = response.content.trim().to_string();
        let missing: Vec<String> = unresearched
            .iter()
            .map(|c| acknowledgment(*c))
            .filter(|line| !text.contains(line.as_str()))
            .collect();
        if !missing.is_empty() {
            warn!(count = missing.len(), "plan omitted research gaps; appending them");
            text.push_str("\n\n## Research gaps\n\n");
            for line in &missing {
                let _ = writeln!(text, "- {line}");
            }
        }

        let budget = BudgetBreakdown::estimate(request, bundle);
        text = format!("{}\n\n{}", text.trim_end(), budget.render());

        Ok(SynthesizedPlan { text, budget })
    }
}

impl std::fmt::Debug for Synthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Synthesizer")
            .field("provider", &self.provider.name())
            .field("model", &self.agent.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Line that marks `category` as unresearched in the plan.
#[must_use]
pub fn acknowledgment(category: Category) -> String {
    format!("{}: this section could not be researched", category.section_title())
}

/// Categories whose agent failed and left no records, in display order.
#[must_use]
pub fn unresearched_categories(bundle: &ResearchBundle, failed_agents: &[String]) -> Vec<Category> {
    Category::ALL
        .into_iter()
        .filter(|c| failed_agents.iter().any(|name| name == c.agent_name()))
        .filter(|c| bundle.is_empty(*c))
        .collect()
}
