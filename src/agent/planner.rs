//! The fixed collect → dispatch → synthesize graph.
//!
//! [`TripPlanner::advance`] moves one session forward by one user turn.
//! Collection may take many turns; once it yields a complete request the
//! same turn runs research and synthesis and the session becomes terminal.

use std::sync::Arc;

use tracing::{info, instrument};

use super::client::create_provider;
use super::collector::{CollectionLoop, CollectorAgent, DetailsAgent, LlmCollector};
use super::config::AgentConfig;
use super::dispatcher::Dispatcher;
use super::extractor::Extractor;
use super::prompt::PromptSet;
use super::refiner::{LlmQueryRefiner, RefinerAgent};
use super::structurer::LlmStructurer;
use super::synthesizer::{Synthesizer, SynthesizerAgent};
use crate::core::{Phase, TripRequest, TripState};
use crate::error::AgentError;
use crate::search::SearchProvider;

/// Reply sent when a finished session receives another message.
pub const ALREADY_PLANNED: &str =
    "This trip has already been planned. Clear the session to plan a new one.";

/// What one turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    /// Text to show the user.
    pub response_text: String,
    /// The plan, once the session is done.
    pub final_plan: Option<String>,
    /// Phase after the turn.
    pub phase: Phase,
    /// Whether the session is terminal.
    pub done: bool,
}

impl TurnReply {
    fn from_state(state: &TripState, response_text: String) -> Self {
        Self {
            response_text,
            final_plan: state.final_plan.clone(),
            phase: state.phase,
            done: state.is_terminal(),
        }
    }
}

/// Drives sessions through collection, research, and synthesis.
pub struct TripPlanner {
    collector: Arc<dyn CollectionLoop>,
    dispatcher: Dispatcher,
    synthesizer: Synthesizer,
}

impl TripPlanner {
    /// Assembles a planner from its three stages.
    #[must_use]
    pub fn new(
        collector: Arc<dyn CollectionLoop>,
        dispatcher: Dispatcher,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            collector,
            dispatcher,
            synthesizer,
        }
    }

    /// Builds a planner backed by the configured language model.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::UnsupportedProvider`] for an unknown provider.
    pub fn from_config(
        config: &AgentConfig,
        prompts: &PromptSet,
        search: Arc<dyn SearchProvider>,
    ) -> Result<Self, AgentError> {
        let provider = create_provider(config)?;

        let structurer = LlmStructurer::new(Arc::clone(&provider), config, prompts.extraction.clone());
        let refiner = LlmQueryRefiner::new(
            Arc::clone(&provider),
            RefinerAgent::new(config, prompts.refiner.clone()),
        );
        let extractor = Extractor::new(
            search,
            Arc::new(structurer),
            Arc::new(refiner),
            config.timeout,
        );
        let dispatcher = Dispatcher::new(Arc::new(extractor), config.max_concurrency);

        let collector = LlmCollector::new(
            Arc::clone(&provider),
            DetailsAgent::new(config, prompts.collector_extraction.clone()),
            CollectorAgent::new(config, prompts.collector.clone()),
            config.timeout,
        );
        let synthesizer = Synthesizer::new(
            provider,
            SynthesizerAgent::new(config, prompts.synthesizer.clone()),
            config.timeout,
        );

        Ok(Self::new(Arc::new(collector), dispatcher, synthesizer))
    }

    /// Advances `state` by one user message.
    ///
    /// A terminal state is returned untouched with [`ALREADY_PLANNED`].
    /// On error the state keeps whatever the failed step had already
    /// written; nothing is rolled back.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when collection, dispatch, or synthesis fails.
    #[instrument(skip_all, fields(phase = %state.phase))]
    pub async fn advance(
        &self,
        state: &mut TripState,
        message: &str,
    ) -> Result<TurnReply, AgentError> {
        if state.is_terminal() {
            return Ok(TurnReply::from_state(state, ALREADY_PLANNED.to_string()));
        }

        if state.phase == Phase::Collecting {
            let outcome = self.collector.advance(state, message).await?;
            state.push_user(message);
            state.push_assistant(outcome.reply.clone());
            state.trip_request = outcome.trip_request;
            state.missing_fields = outcome.missing_fields;
            state.phase = outcome.next_phase;

            if state.phase == Phase::Collecting {
                return Ok(TurnReply::from_state(state, outcome.reply));
            }
        } else {
            // Resuming after a failed research or synthesis step.
            state.push_user(message);
        }

        self.finish(state).await?;
        let plan = state.final_plan.clone().unwrap_or_default();
        Ok(TurnReply::from_state(state, plan))
    }

    /// Plans a trip from an already validated request, skipping collection.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when synthesis fails.
    pub async fn plan(&self, request: TripRequest) -> Result<TripState, AgentError> {
        let mut state = TripState::new();
        state.trip_request = Some(request);
        state.phase = Phase::Dispatching;
        self.finish(&mut state).await?;
        Ok(state)
    }

    /// Runs the remaining dispatch and synthesis steps.
    async fn finish(&self, state: &mut TripState) -> Result<(), AgentError> {
        if state.phase == Phase::Dispatching {
            let report = self.dispatcher.dispatch(state).await?;
            state.research = report.bundle;
            state.failed_agents = report.failed_agents;
            state.phase = Phase::Synthesizing;
        }

        if state.phase == Phase::Synthesizing {
            let request = state
                .trip_request
                .as_ref()
                .ok_or_else(|| AgentError::Orchestration {
                    message: "cannot synthesize a plan without a trip request".to_string(),
                })?;
            let plan = self
                .synthesizer
                .synthesize(request, &state.research, &state.failed_agents)
                .await?;
            state.budget_breakdown = plan.budget.to_map();
            state.final_plan = Some(plan.text.clone());
            state.push_assistant(plan.text);
            state.phase = Phase::Done;
            info!(failed = state.failed_agents.len(), "trip planned");
        }

        Ok(())
    }
}

impl std::fmt::Debug for TripPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripPlanner")
            .field("dispatcher", &self.dispatcher)
            .field("synthesizer", &self.synthesizer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::collector::CollectionOutcome;
    use crate::agent::message::{ChatRequest, ChatResponse, TokenUsage};
    use crate::agent::provider::LlmProvider;
    use crate::agent::refiner::QueryRefiner;
    use crate::agent::structurer::{SchemaDescriptor, Structurer};
    use crate::error::{SearchError, StructuringError};
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Needs two turns: the first names the route, the second completes it.
    struct TwoTurnCollector {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CollectionLoop for TwoTurnCollector {
        async fn advance(
            &self,
            _state: &TripState,
            _new_message: &str,
        ) -> Result<CollectionOutcome, AgentError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Ok(CollectionOutcome {
                    trip_request: None,
                    missing_fields: vec!["num_people".to_string()],
                    next_phase: Phase::Collecting,
                    reply: "How many travelers?".to_string(),
                });
            }
            Ok(CollectionOutcome {
                trip_request: Some(
                    TripRequest::new("NYC", "Paris", 2, "2025-06-01", "2025-06-08", 2000.0, None)
                        .unwrap_or_else(|_| unreachable!()),
                ),
                missing_fields: Vec::new(),
                next_phase: Phase::Dispatching,
                reply: "Researching now.".to_string(),
            })
        }
    }

    struct NoSearch;

    #[async_trait]
    impl SearchProvider for NoSearch {
        fn name(&self) -> &'static str {
            "none"
        }

        async fn search(&self, _query: &str) -> Result<String, SearchError> {
            Ok(String::new())
        }
    }

    struct NeverCalled;

    #[async_trait]
    impl Structurer for NeverCalled {
        async fn structure(
            &self,
            _instruction: &str,
            _raw_text: &str,
            _schema: &SchemaDescriptor,
        ) -> Result<Value, StructuringError> {
            Ok(Value::Null)
        }
    }

    #[async_trait]
    impl QueryRefiner for NeverCalled {
        async fn refine(&self, previous_query: &str, _raw: &str) -> Result<String, AgentError> {
            Ok(previous_query.to_string())
        }
    }

    struct PlanWriter {
        fail: bool,
    }

    #[async_trait]
    impl LlmProvider for PlanWriter {
        fn name(&self) -> &'static str {
            "plan-writer"
        }

        async fn chat(&self, _request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            if self.fail {
                return Err(AgentError::ApiRequest {
                    message: "service unavailable".to_string(),
                    status: Some(503),
                });
            }
            Ok(ChatResponse {
                content: "# Paris in June".to_string(),
                usage: TokenUsage::default(),
                finish_reason: Some("stop".to_string()),
            })
        }
    }

    fn planner(fail_synthesis: bool) -> TripPlanner {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let extractor = Extractor::new(
            Arc::new(NoSearch),
            Arc::new(NeverCalled),
            Arc::new(NeverCalled),
            Duration::from_secs(5),
        );
        let synthesizer = Synthesizer::new(
            Arc::new(PlanWriter {
                fail: fail_synthesis,
            }),
            SynthesizerAgent::new(&config, "plan".to_string()),
            Duration::from_secs(5),
        );
        TripPlanner::new(
            Arc::new(TwoTurnCollector {
                calls: AtomicUsize::new(0),
            }),
            Dispatcher::new(Arc::new(extractor), 6),
            synthesizer,
        )
    }

    #[tokio::test]
    async fn test_collect_then_plan() {
        let planner = planner(false);
        let mut state = TripState::new();

        let first = planner
            .advance(&mut state, "NYC to Paris")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(!first.done);
        assert_eq!(first.response_text, "How many travelers?");
        assert_eq!(state.missing_fields, vec!["num_people"]);

        let second = planner
            .advance(&mut state, "two of us")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(second.done);
        assert_eq!(state.phase, Phase::Done);
        assert_eq!(state.failed_agents.len(), 6);
        assert!(second.response_text.contains("could not be researched"));
        assert!(state.budget_breakdown.contains_key("buffer"));
        assert_eq!(state.messages.len(), 5);
    }

    #[tokio::test]
    async fn test_terminal_state_is_not_mutated() {
        let planner = planner(false);
        let mut state = TripState::new();
        let _ = planner.advance(&mut state, "NYC to Paris").await;
        let _ = planner.advance(&mut state, "two of us").await;
        let before = state.messages.len();

        let reply = planner
            .advance(&mut state, "actually make it Rome")
            .await
            .unwrap_or_else(|_| unreachable!());
        assert!(reply.done);
        assert_eq!(reply.response_text, ALREADY_PLANNED);
        assert_eq!(state.messages.len(), before);
    }

    #[tokio::test]
    async fn test_synthesis_failure_keeps_research() {
        let planner = planner(true);
        let mut state = TripState::new();
        let _ = planner.advance(&mut state, "NYC to Paris").await;

        let result = planner.advance(&mut state, "two of us").await;
        assert!(matches!(result, Err(AgentError::ApiRequest { .. })));
        assert_eq!(state.phase, Phase::Synthesizing);
        assert_eq!(state.failed_agents.len(), 6);
        assert!(state.final_plan.is_none());
    }
}
