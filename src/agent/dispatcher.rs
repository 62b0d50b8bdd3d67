//! Fan-out/fan-in over the six research agents.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::extractor::Extractor;
use super::research::ResearchAgent;
use crate::core::{
    AgentOutcome, CategoryRecords, FailureReason, ResearchBundle, TripRequest, TripState,
};
use crate::error::AgentError;

/// Merged result of one dispatch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    /// Records from every agent, keyed by category.
    pub bundle: ResearchBundle,
    /// Names of agents that did not succeed, sorted and duplicate-free.
    pub failed_agents: Vec<String>,
}

/// Runs every research agent concurrently and waits for all of them.
pub struct Dispatcher {
    extractor: Arc<Extractor>,
    max_concurrency: usize,
}

impl Dispatcher {
    /// Creates a dispatcher over a shared extractor.
    #[must_use]
    pub fn new(extractor: Arc<Extractor>, max_concurrency: usize) -> Self {
        Self {
            extractor,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Dispatches research for the request held by `state`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] when the state has no trip
    /// request or still has missing fields.
    pub async fn dispatch(&self, state: &TripState) -> Result<DispatchReport, AgentError> {
        let request = state
            .trip_request
            .as_ref()
            .ok_or_else(|| AgentError::Orchestration {
                message: "cannot dispatch research without a trip request".to_string(),
            })?;
        if !state.missing_fields.is_empty() {
            return Err(AgentError::Orchestration {
                message: format!(
                    "cannot dispatch research with missing fields: {}",
                    state.missing_fields.join(", ")
                ),
            });
        }
        Ok(self.dispatch_request(request).await)
    }

    /// Runs all agents for `request`.
    ///
    /// Never short-circuits: a failed or aborted agent contributes its
    /// best-effort records (possibly none) and its name to the failed set.
    pub async fn dispatch_request(&self, request: &TripRequest) -> DispatchReport {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let request = Arc::new(request.clone());

        let mut handles = Vec::with_capacity(6);
        for agent in ResearchAgent::all() {
            let sem = Arc::clone(&semaphore);
            let extractor = Arc::clone(&self.extractor);
            let req = Arc::clone(&request);

            let handle = tokio::spawn(async move {
                let _permit = sem.acquire().await.ok();
                agent.run(&extractor, &req).await
            });
            handles.push((agent, handle));
        }

        let mut report = DispatchReport::default();
        let mut failed = BTreeSet::new();
        for (agent, handle) in handles {
            let outcome = handle.await.unwrap_or_else(|e| {
                warn!(agent = agent.name(), error = %e, "research task aborted");
                AgentOutcome {
                    agent_name: agent.name(),
                    succeeded: false,
                    records: CategoryRecords::empty(agent.category()),
                    failure_reason: Some(FailureReason::TaskAborted),
                    attempts: 0,
                }
            });

            if !outcome.succeeded {
                failed.insert(outcome.agent_name.to_string());
            }
            report.bundle.insert(outcome.records);
        }
        report.failed_agents = failed.into_iter().collect();

        info!(
            failed = report.failed_agents.len(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "research dispatch complete"
        );

        report
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("extractor", &self.extractor)
            .field("max_concurrency", &self.max_concurrency)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::refiner::QueryRefiner;
    use crate::agent::structurer::{SchemaDescriptor, Structurer};
    use crate::core::{Category, Phase};
    use crate::error::{SearchError, StructuringError};
    use crate::search::SearchProvider;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::collections::HashMap;
    use std::time::Duration;

    struct EchoSearch;

    #[async_trait]
    impl SearchProvider for EchoSearch {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn search(&self, query: &str) -> Result<String, SearchError> {
            Ok(format!("results for {query}"))
        }
    }

    /// Answers by schema name; `panic_on` simulates a crashing agent.
    struct TableStructurer {
        answers: HashMap<&'static str, Value>,
        panic_on: Option<&'static str>,
    }

    #[async_trait]
    impl Structurer for TableStructurer {
        async fn structure(
            &self,
            _instruction: &str,
            _raw_text: &str,
            schema: &SchemaDescriptor,
        ) -> Result<Value, StructuringError> {
            if self.panic_on == Some(schema.name) {
                panic!("structurer crashed");
            }
            self.answers
                .get(schema.name)
                .cloned()
                .ok_or_else(|| StructuringError::InvalidJson {
                    message: "no answer".to_string(),
                })
        }
    }

    struct SameQuery;

    #[async_trait]
    impl QueryRefiner for SameQuery {
        async fn refine(&self, previous_query: &str, _raw: &str) -> Result<String, AgentError> {
            Ok(previous_query.to_string())
        }
    }

    fn good_answers() -> HashMap<&'static str, Value> {
        HashMap::from([
            ("flights", serde_json::json!({"flights": [{"airline": "Air France", "price": 540}]})),
            ("hotels", serde_json::json!({"hotels": [{"name": "Hotel Lutetia", "location": "Saint-Germain"}]})),
            ("restaurants", serde_json::json!({"restaurants": [{"name": "Le Comptoir", "location": "Odéon"}]})),
            ("activities", serde_json::json!({"activities": [{"name": "Louvre", "location": "1st arr."}]})),
            ("events", serde_json::json!({"events": [{"name": "Jazz Night", "location": "Le Duc"}]})),
            ("transportation", serde_json::json!({"transportation": [{"type": "Metro", "origin": "Châtelet"}]})),
        ])
    }

    fn dispatcher(
        answers: HashMap<&'static str, Value>,
        panic_on: Option<&'static str>,
    ) -> Dispatcher {
        let extractor = Extractor::new(
            Arc::new(EchoSearch),
            Arc::new(TableStructurer { answers, panic_on }),
            Arc::new(SameQuery),
            Duration::from_secs(5),
        );
        Dispatcher::new(Arc::new(extractor), 6)
    }

    fn paris_state() -> TripState {
        let mut state = TripState::new();
        state.trip_request = Some(
            TripRequest::new("New York", "Paris", 2, "2025-06-01", "2025-06-08", 3000.0, None)
                .unwrap_or_else(|_| unreachable!()),
        );
        state.phase = Phase::Dispatching;
        state
    }

    #[tokio::test]
    async fn test_all_agents_succeed() {
        let report = dispatcher(good_answers(), None)
            .dispatch(&paris_state())
            .await
            .unwrap_or_default();
        assert!(report.failed_agents.is_empty());
        for category in Category::ALL {
            assert_eq!(report.bundle.count(category), 1, "{category}");
        }
    }

    #[tokio::test]
    async fn test_failures_are_a_union() {
        let mut answers = good_answers();
        answers.insert("flights", serde_json::json!({"flights": [{"airline": "Air France", "price": 0}]}));
        answers.remove("hotels");

        let report = dispatcher(answers, None)
            .dispatch(&paris_state())
            .await
            .unwrap_or_default();
        assert_eq!(report.failed_agents, vec!["FlightsAgent", "HotelsAgent"]);
        // Exhausted flights keep their weak records; hotels never structured.
        assert_eq!(report.bundle.flights.len(), 1);
        assert!(report.bundle.hotels.is_empty());
        assert_eq!(report.bundle.events.len(), 1);
    }

    #[tokio::test]
    async fn test_panicked_agent_counts_as_failed() {
        let report = dispatcher(good_answers(), Some("events"))
            .dispatch(&paris_state())
            .await
            .unwrap_or_default();
        assert_eq!(report.failed_agents, vec!["EventsAgent"]);
        assert!(report.bundle.events.is_empty());
        assert_eq!(report.bundle.flights.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_without_request_fails() {
        let result = dispatcher(good_answers(), None)
            .dispatch(&TripState::new())
            .await;
        assert!(matches!(result, Err(AgentError::Orchestration { .. })));
    }
}
