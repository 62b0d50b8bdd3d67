//! Search → structure → validate retry loop.
//!
//! [`Extractor::extract`] is the one place weak and failed attempts are
//! absorbed: every outcome, good or bad, comes back as an
//! [`AgentOutcome`] and no error escapes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::refiner::QueryRefiner;
use super::structurer::{SchemaDescriptor, Structurer, decode_records};
use crate::core::{AgentOutcome, FailureReason, ResearchRecord};
use crate::error::{AgentError, SearchError, StructuringError};
use crate::search::SearchProvider;

/// Attempts per extraction.
pub const MAX_RETRIES: usize = 3;

/// Drives the bounded retry loop for one research query.
///
/// Holds only shared, immutable collaborators, so one extractor serves
/// every agent concurrently.
pub struct Extractor {
    search: Arc<dyn SearchProvider>,
    structurer: Arc<dyn Structurer>,
    refiner: Arc<dyn QueryRefiner>,
    call_timeout: Duration,
}

impl Extractor {
    /// Creates an extractor with a per-call deadline.
    #[must_use]
    pub fn new(
        search: Arc<dyn SearchProvider>,
        structurer: Arc<dyn Structurer>,
        refiner: Arc<dyn QueryRefiner>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            search,
            structurer,
            refiner,
            call_timeout,
        }
    }

    /// Runs up to [`MAX_RETRIES`] attempts and reports the outcome.
    ///
    /// The first attempt whose records satisfy `quality` wins. Otherwise
    /// the last structured result (even an empty one) is returned as a
    /// failed outcome, or no records when nothing was ever structured.
    pub async fn extract<T, Q>(
        &self,
        query: &str,
        instruction: &str,
        schema: &SchemaDescriptor,
        quality: Q,
        agent_name: &'static str,
    ) -> AgentOutcome<Vec<T>>
    where
        T: ResearchRecord,
        Q: Fn(&[T]) -> bool + Send + Sync,
    {
        let mut current_query = query.trim().to_string();
        let mut best: Option<Vec<T>> = None;

        for attempt in 1..=MAX_RETRIES {
            let raw = match self.search_text(&current_query).await {
                Ok(text) if !text.trim().is_empty() => Some(text),
                Ok(_) => {
                    debug!(agent = agent_name, attempt, "search returned no text");
                    None
                }
                Err(e) => {
                    warn!(agent = agent_name, attempt, error = %e, "search failed");
                    None
                }
            };

            if let Some(ref raw_text) = raw {
                match self.structure::<T>(instruction, raw_text, schema).await {
                    Ok(records) if quality(&records) => {
                        info!(
                            agent = agent_name,
                            attempt,
                            records = records.len(),
                            "extraction succeeded"
                        );
                        return AgentOutcome {
                            agent_name,
                            succeeded: true,
                            records,
                            failure_reason: None,
                            attempts: attempt,
                        };
                    }
                    Ok(records) => {
                        debug!(
                            agent = agent_name,
                            attempt,
                            records = records.len(),
                            "weak result"
                        );
                        best = Some(records);
                    }
                    Err(e) => {
                        warn!(agent = agent_name, attempt, error = %e, "structuring failed");
                    }
                }
            }

            if attempt < MAX_RETRIES {
                current_query = self
                    .refine(&current_query, raw.as_deref().unwrap_or(""), agent_name)
                    .await;
            }
        }

        let (records, reason) = match best {
            Some(records) => (records, FailureReason::MaxRetriesExhausted),
            None => (Vec::new(), FailureReason::AllAttemptsFailed),
        };
        warn!(
            agent = agent_name,
            reason = %reason,
            records = records.len(),
            "extraction did not succeed"
        );

        AgentOutcome {
            agent_name,
            succeeded: false,
            records,
            failure_reason: Some(reason),
            attempts: MAX_RETRIES,
        }
    }

    async fn search_text(&self, query: &str) -> Result<String, SearchError> {
        with_deadline(self.call_timeout, self.search.search(query))
            .await
            .unwrap_or(Err(SearchError::Timeout(self.call_timeout)))
    }

    async fn structure<T: ResearchRecord>(
        &self,
        instruction: &str,
        raw_text: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Vec<T>, StructuringError> {
        let value = with_deadline(
            self.call_timeout,
            self.structurer.structure(instruction, raw_text, schema),
        )
        .await
        .unwrap_or(Err(StructuringError::Timeout(self.call_timeout)))?;
        decode_records(value, schema)
    }

    /// Returns the refined query, or the current one when refinement fails.
    async fn refine(&self, current_query: &str, raw_text: &str, agent_name: &str) -> String {
        let refined = with_deadline(
            self.call_timeout,
            self.refiner.refine(current_query, raw_text),
        )
        .await
        .unwrap_or(Err(AgentError::Timeout {
            operation: "query refinement",
            after: self.call_timeout,
        }));

        match refined {
            Ok(query) => {
                debug!(agent = agent_name, query = %query, "refined query");
                query
            }
            Err(e) => {
                warn!(agent = agent_name, error = %e, "refinement failed, keeping query");
                current_query.to_string()
            }
        }
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("search", &self.search.name())
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

/// `None` when `fut` does not finish within `deadline`.
async fn with_deadline<F: Future>(deadline: Duration, fut: F) -> Option<F::Output> {
    tokio::time::timeout(deadline, fut).await.ok()
}
