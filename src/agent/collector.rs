//! Conversational collection of trip requirements.
//!
//! Each turn runs two model calls: one pulls structured details out of
//! the whole conversation, the other writes the reply (a question for
//! missing fields, or a confirmation once the request is complete).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::config::AgentConfig;
use super::message::{ChatMessage, assistant_message, system_message, user_message};
use super::prompt::{build_confirmation_prompt, build_missing_fields_prompt};
use super::provider::LlmProvider;
use super::structurer::strip_code_fences;
use super::traits::Agent;
use crate::core::{Phase, Speaker, TripDetails, TripRequest, TripState};
use crate::error::AgentError;

/// Result of one collection turn.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionOutcome {
    /// Validated request, when every required field is known and valid.
    pub trip_request: Option<TripRequest>,
    /// Required fields still unknown or invalid.
    pub missing_fields: Vec<String>,
    /// [`Phase::Dispatching`] once the request is complete, otherwise
    /// [`Phase::Collecting`].
    pub next_phase: Phase,
    /// Reply to show the user.
    pub reply: String,
}

/// Turns conversation turns into a trip request or a list of missing fields.
#[async_trait]
pub trait CollectionLoop: Send + Sync {
    /// Advances collection with `new_message`.
    ///
    /// `state.messages` holds the conversation before `new_message`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when a model call fails.
    async fn advance(
        &self,
        state: &TripState,
        new_message: &str,
    ) -> Result<CollectionOutcome, AgentError>;
}

/// Agent that extracts trip details as JSON.
pub struct DetailsAgent {
    model: String,
    system_prompt: String,
}

impl DetailsAgent {
    /// Creates a details agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.collector_model.clone(),
            system_prompt,
        }
    }
}

#[async_trait]
impl Agent for DetailsAgent {
    fn name(&self) -> &'static str {
        "collector_extraction"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn json_mode(&self) -> bool {
        true
    }

    fn max_tokens(&self) -> u32 {
        512
    }
}

/// Agent that talks to the traveler.
pub struct CollectorAgent {
    model: String,
    system_prompt: String,
}

impl CollectorAgent {
    /// Creates a collector agent with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.collector_model.clone(),
            system_prompt,
        }
    }
}

#[async_trait]
impl Agent for CollectorAgent {
    fn name(&self) -> &'static str {
        "collector"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        0.7
    }

    fn max_tokens(&self) -> u32 {
        512
    }
}

/// [`CollectionLoop`] backed by a language model.
pub struct LlmCollector {
    provider: Arc<dyn LlmProvider>,
    details: DetailsAgent,
    collector: CollectorAgent,
    timeout: Duration,
}

impl LlmCollector {
    /// Creates a collector over the given provider.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        details: DetailsAgent,
        collector: CollectorAgent,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            details,
            collector,
            timeout,
        }
    }

    async fn call<F, T>(&self, operation: &'static str, fut: F) -> Result<T, AgentError>
    where
        F: Future<Output = Result<T, AgentError>> + Send,
    {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| AgentError::Timeout {
                operation,
                after: self.timeout,
            })?
    }
}

impl std::fmt::Debug for LlmCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmCollector")
            .field("provider", &self.provider.name())
            .field("model", &self.collector.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl CollectionLoop for LlmCollector {
    async fn advance(
        &self,
        state: &TripState,
        new_message: &str,
    ) -> Result<CollectionOutcome, AgentError> {
        let mut history = conversation(state);
        history.push(user_message(new_message));

        let extracted = self
            .call(
                "trip detail extraction",
                self.details.execute_messages(&*self.provider, history.clone()),
            )
            .await?;
        let details = parse_details(&extracted.content);

        let (trip_request, missing_fields, problem) = validate(details);
        debug!(
            missing = ?missing_fields,
            complete = trip_request.is_some(),
            "collection turn"
        );

        let instruction = match (&trip_request, problem) {
            (Some(request), _) => build_confirmation_prompt(request),
            (None, Some(problem)) => format!(
                "{} The value given is not usable: {problem}.",
                build_missing_fields_prompt(&missing_fields)
            ),
            (None, None) => build_missing_fields_prompt(&missing_fields),
        };
        history.push(system_message(&instruction));

        let reply = self
            .call(
                "collection reply",
                self.collector.execute_messages(&*self.provider, history),
            )
            .await?;

        let next_phase = if trip_request.is_some() {
            Phase::Dispatching
        } else {
            Phase::Collecting
        };
        Ok(CollectionOutcome {
            trip_request,
            missing_fields,
            next_phase,
            reply: reply.content.trim().to_string(),
        })
    }
}

fn conversation(state: &TripState) -> Vec<ChatMessage> {
    state
        .messages
        .iter()
        .map(|turn| match turn.speaker {
            Speaker::User => user_message(&turn.content),
            Speaker::Assistant => assistant_message(&turn.content),
        })
        .collect()
}

/// Splits details into a request or the fields still needed.
///
/// The third element describes why a present field was rejected.
fn validate(details: TripDetails) -> (Option<TripRequest>, Vec<String>, Option<String>) {
    let missing = details.missing_fields();
    if !missing.is_empty() {
        return (None, missing.into_iter().map(String::from).collect(), None);
    }
    match TripRequest::try_from(details) {
        Ok(request) => (Some(request), Vec::new(), None),
        Err(e) => (None, vec![e.field().to_string()], Some(e.to_string())),
    }
}

/// Parses the details agent output.
///
/// Output that is not a JSON object extracts nothing, so every field is
/// reported missing and the conversation carries on.
pub fn parse_details(content: &str) -> TripDetails {
    let obj = match serde_json::from_str::<Value>(strip_code_fences(content)) {
        Ok(Value::Object(obj)) => obj,
        Ok(_) => {
            debug!("trip details are not a JSON object, nothing extracted");
            return TripDetails::default();
        }
        Err(e) => {
            debug!(error = %e, "trip details are not valid JSON, nothing extracted");
            return TripDetails::default();
        }
    };

    let text = |key: &str| -> Option<String> {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
            .map(String::from)
    };

    TripDetails {
        origin: text("origin"),
        destination: text("destination"),
        num_people: obj.get("num_people").and_then(lenient_count),
        start_date: text("start_date"),
        end_date: text("end_date"),
        budget_per_person: obj.get("budget_per_person").and_then(lenient_amount),
        interests: text("interests"),
    }
}

/// Accepts `2`, `2.0`, or `"2"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_count(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Accepts `2000`, `"2000"`, or `"$2,000"`.
fn lenient_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s
            .trim()
            .trim_start_matches('$')
            .replace(',', "")
            .trim()
            .parse()
            .ok(),
        _ => None,
    }
}
