//! Error types for the trip planner.
//!
//! Each boundary gets its own enum: search backends report
//! [`SearchError`], the structuring capability reports
//! [`StructuringError`], request validation reports [`TripRequestError`],
//! and everything that can fail a whole turn surfaces as [`AgentError`].

use std::time::Duration;

use thiserror::Error;

/// Errors from language-model providers, configuration, and the
/// collect → dispatch → synthesize graph.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured for the language-model provider.
    #[error("no API key configured (set OPENAI_API_KEY or TRIP_API_KEY)")]
    ApiKeyMissing,

    /// The configured provider name is not known.
    #[error("unsupported LLM provider: {name}")]
    UnsupportedProvider {
        /// Provider name from configuration.
        name: String,
    },

    /// The provider API call failed.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Error message from the provider SDK.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// A model response could not be parsed into the expected shape.
    #[error("failed to parse model response: {message}")]
    ResponseParse {
        /// What went wrong.
        message: String,
        /// The raw response content.
        content: String,
    },

    /// A model call exceeded its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Operation that timed out.
        operation: &'static str,
        /// Configured deadline.
        after: Duration,
    },

    /// The orchestration graph failed.
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Failure description.
        message: String,
    },
}

/// Tagged failure of a [`SearchProvider`](crate::search::SearchProvider) call.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No search backend is configured.
    #[error("no search backend configured (set TAVILY_API_KEY or BRAVE_API_KEY)")]
    NotConfigured,

    /// Unknown backend name.
    #[error("unknown search backend: {name}")]
    UnknownBackend {
        /// Backend name from configuration.
        name: String,
    },

    /// Transport-level failure.
    #[error("search request failed: {message}")]
    Request {
        /// Error message.
        message: String,
    },

    /// The backend answered with a non-success status.
    #[error("search API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body.
        message: String,
    },

    /// The search exceeded its deadline.
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
}

/// Tagged failure of the structuring capability.
#[derive(Debug, Error)]
pub enum StructuringError {
    /// The language model call itself failed.
    #[error("structuring call failed: {0}")]
    Provider(#[from] AgentError),

    /// The model did not return JSON.
    #[error("model output is not valid JSON: {message}")]
    InvalidJson {
        /// Parser message.
        message: String,
    },

    /// The JSON did not match the requested schema.
    #[error("output does not match schema {schema}: {message}")]
    SchemaMismatch {
        /// Schema name.
        schema: String,
        /// Deserialization message.
        message: String,
    },

    /// The call exceeded its deadline.
    #[error("structuring timed out after {0:?}")]
    Timeout(Duration),
}

/// Validation failures when constructing a [`TripRequest`](crate::core::TripRequest).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TripRequestError {
    /// A required field is empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Group size must be positive.
    #[error("num_people must be greater than zero")]
    InvalidGroupSize,

    /// Budget must be positive and finite.
    #[error("budget_per_person must be a positive amount")]
    InvalidBudget,

    /// A date is not `YYYY-MM-DD`.
    #[error("{field} is not a valid YYYY-MM-DD date: {value}")]
    InvalidDate {
        /// Field name.
        field: &'static str,
        /// Offending value.
        value: String,
    },

    /// End date precedes start date.
    #[error("end_date {end} is before start_date {start}")]
    EndBeforeStart {
        /// Start date.
        start: String,
        /// End date.
        end: String,
    },
}

impl TripRequestError {
    /// Name of the request field this error is about.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField(field) | Self::InvalidDate { field, .. } => field,
            Self::InvalidGroupSize => "num_people",
            Self::InvalidBudget => "budget_per_person",
            Self::EndBeforeStart { .. } => "end_date",
        }
    }
}

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid trip parameters.
    #[error("invalid trip request: {0}")]
    InvalidRequest(#[from] TripRequestError),

    /// Agent pipeline failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Search backend failure at setup time.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Output serialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

/// Result alias for CLI commands.
pub type Result<T, E = CommandError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_request_error_field() {
        assert_eq!(TripRequestError::MissingField("origin").field(), "origin");
        assert_eq!(TripRequestError::InvalidGroupSize.field(), "num_people");
        assert_eq!(TripRequestError::InvalidBudget.field(), "budget_per_person");
        let err = TripRequestError::EndBeforeStart {
            start: "2025-06-08".to_string(),
            end: "2025-06-01".to_string(),
        };
        assert_eq!(err.field(), "end_date");
    }

    #[test]
    fn test_structuring_error_from_agent_error() {
        let err: StructuringError = AgentError::ApiKeyMissing.into();
        assert!(matches!(err, StructuringError::Provider(_)));
        assert!(err.to_string().contains("no API key"));
    }

    #[test]
    fn test_search_error_display() {
        let err = SearchError::Api {
            status: 503,
            message: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "search API error 503: unavailable");
    }
}
