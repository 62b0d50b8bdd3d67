//! Session state for one trip-planning conversation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::bundle::ResearchBundle;
use super::trip::TripRequest;

/// Where a session is in the collect → dispatch → synthesize graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Gathering trip requirements from the user.
    #[default]
    Collecting,
    /// Requirements complete; research agents are due.
    Dispatching,
    /// Research complete; the final plan is due.
    Synthesizing,
    /// Final plan delivered. The state is read-only from here on.
    Done,
}

impl Phase {
    /// String form used in logs and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Collecting => "collecting",
            Self::Dispatching => "dispatching",
            Self::Synthesizing => "synthesizing",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who said a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    /// The traveler.
    User,
    /// The planner.
    Assistant,
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Author.
    pub speaker: Speaker,
    /// Message text.
    pub content: String,
}

/// The long-lived aggregate for one planning session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TripState {
    /// Conversation so far.
    pub messages: Vec<Turn>,
    /// Validated request, once collection is complete.
    pub trip_request: Option<TripRequest>,
    /// Research results.
    pub research: ResearchBundle,
    /// Required fields still unknown.
    pub missing_fields: Vec<String>,
    /// Agents whose research did not succeed.
    pub failed_agents: Vec<String>,
    /// Current phase.
    pub phase: Phase,
    /// Narrative plan, once synthesized.
    pub final_plan: Option<String>,
    /// Per-person budget lines in USD.
    pub budget_breakdown: BTreeMap<String, f64>,
}

impl TripState {
    /// Creates an empty session state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the session has delivered its plan.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }

    /// Appends a user message.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Turn {
            speaker: Speaker::User,
            content: content.into(),
        });
    }

    /// Appends an assistant message.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Turn {
            speaker: Speaker::Assistant,
            content: content.into(),
        });
    }

    /// Most recent assistant message.
    #[must_use]
    pub fn last_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|t| t.speaker == Speaker::Assistant)
            .map(|t| t.content.as_str())
    }
}
