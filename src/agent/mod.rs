//! Research agents and the planning graph.
//!
//! Provides the LLM-backed roles of the trip planner and the
//! orchestration that ties them together. Uses a pluggable provider
//! abstraction backed by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! User message → TripPlanner
//!   ├── CollectionLoop (slot-filling until the request is complete)
//!   ├── Dispatcher → 6 concurrent ResearchAgents
//!   │   └── Extractor: search → structure → quality check → refine (≤ 3 attempts)
//!   ├── Merge records into a ResearchBundle, union the failed agents
//!   └── Synthesizer → markdown plan + budget breakdown
//! ```

pub mod budget;
pub mod client;
pub mod collector;
pub mod config;
pub mod dispatcher;
pub mod extractor;
pub mod message;
pub mod planner;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod refiner;
pub mod research;
pub mod structurer;
pub mod synthesizer;
pub mod traits;

// Re-export key types
pub use budget::{BudgetBreakdown, BudgetLine};
pub use collector::{CollectionLoop, CollectionOutcome, LlmCollector};
pub use config::AgentConfig;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use extractor::{Extractor, MAX_RETRIES};
pub use message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
pub use planner::{TripPlanner, TurnReply};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use refiner::{LlmQueryRefiner, QueryRefiner};
pub use research::{CategorySpec, QualityRule, ResearchAgent};
pub use structurer::{LlmStructurer, MAX_RECORDS_PER_CATEGORY, SchemaDescriptor, Structurer};
pub use synthesizer::{SynthesizedPlan, Synthesizer};
pub use traits::Agent;
