//! Trip planner research-orchestration core.
//!
//! Collects trip requirements over a conversation, fans research out to
//! six category agents (flights, hotels, restaurants, activities, events,
//! local transport), and synthesizes a budgeted itinerary that calls out
//! every section it could not research.
//!
//! # Modules
//!
//! - [`core`] - Trip requests, research records, and session state
//! - [`search`] - Web search capability consumed by the research agents
//! - [`agent`] - Extractor retry loop, research agents, dispatcher, synthesizer
//! - [`session`] - In-memory session store
//! - [`server`] - HTTP session transport (feature `server`)
//! - [`cli`] - Command-line interface
//! - [`error`] - Error types

pub mod agent;
pub mod cli;
pub mod core;
pub mod error;
pub mod search;
#[cfg(feature = "server")]
pub mod server;
pub mod session;

// Re-export commonly used types
pub use agent::{AgentConfig, Dispatcher, Extractor, PromptSet, ResearchAgent, TripPlanner};
pub use crate::core::{
    AgentOutcome, Category, FailureReason, Phase, ResearchBundle, TripRequest, TripState,
};
pub use error::{AgentError, CommandError, Result, SearchError, StructuringError};
pub use search::SearchProvider;
