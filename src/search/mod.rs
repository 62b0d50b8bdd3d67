//! Web search capability consumed by the research agents.
//!
//! A [`SearchProvider`] turns a query into raw, unstructured result text.
//! Failures are tagged with [`SearchError`] so callers never have to
//! sniff error strings out of the result text.

mod web;

use async_trait::async_trait;

pub use web::{SearchBackend, WebSearchProvider};

use crate::error::SearchError;

/// Trait for web search backends.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Backend name for logging (e.g., `"tavily"`).
    fn name(&self) -> &'static str;

    /// Runs a search and returns the raw result text.
    ///
    /// An empty string means the backend found nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, API, or timeout failures.
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}
