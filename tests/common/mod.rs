//! Deterministic stand-ins for the search, structuring, refinement, and
//! language-model capabilities.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use trip_planner::agent::message::{ChatRequest, ChatResponse, TokenUsage};
use trip_planner::agent::refiner::QueryRefiner;
use trip_planner::agent::structurer::{SchemaDescriptor, Structurer};
use trip_planner::agent::synthesizer::SynthesizerAgent;
use trip_planner::agent::{AgentConfig, Dispatcher, Extractor, LlmProvider, Synthesizer};
use trip_planner::error::{AgentError, SearchError, StructuringError};
use trip_planner::{SearchProvider, TripRequest};

/// The NYC → Paris request used throughout.
pub fn paris_request() -> TripRequest {
    TripRequest::new("NYC", "Paris", 2, "2025-06-01", "2025-06-08", 2000.0, None)
        .unwrap_or_else(|_| unreachable!())
}

/// Returns canned text for every query except those starting with
/// `empty_prefix`, and records every query it sees.
pub struct CannedSearch {
    empty_prefix: Option<&'static str>,
    queries: Mutex<Vec<String>>,
}

impl CannedSearch {
    pub fn new(empty_prefix: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            empty_prefix,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn count_starting_with(&self, prefix: &str) -> usize {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|q| q.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl SearchProvider for CannedSearch {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn search(&self, query: &str) -> Result<String, SearchError> {
        self.queries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());
        if self.empty_prefix.is_some_and(|p| query.starts_with(p)) {
            return Ok(String::new());
        }
        Ok(format!(
            "1. Paris travel guide\n   URL: https://example.com\n   Results for: {query}"
        ))
    }
}

/// Answers structuring calls by schema name.
pub struct TableStructurer {
    answers: HashMap<&'static str, Value>,
}

impl TableStructurer {
    pub fn new(answers: HashMap<&'static str, Value>) -> Arc<Self> {
        Arc::new(Self { answers })
    }
}

#[async_trait]
impl Structurer for TableStructurer {
    async fn structure(
        &self,
        _instruction: &str,
        _raw_text: &str,
        schema: &SchemaDescriptor,
    ) -> Result<Value, StructuringError> {
        self.answers
            .get(schema.name)
            .cloned()
            .ok_or_else(|| StructuringError::InvalidJson {
                message: format!("no canned answer for {}", schema.name),
            })
    }
}

/// Good records for all six categories.
pub fn paris_answers() -> HashMap<&'static str, Value> {
    HashMap::from([
        (
            "flights",
            json!({"flights": [
                {"airline": "Air France", "price": 640, "origin": "JFK", "destination": "CDG"},
                {"airline": "Delta", "price": 710, "origin": "JFK", "destination": "CDG"}
            ]}),
        ),
        (
            "hotels",
            json!({"hotels": [
                {"name": "Hotel Jeanne d'Arc", "location": "Le Marais", "price_per_night": 150}
            ]}),
        ),
        (
            "restaurants",
            json!({"restaurants": [
                {"name": "Le Comptoir du Relais", "location": "Odeon", "price": 45}
            ]}),
        ),
        (
            "activities",
            json!({"activities": [
                {"name": "Louvre Museum", "location": "1st arrondissement", "price": 22}
            ]}),
        ),
        (
            "events",
            json!({"events": [
                {"name": "Jazz at Le Duc des Lombards", "location": "Chatelet", "price": 35}
            ]}),
        ),
        (
            "transportation",
            json!({"transportation": [
                {"type": "Metro", "origin": "Chatelet", "price": 2.15}
            ]}),
        ),
    ])
}

/// Keeps the query unchanged.
pub struct SameQuery;

#[async_trait]
impl QueryRefiner for SameQuery {
    async fn refine(&self, previous_query: &str, _raw: &str) -> Result<String, AgentError> {
        Ok(previous_query.to_string())
    }
}

/// Replies from a queue; once empty, repeats `fallback`.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str], fallback: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(ToString::to_string).collect()),
            fallback: fallback.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        if let Some(last) = request.messages.last() {
            self.prompts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(last.content.clone());
        }
        let content = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(ChatResponse {
            content,
            usage: TokenUsage::default(),
            finish_reason: Some("stop".to_string()),
        })
    }
}

pub fn config() -> AgentConfig {
    AgentConfig::builder()
        .api_key("test")
        .build()
        .unwrap_or_else(|_| unreachable!())
}

pub fn dispatcher(search: Arc<CannedSearch>, answers: HashMap<&'static str, Value>) -> Dispatcher {
    let extractor = Extractor::new(
        search,
        TableStructurer::new(answers),
        Arc::new(SameQuery),
        Duration::from_secs(5),
    );
    Dispatcher::new(Arc::new(extractor), 6)
}

pub fn synthesizer(provider: Arc<ScriptedProvider>) -> Synthesizer {
    Synthesizer::new(
        provider,
        SynthesizerAgent::new(&config(), "plan".to_string()),
        Duration::from_secs(5),
    )
}
