//! Research bundle and per-agent outcomes.

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::records::{
    ActivityOption, CategoryRecords, EventOption, FlightOption, HotelOption, RestaurantOption,
    TransportationOption,
};

/// Why an agent run did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Every attempt produced a result but none passed the quality check.
    MaxRetriesExhausted,
    /// No attempt produced any structured result.
    AllAttemptsFailed,
    /// The agent task aborted before reporting.
    TaskAborted,
}

impl FailureReason {
    /// Human-readable reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MaxRetriesExhausted => "max retries exhausted",
            Self::AllAttemptsFailed => "all attempts failed completely",
            Self::TaskAborted => "agent task aborted",
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tagged result of one research agent run.
///
/// `records` holds the best-effort payload even when the run failed.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutcome<T> {
    /// Name of the agent that produced this outcome.
    pub agent_name: &'static str,
    /// Whether a result passed the quality check.
    pub succeeded: bool,
    /// Extracted records.
    pub records: T,
    /// Set when `succeeded` is false.
    pub failure_reason: Option<FailureReason>,
    /// Number of attempts made.
    pub attempts: usize,
}

impl<T> AgentOutcome<T> {
    /// Converts the payload while keeping the outcome metadata.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> AgentOutcome<U> {
        AgentOutcome {
            agent_name: self.agent_name,
            succeeded: self.succeeded,
            records: f(self.records),
            failure_reason: self.failure_reason,
            attempts: self.attempts,
        }
    }
}

/// All extracted research, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResearchBundle {
    /// Flight options.
    pub flights: Vec<FlightOption>,
    /// Hotel options.
    pub hotels: Vec<HotelOption>,
    /// Restaurant options.
    pub restaurants: Vec<RestaurantOption>,
    /// Activity options.
    pub activities: Vec<ActivityOption>,
    /// Event options.
    pub events: Vec<EventOption>,
    /// Local transportation options.
    pub transportation: Vec<TransportationOption>,
}

impl ResearchBundle {
    /// Stores one category's records, replacing what was there.
    pub fn insert(&mut self, records: CategoryRecords) {
        match records {
            CategoryRecords::Flights(v) => self.flights = v,
            CategoryRecords::Hotels(v) => self.hotels = v,
            CategoryRecords::Restaurants(v) => self.restaurants = v,
            CategoryRecords::Activities(v) => self.activities = v,
            CategoryRecords::Events(v) => self.events = v,
            CategoryRecords::Transportation(v) => self.transportation = v,
        }
    }

    /// Number of records for a category.
    #[must_use]
    pub const fn count(&self, category: Category) -> usize {
        match category {
            Category::Flights => self.flights.len(),
            Category::Hotels => self.hotels.len(),
            Category::Restaurants => self.restaurants.len(),
            Category::Activities => self.activities.len(),
            Category::Events => self.events.len(),
            Category::Transportation => self.transportation.len(),
        }
    }

    /// Whether a category has no records.
    #[must_use]
    pub const fn is_empty(&self, category: Category) -> bool {
        self.count(category) == 0
    }

    /// Pretty JSON for one category, or `No data` when empty.
    #[must_use]
    pub fn render_category(&self, category: Category) -> String {
        if self.is_empty(category) {
            return "No data".to_string();
        }
        let json = match category {
            Category::Flights => serde_json::to_string_pretty(&self.flights),
            Category::Hotels => serde_json::to_string_pretty(&self.hotels),
            Category::Restaurants => serde_json::to_string_pretty(&self.restaurants),
            Category::Activities => serde_json::to_string_pretty(&self.activities),
            Category::Events => serde_json::to_string_pretty(&self.events),
            Category::Transportation => serde_json::to_string_pretty(&self.transportation),
        };
        json.unwrap_or_else(|_| "No data".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str) -> EventOption {
        serde_json::from_value(serde_json::json!({ "name": name, "location": "Paris" }))
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_insert_replaces_category() {
        let mut bundle = ResearchBundle::default();
        bundle.insert(CategoryRecords::Events(vec![event("Fête de la Musique")]));
        assert_eq!(bundle.count(Category::Events), 1);
        bundle.insert(CategoryRecords::Events(Vec::new()));
        assert!(bundle.is_empty(Category::Events));
    }

    #[test]
    fn test_render_empty_category() {
        let bundle = ResearchBundle::default();
        assert_eq!(bundle.render_category(Category::Hotels), "No data");
    }

    #[test]
    fn test_serialized_keys() {
        let json = serde_json::to_value(ResearchBundle::default()).unwrap_or_default();
        for category in Category::ALL {
            assert!(json.get(category.key()).is_some(), "missing {category}");
        }
    }

    #[test]
    fn test_failure_reason_text() {
        assert_eq!(
            FailureReason::AllAttemptsFailed.to_string(),
            "all attempts failed completely"
        );
        assert_eq!(
            FailureReason::MaxRetriesExhausted.to_string(),
            "max retries exhausted"
        );
    }

    #[test]
    fn test_outcome_map() {
        let outcome = AgentOutcome {
            agent_name: "EventsAgent",
            succeeded: true,
            records: vec![event("Jazz Night")],
            failure_reason: None,
            attempts: 1,
        };
        let wrapped = outcome.map(CategoryRecords::Events);
        assert_eq!(wrapped.records.len(), 1);
        assert_eq!(wrapped.agent_name, "EventsAgent");
    }
}
