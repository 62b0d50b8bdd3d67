//! End-to-end research pipeline scenarios with stubbed capabilities.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{
    CannedSearch, SameQuery, ScriptedProvider, TableStructurer, config, dispatcher,
    paris_answers, paris_request, synthesizer,
};
use trip_planner::agent::collector::{CollectorAgent, DetailsAgent, LlmCollector};
use trip_planner::agent::{Extractor, MAX_RETRIES, TripPlanner};
use trip_planner::core::CategoryRecords;
use trip_planner::{Category, FailureReason, Phase, ResearchAgent, TripState};

const EVENTS_QUERY_PREFIX: &str = "Find events and entertainment";

#[tokio::test]
async fn nyc_to_paris_researches_every_category() {
    let search = CannedSearch::new(None);
    let report = dispatcher(Arc::clone(&search), paris_answers())
        .dispatch_request(&paris_request())
        .await;

    assert!(report.failed_agents.is_empty());
    for category in Category::ALL {
        assert!(!report.bundle.is_empty(category), "{category} is empty");
    }
    // One search per agent when every first attempt is good.
    assert_eq!(search.count_starting_with("Find"), 6);

    let provider = ScriptedProvider::new(&[], "# Your week in Paris\n\nCroissants daily.");
    let plan = synthesizer(provider)
        .synthesize(&paris_request(), &report.bundle, &report.failed_agents)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(plan.text.contains("Paris"));
    assert!(!plan.text.contains("could not be researched"));
    assert!(plan.budget.total() <= 2000.0 + 1e-6);
    assert!(plan.budget.to_map().contains_key("flights"));
}

#[tokio::test]
async fn empty_events_search_exhausts_after_three_attempts() {
    let search = CannedSearch::new(Some(EVENTS_QUERY_PREFIX));
    let extractor = Extractor::new(
        Arc::clone(&search) as Arc<dyn trip_planner::SearchProvider>,
        TableStructurer::new(paris_answers()),
        Arc::new(SameQuery),
        Duration::from_secs(5),
    );

    let outcome = ResearchAgent::new(Category::Events)
        .run(&extractor, &paris_request())
        .await;

    assert!(!outcome.succeeded);
    assert_eq!(outcome.agent_name, "EventsAgent");
    assert_eq!(outcome.records, CategoryRecords::empty(Category::Events));
    assert_eq!(outcome.failure_reason, Some(FailureReason::AllAttemptsFailed));
    assert_eq!(
        outcome.failure_reason.map(FailureReason::as_str),
        Some("all attempts failed completely")
    );
    assert_eq!(search.count_starting_with(EVENTS_QUERY_PREFIX), MAX_RETRIES);
}

#[tokio::test]
async fn failed_events_are_acknowledged_in_the_plan() {
    let search = CannedSearch::new(Some(EVENTS_QUERY_PREFIX));
    let report = dispatcher(search, paris_answers())
        .dispatch_request(&paris_request())
        .await;
    assert_eq!(report.failed_agents, vec!["EventsAgent"]);
    assert!(report.bundle.events.is_empty());
    assert_eq!(report.bundle.count(Category::Flights), 2);

    let provider = ScriptedProvider::new(&[], "# Paris\n\nMuseums and bistros all week.");
    let plan = synthesizer(Arc::clone(&provider))
        .synthesize(&paris_request(), &report.bundle, &report.failed_agents)
        .await
        .unwrap_or_else(|_| unreachable!());

    assert!(plan.text.contains("Events & Entertainment: this section could not be researched"));
    assert!(!plan.text.contains("Jazz at Le Duc des Lombards"));
    let prompts = provider.prompts();
    assert!(prompts[0].contains("EVENTS:\nNo data"));
}

#[tokio::test]
async fn weak_flights_and_missing_hotels_are_both_reported() {
    let mut answers = paris_answers();
    answers.insert(
        "flights",
        serde_json::json!({"flights": [{"airline": "Air France", "price": 0}]}),
    );
    answers.remove("hotels");

    let search = CannedSearch::new(None);
    let report = dispatcher(Arc::clone(&search), answers)
        .dispatch_request(&paris_request())
        .await;

    assert_eq!(report.failed_agents, vec!["FlightsAgent", "HotelsAgent"]);
    // Weak flights survive as best effort; hotels never structured.
    assert_eq!(report.bundle.flights.len(), 1);
    assert!(report.bundle.hotels.is_empty());
    assert_eq!(
        search.count_starting_with("Find flights"),
        MAX_RETRIES,
        "weak results are retried"
    );
}

#[tokio::test]
async fn conversation_to_plan() {
    let collector_provider = ScriptedProvider::new(
        &[
            r#"{"origin": "NYC", "destination": "Paris", "num_people": null}"#,
            "Lovely! How many travelers, which dates, and what budget?",
            r#"{"origin": "NYC", "destination": "Paris", "num_people": 2,
                "start_date": "2025-06-01", "end_date": "2025-06-08", "budget_per_person": 2000}"#,
            "Perfect, researching your Paris trip now.",
        ],
        "",
    );
    let cfg = config();
    let collector = LlmCollector::new(
        collector_provider,
        DetailsAgent::new(&cfg, "extract".to_string()),
        CollectorAgent::new(&cfg, "chat".to_string()),
        Duration::from_secs(5),
    );
    let planner = TripPlanner::new(
        Arc::new(collector),
        dispatcher(CannedSearch::new(None), paris_answers()),
        synthesizer(ScriptedProvider::new(&[], "# Paris for two")),
    );

    let mut state = TripState::new();
    let first = planner
        .advance(&mut state, "I want to fly from NYC to Paris")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(!first.done);
    assert_eq!(state.phase, Phase::Collecting);
    assert!(state.missing_fields.contains(&"num_people".to_string()));

    let second = planner
        .advance(&mut state, "2 people, June 1 to 8, $2000 each")
        .await
        .unwrap_or_else(|_| unreachable!());
    assert!(second.done);
    assert_eq!(state.phase, Phase::Done);
    assert!(state.failed_agents.is_empty());
    assert!(second.final_plan.unwrap_or_default().starts_with("# Paris for two"));
    assert!(state.budget_breakdown.values().sum::<f64>() <= 2000.0 + 1e-6);
}
