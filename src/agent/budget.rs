//! Per-person budget breakdown computed from research records.
//!
//! The breakdown never totals more than the traveler's budget: when the
//! estimate is higher, every line is scaled down by the same factor and
//! the breakdown is flagged as over budget.

use std::collections::BTreeMap;
use std::fmt::Write;

use serde::Serialize;

use crate::core::{ResearchBundle, TripRequest};

/// Restaurant meals per day.
const MEALS_PER_DAY: f64 = 2.0;
/// Local transport rides per day.
const RIDES_PER_DAY: f64 = 2.0;

/// One line of the breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetLine {
    /// Line key (e.g., `flights`).
    pub key: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Amount per person in USD.
    pub amount: f64,
}

/// Budget allocation per person.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetBreakdown {
    lines: Vec<BudgetLine>,
    buffer: f64,
    cap: f64,
    estimated: f64,
    over_budget: bool,
}

impl BudgetBreakdown {
    /// Estimates costs from the cheapest priced options in `bundle`.
    ///
    /// Categories without any priced record contribute nothing.
    #[must_use]
    pub fn estimate(request: &TripRequest, bundle: &ResearchBundle) -> Self {
        let days = f64::from(request.days());
        let nights = f64::from(request.nights());
        let people = f64::from(request.num_people());

        let flights = cheapest(bundle.flights.iter().map(|f| f.price));
        let accommodation = cheapest(bundle.hotels.iter().map(|h| h.price_per_night))
            .map(|nightly| nightly * nights / people);
        let dining = average(bundle.restaurants.iter().map(|r| r.price))
            .map(|meal| meal * MEALS_PER_DAY * days);
        let activities = {
            let mut prices: Vec<f64> = positive(bundle.activities.iter().map(|a| a.price)).collect();
            prices.sort_by(f64::total_cmp);
            let take = usize::try_from(request.days()).unwrap_or(usize::MAX);
            let sum: f64 = prices.into_iter().take(take).sum();
            (sum > 0.0).then_some(sum)
        };
        let events = cheapest(bundle.events.iter().map(|e| e.price));
        let transport = cheapest(bundle.transportation.iter().map(|t| t.price))
            .map(|fare| fare * RIDES_PER_DAY * days);

        let raw = [
            ("flights", "Flights", flights),
            ("accommodation", "Accommodation", accommodation),
            ("dining", "Dining", dining),
            ("activities", "Activities", activities),
            ("events", "Events", events),
            ("local_transport", "Local transport", transport),
        ];

        Self::fit(
            raw.into_iter()
                .filter_map(|(key, label, amount)| amount.map(|a| (key, label, a))),
            request.budget_per_person(),
        )
    }

    /// Fits estimated lines under `cap`.
    fn fit(lines: impl Iterator<Item = (&'static str, &'static str, f64)>, cap: f64) -> Self {
        let lines: Vec<(&'static str, &'static str, f64)> = lines.collect();
        let estimated: f64 = lines.iter().map(|(_, _, a)| a).sum();
        let over_budget = estimated > cap;
        let factor = if over_budget { cap / estimated } else { 1.0 };

        let lines: Vec<BudgetLine> = lines
            .into_iter()
            .map(|(key, label, amount)| BudgetLine {
                key,
                label,
                amount: floor_cents(amount * factor),
            })
            .collect();
        let spent: f64 = lines.iter().map(|l| l.amount).sum();
        let buffer = floor_cents((cap - spent).max(0.0));

        Self {
            lines,
            buffer,
            cap,
            estimated,
            over_budget,
        }
    }

    /// Allocated lines, excluding the buffer.
    #[must_use]
    pub fn lines(&self) -> &[BudgetLine] {
        &self.lines
    }

    /// Unallocated money left as a buffer.
    #[must_use]
    pub const fn buffer(&self) -> f64 {
        self.buffer
    }

    /// The per-person budget.
    #[must_use]
    pub const fn cap(&self) -> f64 {
        self.cap
    }

    /// Unscaled estimate.
    #[must_use]
    pub const fn estimated(&self) -> f64 {
        self.estimated
    }

    /// Whether the estimate exceeded the budget and lines were scaled.
    #[must_use]
    pub const fn over_budget(&self) -> bool {
        self.over_budget
    }

    /// Sum of all lines plus the buffer.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(|l| l.amount).sum::<f64>() + self.buffer
    }

    /// Lines keyed by name, buffer included.
    #[must_use]
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        let mut map: BTreeMap<String, f64> = self
            .lines
            .iter()
            .map(|l| (l.key.to_string(), l.amount))
            .collect();
        map.insert("buffer".to_string(), self.buffer);
        map
    }

    /// Markdown section appended to the plan.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::from("## Budget Breakdown (per person)\n\n");
        for line in &self.lines {
            let _ = writeln!(out, "- {}: ${:.2}", line.label, line.amount);
        }
        let _ = writeln!(out, "- Buffer: ${:.2}", self.buffer);
        if self.over_budget {
            let _ = writeln!(
                out,
                "\nEstimated costs (${:.2}) exceed the budget; amounts are scaled to fit.",
                self.estimated
            );
        }
        let _ = write!(out, "\nTotal: ${:.2} of ${:.2}", self.total(), self.cap);
        out
    }
}

fn floor_cents(amount: f64) -> f64 {
    (amount * 100.0).floor() / 100.0
}

fn positive(prices: impl Iterator<Item = f64>) -> impl Iterator<Item = f64> {
    prices.filter(|p| p.is_finite() && *p > 0.0)
}

fn cheapest(prices: impl Iterator<Item = f64>) -> Option<f64> {
    positive(prices).min_by(f64::total_cmp)
}

fn average(prices: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = positive(prices).fold((0.0, 0_u32), |(s, n), p| (s + p, n + 1));
    (count > 0).then(|| sum / f64::from(count))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FlightOption, HotelOption, RestaurantOption};
    use proptest::prelude::*;

    fn request(budget: f64) -> TripRequest {
        TripRequest::new("New York", "Paris", 2, "2025-06-01", "2025-06-08", budget, None)
            .unwrap_or_else(|_| unreachable!())
    }

    fn bundle(flight: f64, nightly: f64, meal: f64) -> ResearchBundle {
        let flight: FlightOption =
            serde_json::from_value(serde_json::json!({"airline": "Air France", "price": flight}))
                .unwrap_or_else(|_| unreachable!());
        let hotel: HotelOption = serde_json::from_value(
            serde_json::json!({"name": "Hotel Lutetia", "price_per_night": nightly}),
        )
        .unwrap_or_else(|_| unreachable!());
        let restaurant: RestaurantOption =
            serde_json::from_value(serde_json::json!({"name": "Le Comptoir", "price": meal}))
                .unwrap_or_else(|_| unreachable!());
        ResearchBundle {
            flights: vec![flight],
            hotels: vec![hotel],
            restaurants: vec![restaurant],
            ..ResearchBundle::default()
        }
    }

    #[test]
    fn test_within_budget() {
        // 7 nights at $200 split by 2 = $700; 8 days x 2 meals x $30 = $480.
        let breakdown = BudgetBreakdown::estimate(&request(3000.0), &bundle(540.0, 200.0, 30.0));
        assert!(!breakdown.over_budget());
        let map = breakdown.to_map();
        assert!((map["flights"] - 540.0).abs() < 1e-9);
        assert!((map["accommodation"] - 700.0).abs() < 1e-9);
        assert!((map["dining"] - 480.0).abs() < 1e-9);
        assert!((map["buffer"] - 1280.0).abs() < 1e-9);
        assert!((breakdown.total() - 3000.0).abs() < 1e-9);
    }

    #[test]
    fn test_over_budget_scales_down() {
        let breakdown = BudgetBreakdown::estimate(&request(1000.0), &bundle(900.0, 400.0, 50.0));
        assert!(breakdown.over_budget());
        assert!(breakdown.estimated() > 1000.0);
        assert!(breakdown.total() <= 1000.0 + 1e-9);
        assert!(breakdown.render().contains("exceed the budget"));
    }

    #[test]
    fn test_empty_research_is_all_buffer() {
        let breakdown = BudgetBreakdown::estimate(&request(1500.0), &ResearchBundle::default());
        assert!(breakdown.lines().is_empty());
        assert!((breakdown.buffer() - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_render_total_line() {
        let breakdown = BudgetBreakdown::estimate(&request(3000.0), &bundle(540.0, 200.0, 30.0));
        let text = breakdown.render();
        assert!(text.starts_with("## Budget Breakdown (per person)"));
        assert!(text.contains("- Flights: $540.00"));
        assert!(text.ends_with("Total: $3000.00 of $3000.00"));
    }

    proptest! {
        #[test]
        fn prop_total_never_exceeds_budget(
            budget in 1.0f64..20_000.0,
            flight in 0.0f64..10_000.0,
            nightly in 0.0f64..5_000.0,
            meal in 0.0f64..500.0,
        ) {
            let breakdown = BudgetBreakdown::estimate(&request(budget), &bundle(flight, nightly, meal));
            prop_assert!(breakdown.total() <= budget + 1e-6);
            prop_assert!(breakdown.buffer() >= 0.0);
            prop_assert!(breakdown.lines().iter().all(|l| l.amount >= 0.0));
        }
    }
}
