//! Research categories.

use serde::{Deserialize, Serialize};

/// One of the six research categories, each served by its own agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Flights between origin and destination.
    Flights,
    /// Accommodation at the destination.
    Hotels,
    /// Dining options.
    Restaurants,
    /// Activities, tours, and attractions.
    Activities,
    /// Events and entertainment during the trip window.
    Events,
    /// Local transportation.
    Transportation,
}

impl Category {
    /// All categories in dispatch order.
    pub const ALL: [Self; 6] = [
        Self::Flights,
        Self::Hotels,
        Self::Restaurants,
        Self::Activities,
        Self::Events,
        Self::Transportation,
    ];

    /// Key used in the research bundle and in schemas.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Flights => "flights",
            Self::Hotels => "hotels",
            Self::Restaurants => "restaurants",
            Self::Activities => "activities",
            Self::Events => "events",
            Self::Transportation => "transportation",
        }
    }

    /// Name of the agent researching this category.
    #[must_use]
    pub const fn agent_name(self) -> &'static str {
        match self {
            Self::Flights => "FlightsAgent",
            Self::Hotels => "HotelsAgent",
            Self::Restaurants => "RestaurantsAgent",
            Self::Activities => "ActivitiesAgent",
            Self::Events => "EventsAgent",
            Self::Transportation => "TransportationAgent",
        }
    }

    /// Short human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Flights => "Flights",
            Self::Hotels => "Hotels",
            Self::Restaurants => "Restaurants",
            Self::Activities => "Activities",
            Self::Events => "Events",
            Self::Transportation => "Transportation",
        }
    }

    /// Heading of this category's section in the final plan.
    #[must_use]
    pub const fn section_title(self) -> &'static str {
        match self {
            Self::Flights => "Flights",
            Self::Hotels => "Where to Stay",
            Self::Restaurants => "Dining Guide",
            Self::Activities => "Activities & Excursions",
            Self::Events => "Events & Entertainment",
            Self::Transportation => "Getting Around",
        }
    }

    /// Looks up a category by its agent name.
    #[must_use]
    pub fn from_agent_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.agent_name() == name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}
