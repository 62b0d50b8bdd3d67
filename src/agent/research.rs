//! The research agent, parameterized by category.
//!
//! Each category is a [`CategorySpec`]: a query template, the extraction
//! instruction, and a quality rule. [`ResearchAgent`] runs one spec
//! through the [`Extractor`].

use crate::core::{
    ActivityOption, AgentOutcome, Category, CategoryRecords, EventOption, FlightOption,
    HotelOption, ResearchRecord, RestaurantOption, TransportationOption, TripRequest,
};

use super::extractor::Extractor;
use super::structurer::SchemaDescriptor;

/// Acceptance test applied to a category's extracted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityRule {
    /// At least one record with a price above zero.
    PositivePrice,
    /// At least one record whose secondary field is populated.
    ///
    /// The field is the location for hotels, restaurants, activities, and
    /// events. Transportation checks the boarding `origin` rather than the
    /// always-present transport type, so a bare list of modes is retried.
    SecondaryField,
}

impl QualityRule {
    /// Whether `records` are good enough to stop retrying.
    #[must_use]
    pub fn accepts<T: ResearchRecord>(self, records: &[T]) -> bool {
        match self {
            Self::PositivePrice => records.iter().any(|r| r.price() > 0.0),
            Self::SecondaryField => records
                .iter()
                .any(|r| r.secondary_field().is_some_and(|s| !s.trim().is_empty())),
        }
    }
}

/// Per-category research configuration.
#[derive(Debug)]
pub struct CategorySpec {
    /// Category researched.
    pub category: Category,
    /// Extraction instruction for the structuring model.
    pub instruction: &'static str,
    /// When a result is good enough.
    pub quality: QualityRule,
    /// Builds the initial search query.
    pub query: fn(&TripRequest) -> String,
}

const FLIGHTS_INSTRUCTION: &str = "You are a flight research specialist.
You will be given raw web search results about flights.
Extract concrete flight options from the results and return them.

Rules:
- Only include flights with a real airline name
- Price must be a number in USD
- If booking URL is not found, leave it null
- Return at most 5 options
- Do not invent flights that are not in the search results";

const HOTELS_INSTRUCTION: &str = "You are an accommodation research specialist.
You will be given web search results about hotels and accommodations.
Extract concrete options from the results and return them.

Rules:
- Only include accommodations with a real name
- price_per_night must be a number in USD (if available, otherwise 0)
- If booking URL is not found, leave it null
- Return at most 5 options
- Include the location, a brief description of the neighborhood, contact information, and reviews if available
- Include a range of accommodation types such as hotels, hostels, and apartments if available
- Include amenities if available
- Do not invent hotels that are not in the search results";

const RESTAURANTS_INSTRUCTION: &str = "You are a restaurant research specialist.
You will be given web search results about restaurants and dining options.
Extract concrete restaurant options from the results and return them.

Rules:
- Only include restaurants with a real name
- Price range should be documented (e.g., \"$$\", \"$$$\", \"$$$$\")
- price is the typical cost per person in USD (if available, otherwise 0)
- If reservation URL is not found, leave it null
- Return at most 5 options
- Include a range of cuisine types and price points if available
- Include location, ratings, reviews, opening hours, and recommended dishes if available
- Do not invent restaurants that are not in the search results";

const ACTIVITIES_INSTRUCTION: &str = "You are an activities and attractions research specialist.
You will be given web search results about activities, tours, and attractions.
Extract concrete activity options from the results and return them.

Rules:
- Only include activities with a real name
- Price must be a number in USD (if available, otherwise 0)
- If booking URL is not found, leave it null
- Return at most 5 options
- Include duration in hours if available
- Provide a diverse mix of activities (museums, tours, outdoor activities, cultural sites, etc.)
- Include location, operating hours, and contact information if available
- Do not invent activities that are not in the search results";

const EVENTS_INSTRUCTION: &str = "You are an events and entertainment research specialist.
You will be given web search results about events, shows, concerts, and entertainment.
Extract concrete event options from the results and return them.

Rules:
- Only include events with a real name
- Price must be a number in USD (if available, otherwise 0)
- If booking URL is not found, leave it null
- Return at most 5 options
- Include the venue location, event date, and timings if available
- Include a variety of entertainment types (concerts, shows, plays, festivals, etc.)
- Do not invent events that are not in the search results";

const TRANSPORTATION_INSTRUCTION: &str = "You are a local transportation research specialist.
You will be given web search results about transportation options.
Extract concrete transportation options from the results and return them.

Rules:
- Only include transportation services with a real name/type
- Price must be a number in USD (if available, otherwise 0)
- If booking URL is not found, leave it null
- Return at most 5 options
- Duration should be in a readable format (e.g., \"30 minutes\", \"2 hours\")
- origin is where the service is boarded (station, stop, airport, or area)
- Include a variety of transportation types (metro, bus, train, taxi, rideshare, etc.)
- Include departure/arrival times and class type if available
- Do not invent transportation services that are not in the search results";

fn flights_query(req: &TripRequest) -> String {
    format!(
        "Find flights from {} to {} departing around {} and returning around {}. \
         Show a range of prices and airlines, and include booking URLs if available.",
        req.origin(),
        req.destination(),
        req.start_date(),
        req.end_date()
    )
}

fn hotels_query(req: &TripRequest) -> String {
    format!(
        "Find accommodations in {}. Look for hotels, well-rated hostels, and apartments \
         available from {} to {} for {} people. Show a range of prices and options, \
         and include booking URLs if available.",
        req.destination(),
        req.start_date(),
        req.end_date(),
        req.num_people()
    )
}

fn restaurants_query(req: &TripRequest) -> String {
    format!(
        "Find highly-rated restaurants in {}. Look for a variety of cuisine types and \
         price ranges suitable for a group of {} people. Include upscale dining, casual \
         restaurants, and local favorites, with reservation URLs and recommended dishes.",
        req.destination(),
        req.num_people()
    )
}

fn activities_query(req: &TripRequest) -> String {
    let mut query = format!(
        "Find popular activities, tours, and attractions in {} suitable for a group of {} \
         people. Include museums, historical sites, outdoor activities, guided tours, and \
         cultural experiences, with pricing, duration, booking URLs, and operating hours.",
        req.destination(),
        req.num_people()
    );
    if let Some(interests) = req.interests() {
        query.push_str(&format!(" Focus on: {interests}."));
    }
    query
}

fn events_query(req: &TripRequest) -> String {
    let mut query = format!(
        "Find events and entertainment happening in {} between {} and {}. Look for \
         concerts, shows, theater performances, festivals, and exhibitions, with booking \
         URLs, ticket prices, and event timings.",
        req.destination(),
        req.start_date(),
        req.end_date()
    );
    if let Some(interests) = req.interests() {
        query.push_str(&format!(" Focus on: {interests}."));
    }
    query
}

fn transportation_query(req: &TripRequest) -> String {
    format!(
        "Find local transportation options in {}. Look for public transportation (metro, \
         buses, trains), taxis, rideshare services, and other transit options suitable for \
         a group of {} people, with pricing, routes, schedules, and booking URLs.",
        req.destination(),
        req.num_people()
    )
}

static SPECS: [CategorySpec; 6] = [
    CategorySpec {
        category: Category::Flights,
        instruction: FLIGHTS_INSTRUCTION,
        quality: QualityRule::PositivePrice,
        query: flights_query,
    },
    CategorySpec {
        category: Category::Hotels,
        instruction: HOTELS_INSTRUCTION,
        quality: QualityRule::SecondaryField,
        query: hotels_query,
    },
    CategorySpec {
        category: Category::Restaurants,
        instruction: RESTAURANTS_INSTRUCTION,
        quality: QualityRule::SecondaryField,
        query: restaurants_query,
    },
    CategorySpec {
        category: Category::Activities,
        instruction: ACTIVITIES_INSTRUCTION,
        quality: QualityRule::SecondaryField,
        query: activities_query,
    },
    CategorySpec {
        category: Category::Events,
        instruction: EVENTS_INSTRUCTION,
        quality: QualityRule::SecondaryField,
        query: events_query,
    },
    CategorySpec {
        category: Category::Transportation,
        instruction: TRANSPORTATION_INSTRUCTION,
        quality: QualityRule::SecondaryField,
        query: transportation_query,
    },
];

impl CategorySpec {
    /// The spec for a category.
    #[must_use]
    pub fn of(category: Category) -> &'static Self {
        let index = match category {
            Category::Flights => 0,
            Category::Hotels => 1,
            Category::Restaurants => 2,
            Category::Activities => 3,
            Category::Events => 4,
            Category::Transportation => 5,
        };
        &SPECS[index]
    }
}

/// One research agent: a category spec bound to the shared extractor.
#[derive(Debug, Clone, Copy)]
pub struct ResearchAgent {
    spec: &'static CategorySpec,
}

impl ResearchAgent {
    /// Creates the agent for a category.
    #[must_use]
    pub fn new(category: Category) -> Self {
        Self {
            spec: CategorySpec::of(category),
        }
    }

    /// All six agents in dispatch order.
    #[must_use]
    pub fn all() -> [Self; 6] {
        Category::ALL.map(Self::new)
    }

    /// Agent name (e.g., `FlightsAgent`).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.spec.category.agent_name()
    }

    /// Category researched.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.spec.category
    }

    /// Initial search query for a request.
    #[must_use]
    pub fn query(&self, request: &TripRequest) -> String {
        (self.spec.query)(request)
    }

    /// Researches the category for `request`.
    pub async fn run(
        &self,
        extractor: &Extractor,
        request: &TripRequest,
    ) -> AgentOutcome<CategoryRecords> {
        match self.spec.category {
            Category::Flights => self.run_typed::<FlightOption>(extractor, request).await,
            Category::Hotels => self.run_typed::<HotelOption>(extractor, request).await,
            Category::Restaurants => self.run_typed::<RestaurantOption>(extractor, request).await,
            Category::Activities => self.run_typed::<ActivityOption>(extractor, request).await,
            Category::Events => self.run_typed::<EventOption>(extractor, request).await,
            Category::Transportation => {
                self.run_typed::<TransportationOption>(extractor, request)
                    .await
            }
        }
    }

    async fn run_typed<T: ResearchRecord>(
        &self,
        extractor: &Extractor,
        request: &TripRequest,
    ) -> AgentOutcome<CategoryRecords> {
        let schema = SchemaDescriptor::for_records::<T>();
        let quality = self.spec.quality;
        extractor
            .extract::<T, _>(
                &self.query(request),
                self.spec.instruction,
                &schema,
                move |records: &[T]| quality.accepts(records),
                self.name(),
            )
            .await
            .map(T::wrap)
    }
}
