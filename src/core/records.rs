//! Structured research records.
//!
//! Each record is a flat struct with one required identity field, a USD
//! price, and optional descriptive fields. Deserialization is lenient
//! about the shapes language models commonly emit: `null` prices read as
//! `0`, `"$120"` reads as `120`, and `null` lists read as empty.

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::category::Category;

/// Behavior shared by every research record type.
pub trait ResearchRecord:
    Serialize + DeserializeOwned + JsonSchema + Clone + std::fmt::Debug + PartialEq + Send + Sync + 'static
{
    /// Category this record type belongs to.
    const CATEGORY: Category;

    /// Identity field (name, airline, or transport type).
    fn identity(&self) -> &str;

    /// Price in USD; `0` when unknown.
    fn price(&self) -> f64;

    /// Secondary identifying field checked by the quality rule.
    fn secondary_field(&self) -> Option<&str>;

    /// Wraps a list of records into the category-tagged container.
    fn wrap(records: Vec<Self>) -> CategoryRecords;
}

/// A flight option between origin and destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FlightOption {
    /// Operating airline.
    pub airline: String,
    /// Fare in USD.
    #[serde(deserialize_with = "lenient_price")]
    pub price: f64,
    /// Departure airport or city.
    #[serde(default)]
    pub origin: Option<String>,
    /// Arrival airport or city.
    #[serde(default)]
    pub destination: Option<String>,
    /// Departure time.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub departure_time: Option<String>,
    /// Arrival time.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub arrival_time: Option<String>,
    /// Flight duration.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub duration: Option<String>,
    /// Booking link.
    #[serde(default)]
    pub booking_url: Option<String>,
    /// Cabin class (Economy, Business, ...).
    #[serde(default)]
    pub class_type: Option<String>,
}

/// An accommodation option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HotelOption {
    /// Property name.
    pub name: String,
    /// Address or area.
    #[serde(default)]
    pub location: Option<String>,
    /// Nightly rate in USD.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price_per_night: f64,
    /// Guest rating.
    #[serde(default, deserialize_with = "lenient_opt_number")]
    pub rating: Option<f64>,
    /// Listed amenities.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub amenities: Vec<String>,
    /// Booking link.
    #[serde(default)]
    pub booking_url: Option<String>,
    /// Short neighborhood description.
    #[serde(default)]
    pub neighborhood: Option<String>,
    /// Phone, email, or other contact.
    #[serde(default)]
    pub contact_info: Option<String>,
    /// Review snippets.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub reviews: Vec<String>,
}

/// A dining option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RestaurantOption {
    /// Restaurant name.
    pub name: String,
    /// Cuisine type.
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Price tier such as `$$`.
    #[serde(default)]
    pub price_range: Option<String>,
    /// Typical cost per person in USD.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    /// Address or area.
    #[serde(default)]
    pub location: Option<String>,
    /// Guest rating.
    #[serde(default, deserialize_with = "lenient_opt_number")]
    pub rating: Option<f64>,
    /// Reservation link.
    #[serde(default)]
    pub reservation_url: Option<String>,
    /// Phone, email, or other contact.
    #[serde(default)]
    pub contact_info: Option<String>,
    /// Opening hours.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub opening_hours: Option<String>,
    /// Closing hours.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub closing_hours: Option<String>,
    /// Review snippets.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub reviews: Vec<String>,
    /// Recommended dishes.
    #[serde(default, deserialize_with = "lenient_strings")]
    pub recommended_menu: Vec<String>,
}

/// An activity, tour, or attraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActivityOption {
    /// Activity name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Price per person in USD.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    /// Address or area.
    #[serde(default)]
    pub location: Option<String>,
    /// Duration in hours.
    #[serde(default, deserialize_with = "lenient_opt_number")]
    pub duration: Option<f64>,
    /// Booking link.
    #[serde(default)]
    pub booking_url: Option<String>,
    /// Phone, email, or other contact.
    #[serde(default)]
    pub contact_info: Option<String>,
    /// Operating hours.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub timings: Option<String>,
}

/// An event or entertainment option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventOption {
    /// Event name.
    pub name: String,
    /// Short description.
    #[serde(default)]
    pub description: Option<String>,
    /// Event date, when a single date applies.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub date: Option<String>,
    /// Ticket price in USD.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    /// Venue or area.
    #[serde(default)]
    pub location: Option<String>,
    /// Duration in hours.
    #[serde(default, deserialize_with = "lenient_opt_number")]
    pub duration: Option<f64>,
    /// Booking link.
    #[serde(default)]
    pub booking_url: Option<String>,
    /// Phone, email, or other contact.
    #[serde(default)]
    pub contact_info: Option<String>,
    /// Start times.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub timings: Option<String>,
}

/// A local transportation option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TransportationOption {
    /// Mode or service name (Metro, Bus, Taxi, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Fare in USD.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    /// Typical journey time.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub duration: Option<String>,
    /// Departure time.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub departure_time: Option<String>,
    /// Arrival time.
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub arrival_time: Option<String>,
    /// Boarding location.
    #[serde(default)]
    pub origin: Option<String>,
    /// Drop-off location.
    #[serde(default)]
    pub destination: Option<String>,
    /// Booking link.
    #[serde(default)]
    pub booking_url: Option<String>,
    /// Phone, email, or other contact.
    #[serde(default)]
    pub contact_info: Option<String>,
    /// Service class.
    #[serde(default)]
    pub class_type: Option<String>,
}

impl ResearchRecord for FlightOption {
    const CATEGORY: Category = Category::Flights;

    fn identity(&self) -> &str {
        &self.airline
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn secondary_field(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    fn wrap(records: Vec<Self>) -> CategoryRecords {
        CategoryRecords::Flights(records)
    }
}

impl ResearchRecord for HotelOption {
    const CATEGORY: Category = Category::Hotels;

    fn identity(&self) -> &str {
        &self.name
    }

    fn price(&self) -> f64 {
        self.price_per_night
    }

    fn secondary_field(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn wrap(records: Vec<Self>) -> CategoryRecords {
        CategoryRecords::Hotels(records)
    }
}

impl ResearchRecord for RestaurantOption {
    const CATEGORY: Category = Category::Restaurants;

    fn identity(&self) -> &str {
        &self.name
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn secondary_field(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn wrap(records: Vec<Self>) -> CategoryRecords {
        CategoryRecords::Restaurants(records)
    }
}

impl ResearchRecord for ActivityOption {
    const CATEGORY: Category = Category::Activities;

    fn identity(&self) -> &str {
        &self.name
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn secondary_field(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn wrap(records: Vec<Self>) -> CategoryRecords {
        CategoryRecords::Activities(records)
    }
}

impl ResearchRecord for EventOption {
    const CATEGORY: Category = Category::Events;

    fn identity(&self) -> &str {
        &self.name
    }

    fn price(&self) -> f64 {
        self.price
    }

    fn secondary_field(&self) -> Option<&str> {
        self.location.as_deref()
    }

    fn wrap(records: Vec<Self>) -> CategoryRecords {
        CategoryRecords::Events(records)
    }
}

impl ResearchRecord for TransportationOption {
    const CATEGORY: Category = Category::Transportation;

    fn identity(&self) -> &str {
        &self.kind
    }

    fn price(&self) -> f64 {
        self.price
    }

    /// The boarding origin; `kind` is always present so it says nothing.
    fn secondary_field(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    fn wrap(records: Vec<Self>) -> CategoryRecords {
        CategoryRecords::Transportation(records)
    }
}

/// Records of one category, tagged with the category.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CategoryRecords {
    /// Flight records.
    Flights(Vec<FlightOption>),
    /// Hotel records.
    Hotels(Vec<HotelOption>),
    /// Restaurant records.
    Restaurants(Vec<RestaurantOption>),
    /// Activity records.
    Activities(Vec<ActivityOption>),
    /// Event records.
    Events(Vec<EventOption>),
    /// Transportation records.
    Transportation(Vec<TransportationOption>),
}

impl CategoryRecords {
    /// An empty list for the given category.
    #[must_use]
    pub const fn empty(category: Category) -> Self {
        match category {
            Category::Flights => Self::Flights(Vec::new()),
            Category::Hotels => Self::Hotels(Vec::new()),
            Category::Restaurants => Self::Restaurants(Vec::new()),
            Category::Activities => Self::Activities(Vec::new()),
            Category::Events => Self::Events(Vec::new()),
            Category::Transportation => Self::Transportation(Vec::new()),
        }
    }

    /// Category of the contained records.
    #[must_use]
    pub const fn category(&self) -> Category {
        match self {
            Self::Flights(_) => Category::Flights,
            Self::Hotels(_) => Category::Hotels,
            Self::Restaurants(_) => Category::Restaurants,
            Self::Activities(_) => Category::Activities,
            Self::Events(_) => Category::Events,
            Self::Transportation(_) => Category::Transportation,
        }
    }

    /// Number of records.
    #[must_use]
    pub const fn len(&self) -> usize {
        match self {
            Self::Flights(v) => v.len(),
            Self::Hotels(v) => v.len(),
            Self::Restaurants(v) => v.len(),
            Self::Activities(v) => v.len(),
            Self::Events(v) => v.len(),
            Self::Transportation(v) => v.len(),
        }
    }

    /// Whether there are no records.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .skip_while(|c| !c.is_ascii_digit())
                .take_while(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
                .filter(|c| *c != ',')
                .collect();
            cleaned.parse().ok()
        }
        _ => None,
    }
}

/// Reads a price from a number, a currency string, or `null` (as `0`).
fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .unwrap_or(0.0))
}

fn lenient_opt_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value).filter(|n| n.is_finite()))
}

fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => Vec::new(),
        Value::String(s) => vec![s],
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Null => None,
                Value::String(s) => Some(s),
                other => Some(other.to_string()),
            })
            .collect(),
        other => vec![other.to_string()],
    })
}
