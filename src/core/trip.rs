//! Trip request types.
//!
//! [`TripDetails`] is the partially-filled shape the collection dialogue
//! accumulates; [`TripRequest`] is the validated, immutable request the
//! research pipeline consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::TripRequestError;

/// Required request fields in the order they are asked for.
pub const REQUIRED_FIELDS: [&str; 6] = [
    "origin",
    "destination",
    "num_people",
    "start_date",
    "end_date",
    "budget_per_person",
];

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Trip details gathered so far; any field may still be unknown.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
    /// Departure city.
    #[serde(default)]
    pub origin: Option<String>,
    /// Destination city.
    #[serde(default)]
    pub destination: Option<String>,
    /// Number of travelers.
    #[serde(default)]
    pub num_people: Option<u32>,
    /// Departure date (`YYYY-MM-DD`).
    #[serde(default)]
    pub start_date: Option<String>,
    /// Return date (`YYYY-MM-DD`).
    #[serde(default)]
    pub end_date: Option<String>,
    /// Total budget per person in USD.
    #[serde(default)]
    pub budget_per_person: Option<f64>,
    /// Free-form interests.
    #[serde(default)]
    pub interests: Option<String>,
}

impl TripDetails {
    /// Required fields that are absent or blank, in canonical order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let blank = |v: Option<&String>| v.is_none_or(|s| s.trim().is_empty());
        REQUIRED_FIELDS
            .into_iter()
            .filter(|field| match *field {
                "origin" => blank(self.origin.as_ref()),
                "destination" => blank(self.destination.as_ref()),
                "num_people" => self.num_people.is_none_or(|n| n == 0),
                "start_date" => blank(self.start_date.as_ref()),
                "end_date" => blank(self.end_date.as_ref()),
                "budget_per_person" => self.budget_per_person.is_none_or(|b| b <= 0.0),
                _ => false,
            })
            .collect()
    }
}

/// A validated trip request.
///
/// Fields are private so a constructed request cannot be changed; build
/// one with [`TripRequest::new`] or `TryFrom<TripDetails>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TripDetails")]
pub struct TripRequest {
    origin: String,
    destination: String,
    num_people: u32,
    start_date: NaiveDate,
    end_date: NaiveDate,
    budget_per_person: f64,
    interests: Option<String>,
}

impl TripRequest {
    /// Validates and builds a trip request.
    ///
    /// # Errors
    ///
    /// Returns [`TripRequestError`] when a required field is blank, the
    /// group size or budget is not positive, a date does not parse, or the
    /// end date precedes the start date.
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        num_people: u32,
        start_date: &str,
        end_date: &str,
        budget_per_person: f64,
        interests: Option<String>,
    ) -> Result<Self, TripRequestError> {
        let origin = non_blank(origin.into(), "origin")?;
        let destination = non_blank(destination.into(), "destination")?;
        if num_people == 0 {
            return Err(TripRequestError::InvalidGroupSize);
        }
        if !budget_per_person.is_finite() || budget_per_person <= 0.0 {
            return Err(TripRequestError::InvalidBudget);
        }
        let start = parse_date(start_date, "start_date")?;
        let end = parse_date(end_date, "end_date")?;
        if end < start {
            return Err(TripRequestError::EndBeforeStart {
                start: start_date.trim().to_string(),
                end: end_date.trim().to_string(),
            });
        }

        Ok(Self {
            origin,
            destination,
            num_people,
            start_date: start,
            end_date: end,
            budget_per_person,
            interests: interests
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        })
    }

    /// Departure city.
    #[must_use]
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Destination city.
    #[must_use]
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Number of travelers.
    #[must_use]
    pub const fn num_people(&self) -> u32 {
        self.num_people
    }

    /// Departure date.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Return date.
    #[must_use]
    pub const fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Budget per person in USD.
    #[must_use]
    pub const fn budget_per_person(&self) -> f64 {
        self.budget_per_person
    }

    /// Traveler interests, if given.
    #[must_use]
    pub fn interests(&self) -> Option<&str> {
        self.interests.as_deref()
    }

    /// Nights away (zero for a day trip).
    #[must_use]
    pub fn nights(&self) -> u32 {
        u32::try_from((self.end_date - self.start_date).num_days()).unwrap_or(0)
    }

    /// Calendar days covered by the trip, counting both ends.
    #[must_use]
    pub fn days(&self) -> u32 {
        self.nights().saturating_add(1)
    }
}

impl TryFrom<TripDetails> for TripRequest {
    type Error = TripRequestError;

    fn try_from(details: TripDetails) -> Result<Self, Self::Error> {
        let num_people = details
            .num_people
            .ok_or(TripRequestError::MissingField("num_people"))?;
        let budget = details
            .budget_per_person
            .ok_or(TripRequestError::MissingField("budget_per_person"))?;
        let start = details
            .start_date
            .ok_or(TripRequestError::MissingField("start_date"))?;
        let end = details
            .end_date
            .ok_or(TripRequestError::MissingField("end_date"))?;

        Self::new(
            details.origin.unwrap_or_default(),
            details.destination.unwrap_or_default(),
            num_people,
            &start,
            &end,
            budget,
            details.interests,
        )
    }
}

impl From<&TripRequest> for TripDetails {
    fn from(request: &TripRequest) -> Self {
        Self {
            origin: Some(request.origin.clone()),
            destination: Some(request.destination.clone()),
            num_people: Some(request.num_people),
            start_date: Some(request.start_date.format(DATE_FORMAT).to_string()),
            end_date: Some(request.end_date.format(DATE_FORMAT).to_string()),
            budget_per_person: Some(request.budget_per_person),
            interests: request.interests.clone(),
        }
    }
}

fn non_blank(value: String, field: &'static str) -> Result<String, TripRequestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(TripRequestError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_date(value: &str, field: &'static str) -> Result<NaiveDate, TripRequestError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TripRequestError::MissingField(field));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| TripRequestError::InvalidDate {
        field,
        value: trimmed.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paris() -> TripRequest {
        TripRequest::new("NYC", "Paris", 2, "2025-06-01", "2025-06-08", 2000.0, None)
            .unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_valid_request() {
        let req = paris();
        assert_eq!(req.origin(), "NYC");
        assert_eq!(req.destination(), "Paris");
        assert_eq!(req.num_people(), 2);
        assert_eq!(req.nights(), 7);
        assert_eq!(req.days(), 8);
        assert!(req.interests().is_none());
    }

    #[test]
    fn test_rejects_zero_people() {
        let err = TripRequest::new("NYC", "Paris", 0, "2025-06-01", "2025-06-08", 2000.0, None);
        assert_eq!(err, Err(TripRequestError::InvalidGroupSize));
    }

    #[test]
    fn test_rejects_non_positive_budget() {
        for budget in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let err = TripRequest::new("NYC", "Paris", 2, "2025-06-01", "2025-06-08", budget, None);
            assert_eq!(err, Err(TripRequestError::InvalidBudget));
        }
    }

    #[test]
    fn test_rejects_end_before_start() {
        let err = TripRequest::new("NYC", "Paris", 2, "2025-06-08", "2025-06-01", 2000.0, None);
        assert!(matches!(err, Err(TripRequestError::EndBeforeStart { .. })));
    }

    #[test]
    fn test_same_day_trip_is_valid() {
        let req = TripRequest::new("NYC", "Boston", 1, "2025-06-01", "2025-06-01", 300.0, None)
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(req.nights(), 0);
        assert_eq!(req.days(), 1);
    }

    #[test]
    fn test_rejects_bad_date() {
        let err = TripRequest::new("NYC", "Paris", 2, "June 1st", "2025-06-08", 2000.0, None);
        assert!(matches!(
            err,
            Err(TripRequestError::InvalidDate {
                field: "start_date",
                ..
            })
        ));
    }

    #[test]
    fn test_blank_interests_dropped() {
        let req = TripRequest::new(
            "NYC",
            "Paris",
            2,
            "2025-06-01",
            "2025-06-08",
            2000.0,
            Some("   ".to_string()),
        )
        .unwrap_or_else(|_| unreachable!());
        assert!(req.interests().is_none());
    }

    #[test]
    fn test_missing_fields_order() {
        let details = TripDetails {
            destination: Some("Paris".to_string()),
            budget_per_person: Some(0.0),
            ..TripDetails::default()
        };
        assert_eq!(
            details.missing_fields(),
            vec![
                "origin",
                "num_people",
                "start_date",
                "end_date",
                "budget_per_person"
            ]
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Result<TripRequest, _> = serde_json::from_str(
            r#"{"origin":"NYC","destination":"Paris","num_people":2,
                "start_date":"2025-06-01","end_date":"2025-06-08","budget_per_person":2000}"#,
        );
        assert!(ok.is_ok());

        let bad: Result<TripRequest, _> = serde_json::from_str(
            r#"{"origin":"NYC","destination":"Paris","num_people":0,
                "start_date":"2025-06-01","end_date":"2025-06-08","budget_per_person":2000}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_serializes_dates_as_iso() {
        let json = serde_json::to_string(&paris()).unwrap_or_default();
        assert!(json.contains("\"start_date\":\"2025-06-01\""));
        assert!(json.contains("\"end_date\":\"2025-06-08\""));
    }
}
