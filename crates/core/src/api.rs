//! Wire types of the agent backend.
//!
//! Only the shapes live here; fetching is left to the host. The markdown in
//! [`AgentReply::response`] and [`ItineraryReply::itinerary`] is what gets fed
//! to [`render`](crate::render) and the reveal controller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Body of `POST /api/{agent}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentQuery {
    pub message: String,
    /// Ask the agent to consult the local guide documents.
    #[serde(default)]
    pub use_pdf: bool,
}

impl AgentQuery {
    pub fn new(message: impl Into<String>, use_pdf: bool) -> Self {
        Self {
            message: message.into(),
            use_pdf,
        }
    }
}

/// Answer of an agent endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    pub response: String,
    /// Place name the host may hand to its map view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl AgentReply {
    pub fn into_markdown(self) -> String {
        self.response
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripType {
    #[default]
    City,
    Region,
}

/// Trip intensity on a 1..=5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Pace(u8);

impl Pace {
    pub const BALANCED: Pace = Pace(3);

    pub fn new(value: u8) -> Result<Self> {
        Self::try_from(value)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Leisurely",
            2 => "Relaxed",
            3 => "Balanced",
            4 => "Active",
            _ => "Fast-Paced",
        }
    }
}

impl Default for Pace {
    fn default() -> Self {
        Self::BALANCED
    }
}

impl TryFrom<u8> for Pace {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        if (1..=5).contains(&value) {
            Ok(Pace(value))
        } else {
            Err(Error::InvalidRequest(format!(
                "pace must be between 1 and 5, got {value}"
            )))
        }
    }
}

impl From<Pace> for u8 {
    fn from(pace: Pace) -> Self {
        pace.0
    }
}

/// Body of `POST /api/itinerary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryRequest {
    pub origin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub interests: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub trip_type: TripType,
    pub destinations: Vec<String>,
    #[serde(default)]
    pub pace: Pace,
}

impl ItineraryRequest {
    /// Single-city trip; `destinations` mirrors the one destination.
    pub fn city(
        origin: impl Into<String>,
        destination: impl Into<String>,
        interests: impl Into<String>,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Self {
        let destination = destination.into();
        Self {
            origin: origin.into(),
            destinations: vec![destination.clone()],
            destination: Some(destination),
            interests: interests.into(),
            date_from,
            date_to,
            trip_type: TripType::City,
            pace: Pace::default(),
        }
    }

    /// Multi-stop trip; blank stops are dropped.
    pub fn region<I, S>(
        origin: impl Into<String>,
        stops: I,
        interests: impl Into<String>,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origin: origin.into(),
            destination: None,
            destinations: stops
                .into_iter()
                .map(Into::into)
                .filter(|stop: &String| !stop.trim().is_empty())
                .collect(),
            interests: interests.into(),
            date_from,
            date_to,
            trip_type: TripType::Region,
            pace: Pace::default(),
        }
    }

    pub fn with_pace(mut self, pace: Pace) -> Self {
        self.pace = pace;
        self
    }

    /// The checks the planner form runs before submitting, in the same order.
    pub fn validate(&self) -> Result<()> {
        if self.origin.trim().is_empty() {
            return Err(invalid("Please fill in the origin"));
        }
        match self.trip_type {
            TripType::City => {
                let missing = self
                    .destination
                    .as_deref()
                    .is_none_or(|destination| destination.trim().is_empty());
                if missing {
                    return Err(invalid("Please fill in the destination"));
                }
            }
            TripType::Region => {
                if self.destinations.iter().all(|stop| stop.trim().is_empty()) {
                    return Err(invalid("Please fill at least one destination"));
                }
            }
        }
        if self.interests.trim().is_empty() {
            return Err(invalid("Please fill in your interests"));
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidRequest(message.to_owned())
}

/// Answer of the itinerary endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryReply {
    pub itinerary: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, day).unwrap()
    }

    #[test]
    fn agent_query_uses_camel_case() {
        let body = serde_json::to_value(AgentQuery::new("Rome in June?", true)).unwrap();
        assert_eq!(body, json!({ "message": "Rome in June?", "usePdf": true }));
    }

    #[test]
    fn agent_reply_destination_is_optional() {
        let reply: AgentReply = serde_json::from_value(json!({ "response": "# Rome" })).unwrap();
        assert_eq!(reply.destination, None);
        assert_eq!(reply.into_markdown(), "# Rome");
    }

    #[test]
    fn city_request_serializes_like_the_form() {
        let request = ItineraryRequest::city("Berlin", "Prague", "beer, castles", date(1), date(4))
            .with_pace(Pace::new(4).unwrap());
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({
                "origin": "Berlin",
                "destination": "Prague",
                "interests": "beer, castles",
                "date_from": "2026-05-01",
                "date_to": "2026-05-04",
                "trip_type": "city",
                "destinations": ["Prague"],
                "pace": 4,
            })
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn validation_messages_follow_form_order() {
        let mut request = ItineraryRequest::city("", "", "", date(1), date(2));
        let message = |request: &ItineraryRequest| request.validate().unwrap_err().to_string();
        assert_eq!(message(&request), "Please fill in the origin");

        request.origin = "Lyon".into();
        assert_eq!(message(&request), "Please fill in the destination");

        let region = ItineraryRequest::region("Lyon", ["", "  "], "wine", date(1), date(2));
        assert!(region.destinations.is_empty());
        assert_eq!(message(&region), "Please fill at least one destination");

        let region = ItineraryRequest::region("Lyon", ["Annecy"], "", date(1), date(2));
        assert_eq!(message(&region), "Please fill in your interests");
    }

    #[test]
    fn pace_is_bounded() {
        assert!(Pace::new(0).is_err());
        assert!(Pace::new(6).is_err());
        assert_eq!(Pace::new(1).unwrap().label(), "Leisurely");
        assert_eq!(Pace::default().label(), "Balanced");
        assert!(serde_json::from_value::<Pace>(json!(9)).is_err());
    }
}
