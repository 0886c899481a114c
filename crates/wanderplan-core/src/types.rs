//! Request and result types.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Structured travel request handed to the pipeline by the caller.
///
/// Exactly one of `destination_type` / `destination_name` is meaningful:
/// a present `destination_type` asks the model to discover a destination,
/// otherwise the model plans for the named place. `total_nights` is passed
/// through as given and never re-derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    /// Stable place identifier known before generation (named-place path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub total_days: u32,
    pub total_nights: u32,
    #[serde(default)]
    pub who_is_going: String,
    #[serde(default)]
    pub budget: String,
    #[serde(default)]
    pub activity_level: String,
}

/// Which prompt template a request selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Let the model pick a destination of the requested type.
    Discover,
    /// Plan a trip to the named place.
    Named,
}

impl GenerationRequest {
    pub fn mode(&self) -> RequestMode {
        if self.destination_type.is_some() {
            RequestMode::Discover
        } else {
            RequestMode::Named
        }
    }

    /// Query used for photo lookup before the model has answered.
    ///
    /// Only the named-place path knows its destination up front; the
    /// stable place identifier wins over the display name.
    pub fn known_place_query(&self) -> Option<&str> {
        match self.mode() {
            RequestMode::Named => self
                .place_id
                .as_deref()
                .or(self.destination_name.as_deref())
                .filter(|q| !q.trim().is_empty()),
            RequestMode::Discover => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Trip
// ---------------------------------------------------------------------------

/// A validated, enriched trip plan. Immutable once returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    /// Unique per generation attempt.
    pub id: String,
    /// The plan's destination.
    pub name: String,
    pub description: String,
    pub photo_ref: Option<String>,
    /// The decoded model output, kept verbatim (root key `travelPlan`).
    pub trip_plan: Value,
}

impl Trip {
    /// Build a trip from a plan that already passed validation.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        photo_ref: Option<String>,
        trip_plan: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            photo_ref,
            trip_plan,
        }
    }

    /// Typed, lenient view of `tripPlan.travelPlan`.
    pub fn travel_plan(&self) -> Result<TravelPlan, serde_json::Error> {
        let plan = self
            .trip_plan
            .get("travelPlan")
            .cloned()
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        serde_json::from_value(plan)
    }
}

// ---------------------------------------------------------------------------
// Typed plan view
// ---------------------------------------------------------------------------
//
// Models answer with numbers where strings were asked for and vice versa,
// so every scalar below goes through a `lenient` deserializer.

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TravelPlan {
    #[serde(deserialize_with = "lenient::text")]
    pub destination: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub destination_type: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub destination_description: Option<String>,
    pub dates: Option<TripDates>,
    #[serde(deserialize_with = "lenient::text")]
    pub budget: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub photo_ref: Option<String>,
    pub flights: Option<FlightInfo>,
    #[serde(deserialize_with = "lenient::list")]
    pub hotels: Vec<Hotel>,
    #[serde(deserialize_with = "lenient::list")]
    pub itinerary: Vec<ItineraryDay>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TripDates {
    #[serde(deserialize_with = "lenient::text")]
    pub start_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub end_date: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub best_time_to_visit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlightInfo {
    #[serde(deserialize_with = "lenient::text")]
    pub airline_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub flight_price: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub airline_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoCoordinates {
    #[serde(deserialize_with = "lenient::number")]
    pub latitude: Option<f64>,
    #[serde(deserialize_with = "lenient::number")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Hotel {
    #[serde(deserialize_with = "lenient::text")]
    pub hotel_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub hotel_address: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub price: Option<String>,
    pub geo_coordinates: Option<GeoCoordinates>,
    #[serde(deserialize_with = "lenient::number")]
    pub rating: Option<f64>,
    #[serde(deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub booking_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItineraryDay {
    /// Usually a number, sometimes "Day 1".
    #[serde(deserialize_with = "lenient::text")]
    pub day: Option<String>,
    #[serde(deserialize_with = "lenient::list")]
    pub places: Vec<Place>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Place {
    #[serde(deserialize_with = "lenient::text")]
    pub place_name: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub place_details: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub place_extended_details: Option<String>,
    pub geo_coordinates: Option<GeoCoordinates>,
    #[serde(deserialize_with = "lenient::text")]
    pub ticket_price: Option<String>,
    #[serde(deserialize_with = "lenient::text")]
    pub place_url: Option<String>,
}

mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Any scalar as text; `null` and empty strings become `None`.
    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }

    /// A number, or a string holding one (currency symbols and commas
    /// stripped). Anything else is `None`.
    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => {
                let cleaned: String = s
                    .chars()
                    .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+'))
                    .collect();
                cleaned.parse().ok()
            }
            _ => None,
        })
    }

    /// An array, with `null` accepted as empty.
    pub fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }
}
