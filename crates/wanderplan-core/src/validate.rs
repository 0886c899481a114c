//! Structural validation of decoded model output.
//!
//! Only the fields the rest of the pipeline depends on are required:
//! `travelPlan`, a non-empty `travelPlan.destination` string, and a
//! `travelPlan.itinerary` array (possibly empty). Hotels, flights and
//! dates are optional because rendering tolerates their absence.

use std::fmt;

use serde_json::Value;

/// First structural requirement a decoded plan failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureIssue {
    MissingTravelPlan,
    MissingDestination,
    ItineraryNotArray,
}

impl fmt::Display for StructureIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MissingTravelPlan => "missing travelPlan",
            Self::MissingDestination => "travelPlan.destination is missing or empty",
            Self::ItineraryNotArray => "travelPlan.itinerary is missing or not an array",
        };
        f.write_str(s)
    }
}

/// Check the required shape, in order, reporting the first failure.
pub fn check(value: &Value) -> Result<(), StructureIssue> {
    let plan = value
        .get("travelPlan")
        .filter(|plan| plan.is_object())
        .ok_or(StructureIssue::MissingTravelPlan)?;

    let has_destination = plan
        .get("destination")
        .and_then(Value::as_str)
        .is_some_and(|d| !d.trim().is_empty());
    if !has_destination {
        return Err(StructureIssue::MissingDestination);
    }

    if !plan.get("itinerary").is_some_and(Value::is_array) {
        return Err(StructureIssue::ItineraryNotArray);
    }

    Ok(())
}

/// Boolean form of [`check`].
pub fn validate(value: &Value) -> bool {
    check(value).is_ok()
}
