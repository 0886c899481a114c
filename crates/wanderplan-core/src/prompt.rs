//! Prompt construction.
//!
//! Pure placeholder substitution into one of two templates: one that asks
//! the model to discover a destination of a given type, and one that plans
//! a trip to a named place. No I/O.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::config::TemplateConfig;
use crate::types::{GenerationRequest, RequestMode};

/// Placeholder names understood by [`build_prompt`].
pub const PLACEHOLDERS: [&str; 7] = [
    "destinationType",
    "name",
    "totalDays",
    "totalNight",
    "whoIsGoing",
    "budget",
    "activityLevel",
];

/// Matches exactly the known `{placeholder}` tokens. Unknown braces (the
/// JSON skeleton in the templates) are left alone.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{(destinationType|name|totalDays|totalNight|whoIsGoing|budget|activityLevel)\}")
        .expect("valid regex")
});

/// JSON shape both templates ask for.
const RESPONSE_SHAPE: &str = r#"Respond with a single JSON object and nothing else, using exactly this structure:
{
  "travelPlan": {
    "destination": "City, Country",
    "destinationType": "string",
    "destinationDescription": "two or three sentences",
    "dates": { "startDate": "", "endDate": "", "bestTimeToVisit": "string" },
    "budget": "string",
    "flights": { "airlineName": "string", "flightPrice": "string", "airlineUrl": "https://..." },
    "hotels": [
      {
        "hotelName": "string",
        "hotelAddress": "string",
        "price": "string",
        "geoCoordinates": { "latitude": 0.0, "longitude": 0.0 },
        "rating": 4.5,
        "description": "string",
        "bookingUrl": "https://..."
      }
    ],
    "itinerary": [
      {
        "day": 1,
        "places": [
          {
            "placeName": "string",
            "placeDetails": "one sentence",
            "placeExtendedDetails": "a short paragraph",
            "geoCoordinates": { "latitude": 0.0, "longitude": 0.0 },
            "ticketPrice": "string",
            "placeUrl": "https://..."
          }
        ]
      }
    ]
  }
}
Use double quotes for every key and string. Do not add comments, trailing commas, or markdown fences."#;

/// Template for the "discover a destination" path.
pub static DISCOVER_TEMPLATE: LazyLock<String> = LazyLock::new(|| {
    format!(
        "Suggest one {{destinationType}} destination and generate a travel plan for it \
         for {{totalDays}} days and {{totalNight}} nights for {{whoIsGoing}} \
         with a {{budget}} budget and a {{activityLevel}} activity level. \
         Include flight details with an approximate price and a booking URL, \
         a list of hotel options with name, address, price, geo coordinates, rating, \
         description and booking URL, and a day-by-day itinerary of places to visit \
         with details, geo coordinates, ticket prices and URLs.\n\n{RESPONSE_SHAPE}"
    )
});

/// Template for the "plan for this named place" path.
pub static NAMED_TEMPLATE: LazyLock<String> = LazyLock::new(|| {
    format!(
        "Generate a travel plan for {{name}} for {{totalDays}} days and {{totalNight}} nights \
         for {{whoIsGoing}} with a {{budget}} budget and a {{activityLevel}} activity level. \
         Include flight details with an approximate price and a booking URL, \
         a list of hotel options with name, address, price, geo coordinates, rating, \
         description and booking URL, and a day-by-day itinerary of places to visit \
         with details, geo coordinates, ticket prices and URLs.\n\n{RESPONSE_SHAPE}"
    )
});

/// Substitute request fields into `template`.
///
/// Substitution is a single pass, so a value that itself contains a
/// placeholder token is inserted literally. Missing optional fields
/// become empty strings.
pub fn build_prompt(template: &str, request: &GenerationRequest) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| placeholder_value(&caps[1], request))
        .into_owned()
}

fn placeholder_value(name: &str, request: &GenerationRequest) -> String {
    match name {
        "destinationType" => request.destination_type.clone().unwrap_or_default(),
        "name" => request.destination_name.clone().unwrap_or_default(),
        "totalDays" => request.total_days.to_string(),
        "totalNight" => request.total_nights.to_string(),
        "whoIsGoing" => request.who_is_going.clone(),
        "budget" => request.budget.clone(),
        "activityLevel" => request.activity_level.clone(),
        _ => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Template set
// ---------------------------------------------------------------------------

/// The pair of templates a generator renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplates {
    pub discover: String,
    pub named: String,
}

impl PromptTemplates {
    /// Built-in templates with any configured overrides applied.
    pub fn from_config(config: &TemplateConfig) -> Self {
        let defaults = Self::default();
        Self {
            discover: config.discover.clone().unwrap_or(defaults.discover),
            named: config.named.clone().unwrap_or(defaults.named),
        }
    }

    /// The template matching the request's mode.
    pub fn select(&self, request: &GenerationRequest) -> &str {
        match request.mode() {
            RequestMode::Discover => &self.discover,
            RequestMode::Named => &self.named,
        }
    }

    pub fn render(&self, request: &GenerationRequest) -> String {
        build_prompt(self.select(request), request)
    }
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            discover: DISCOVER_TEMPLATE.clone(),
            named: NAMED_TEMPLATE.clone(),
        }
    }
}
