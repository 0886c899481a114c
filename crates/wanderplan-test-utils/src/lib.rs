//! Shared test doubles and fixtures for wanderplan integration tests.
//!
//! - [`ScriptedModel`]: a [`ModelClient`] that replays a FIFO script of
//!   replies and records every prompt it receives.
//! - [`StaticPlaceLookup`] / [`FailingPlaceLookup`]: [`PlaceLookup`]
//!   doubles for the photo enricher.
//! - Plan and request fixtures.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, bail};
use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use wanderplan_core::{GenerationRequest, ModelClient, ModelError, ModelResponse, PlaceLookup};

// ---------------------------------------------------------------------------
// Model double
// ---------------------------------------------------------------------------

/// One scripted answer from [`ScriptedModel`].
#[derive(Debug, Clone)]
pub enum Reply {
    /// Respond with this text.
    Text(String),
    /// Fail with this error.
    Fail(ModelError),
    /// Never respond.
    Hang,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Fail(ModelError::with_status(status, message))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Fail(ModelError::new(message))
    }
}

/// A model that pops replies from a queue.
///
/// Once the queue is empty the fallback reply is used for every further
/// call; without a fallback the call fails.
pub struct ScriptedModel {
    script: Mutex<VecDeque<Reply>>,
    fallback: Option<Reply>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedModel {
    pub fn new(script: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// A model that gives the same reply to every prompt.
    pub fn always(reply: Reply) -> Arc<Self> {
        Self::with_fallback(Vec::new(), reply)
    }

    /// Replay `script`, then answer with `fallback` forever.
    pub fn with_fallback(script: impl IntoIterator<Item = Reply>, fallback: Reply) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Some(fallback),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of prompts sent so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn send_prompt(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        let next = self.script.lock().await.pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(Reply::Text(text)) => Ok(ModelResponse::new(text)),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Hang) => std::future::pending().await,
            None => Err(ModelError::new("scripted model has no replies left")),
        }
    }
}

// ---------------------------------------------------------------------------
// Place lookup doubles
// ---------------------------------------------------------------------------

/// Answers every query with `photo:<query>`, or with nothing.
#[derive(Default)]
pub struct StaticPlaceLookup {
    empty: bool,
    queries: Mutex<Vec<String>>,
}

impl StaticPlaceLookup {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// A lookup that never finds anything.
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            empty: true,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub async fn queries(&self) -> Vec<String> {
        self.queries.lock().await.clone()
    }
}

#[async_trait]
impl PlaceLookup for StaticPlaceLookup {
    async fn find_photo_reference(&self, query: &str) -> Result<Option<String>> {
        self.queries.lock().await.push(query.to_string());
        if self.empty {
            return Ok(None);
        }
        Ok(Some(format!("photo:{query}")))
    }
}

/// A lookup whose every call fails.
pub struct FailingPlaceLookup;

#[async_trait]
impl PlaceLookup for FailingPlaceLookup {
    async fn find_photo_reference(&self, query: &str) -> Result<Option<String>> {
        bail!("place lookup unavailable for {query}")
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A complete, well-formed plan for `destination`.
pub fn sample_plan(destination: &str) -> Value {
    json!({
        "travelPlan": {
            "destination": destination,
            "destinationType": "City",
            "destinationDescription": format!("A few days exploring {destination}."),
            "dates": { "startDate": "", "endDate": "", "bestTimeToVisit": "Spring" },
            "budget": "Moderate",
            "flights": {
                "airlineName": "TAP Air Portugal",
                "flightPrice": "$450",
                "airlineUrl": "https://www.flytap.com"
            },
            "hotels": [{
                "hotelName": "Memmo Alfama",
                "hotelAddress": "Travessa das Merceeiras 27",
                "price": "$210 per night",
                "geoCoordinates": { "latitude": 38.711, "longitude": -9.131 },
                "rating": 4.6,
                "description": "Boutique hotel with a river view.",
                "bookingUrl": "https://www.booking.com/hotel/pt/memmo-alfama.html"
            }],
            "itinerary": [{
                "day": 1,
                "places": [{
                    "placeName": "Belem Tower",
                    "placeDetails": "Sixteenth-century fortified tower.",
                    "placeExtendedDetails": "Built to guard the entrance to the harbour.",
                    "geoCoordinates": { "latitude": 38.6916, "longitude": -9.216 },
                    "ticketPrice": "EUR 8",
                    "placeUrl": "https://www.torrebelem.gov.pt"
                }]
            }]
        }
    })
}

/// [`sample_plan`] as compact JSON text.
pub fn sample_plan_json(destination: &str) -> String {
    sample_plan(destination).to_string()
}

/// [`sample_plan_json`] wrapped the way models usually answer: prose and
/// a markdown fence around pretty-printed JSON with a trailing comma.
pub fn messy_plan_text(destination: &str) -> String {
    let pretty = serde_json::to_string_pretty(&json!({
        "travelPlan": { "destination": destination, "itinerary": [] }
    }))
    .expect("fixture serializes");
    let with_comma = pretty.replacen("\"itinerary\": []", "\"itinerary\": [],", 1);
    format!("Sure! Here is your trip:\n```json\n{with_comma}\n```\nEnjoy!")
}

/// A named-place request for Lisbon with a known place id.
pub fn named_request() -> GenerationRequest {
    GenerationRequest {
        destination_name: Some("Lisbon, Portugal".to_string()),
        place_id: Some("ChIJO_PkYRozGQ0R0DaQ5L3rAAQ".to_string()),
        total_days: 3,
        total_nights: 2,
        who_is_going: "Couple".to_string(),
        budget: "Moderate".to_string(),
        activity_level: "Balanced".to_string(),
        ..Default::default()
    }
}

/// A discover request for a beach destination.
pub fn discover_request() -> GenerationRequest {
    GenerationRequest {
        destination_type: Some("Beach".to_string()),
        total_days: 5,
        total_nights: 4,
        who_is_going: "Friends".to_string(),
        budget: "Cheap".to_string(),
        activity_level: "Relaxed".to_string(),
        ..Default::default()
    }
}
