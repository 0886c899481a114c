//! A single generation attempt: prompt, call, repair, validate, enrich.
//!
//! No retries happen here. One call either yields a [`Trip`] or fails with
//! exactly one [`GenerationError`]; the retry loop decides what to do next.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use crate::error::{GenerationError, classify_model_error};
use crate::photo::PhotoEnricher;
use crate::prompt::PromptTemplates;
use crate::provider::ModelClient;
use crate::sanitize;
use crate::types::{GenerationRequest, Trip};
use crate::validate;

/// Runs single generation attempts against a model.
#[derive(Clone)]
pub struct TripGenerator {
    model: Arc<dyn ModelClient>,
    enricher: PhotoEnricher,
    templates: PromptTemplates,
}

impl std::fmt::Debug for TripGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TripGenerator")
            .field("enricher", &self.enricher)
            .finish_non_exhaustive()
    }
}

impl TripGenerator {
    /// A generator using the built-in prompt templates.
    pub fn new(model: Arc<dyn ModelClient>, enricher: PhotoEnricher) -> Self {
        Self {
            model,
            enricher,
            templates: PromptTemplates::default(),
        }
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    /// The prompt this generator sends for `request`.
    pub fn prompt_for(&self, request: &GenerationRequest) -> String {
        self.templates.render(request)
    }

    /// Make one attempt at generating a trip for `request`.
    pub async fn attempt(&self, request: &GenerationRequest) -> Result<Trip, GenerationError> {
        let prompt = self.prompt_for(request);
        debug!(mode = ?request.mode(), prompt_len = prompt.len(), "sending prompt");

        let response = self
            .model
            .send_prompt(&prompt)
            .await
            .map_err(classify_model_error)?;

        let raw = response.text();
        if raw.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }

        let plan = sanitize::parse(raw)?;
        validate::check(&plan).map_err(GenerationError::InvalidStructure)?;

        let destination = plan_text(&plan, "destination").unwrap_or_default();
        let photo_query = request.known_place_query().unwrap_or(destination.as_str());
        let photo_ref = self.enricher.resolve_photo_ref(photo_query).await;

        let description = plan_text(&plan, "destinationDescription")
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("{}-day trip to {destination}", request.total_days));

        let trip = Trip::new(destination, description, photo_ref, plan);
        info!(trip_id = %trip.id, destination = %trip.name, has_photo = trip.photo_ref.is_some(), "trip generated");
        Ok(trip)
    }
}

fn plan_text(plan: &Value, field: &str) -> Option<String> {
    plan.get("travelPlan")?
        .get(field)?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, ModelError};
    use crate::provider::{ModelResponse, PlaceLookup};
    use crate::validate::StructureIssue;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Answers every prompt with the same canned result and records the
    /// prompts it saw.
    struct CannedModel {
        reply: Result<String, ModelError>,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedModel {
        fn new(reply: Result<&str, ModelError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelClient for CannedModel {
        async fn send_prompt(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map(ModelResponse::new)
        }
    }

    /// Echoes the query back as the photo reference.
    struct EchoLookup;

    #[async_trait]
    impl PlaceLookup for EchoLookup {
        async fn find_photo_reference(&self, query: &str) -> anyhow::Result<Option<String>> {
            Ok(Some(format!("photo:{query}")))
        }
    }

    const PLAN: &str = r#"{"travelPlan": {"destination": "Lisbon, Portugal", "destinationDescription": "Hills and trams.", "itinerary": []}}"#;

    fn named() -> GenerationRequest {
        GenerationRequest {
            destination_name: Some("Lisbon".to_string()),
            place_id: Some("place-42".to_string()),
            total_days: 3,
            total_nights: 2,
            ..Default::default()
        }
    }

    fn discover() -> GenerationRequest {
        GenerationRequest {
            destination_type: Some("Beach".to_string()),
            total_days: 5,
            total_nights: 4,
            ..Default::default()
        }
    }

    fn generator(model: Arc<CannedModel>) -> TripGenerator {
        TripGenerator::new(model, PhotoEnricher::new(Arc::new(EchoLookup)))
    }

    #[tokio::test]
    async fn successful_attempt_builds_trip() {
        let model = CannedModel::new(Ok(PLAN));
        let trip = generator(model.clone()).attempt(&named()).await.unwrap();

        assert_eq!(trip.name, "Lisbon, Portugal");
        assert_eq!(trip.description, "Hills and trams.");
        assert_eq!(trip.trip_plan["travelPlan"]["destination"], "Lisbon, Portugal");
        assert!(!trip.id.is_empty());

        let prompts = model.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("travel plan for Lisbon for 3 days and 2 nights"));
    }

    #[tokio::test]
    async fn named_path_looks_up_known_place_id() {
        let trip = generator(CannedModel::new(Ok(PLAN)))
            .attempt(&named())
            .await
            .unwrap();
        assert_eq!(trip.photo_ref.as_deref(), Some("photo:place-42"));
    }

    #[tokio::test]
    async fn discover_path_looks_up_model_destination() {
        let trip = generator(CannedModel::new(Ok(PLAN)))
            .attempt(&discover())
            .await
            .unwrap();
        assert_eq!(trip.photo_ref.as_deref(), Some("photo:Lisbon, Portugal"));
    }

    #[tokio::test]
    async fn missing_description_falls_back_to_summary() {
        let plan = r#"{"travelPlan": {"destination": "Bali", "itinerary": []}}"#;
        let trip = generator(CannedModel::new(Ok(plan)))
            .attempt(&discover())
            .await
            .unwrap();
        assert_eq!(trip.description, "5-day trip to Bali");
    }

    #[tokio::test]
    async fn each_attempt_gets_a_fresh_id() {
        let generator = generator(CannedModel::new(Ok(PLAN)));
        let a = generator.attempt(&named()).await.unwrap();
        let b = generator.attempt(&named()).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn whitespace_response_is_empty() {
        let err = generator(CannedModel::new(Ok("  \n ")))
            .attempt(&named())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyResponse);
    }

    #[tokio::test]
    async fn garbage_response_is_parse_error() {
        let err = generator(CannedModel::new(Ok("no plan today")))
            .attempt(&named())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.raw_text(), Some("no plan today"));
    }

    #[tokio::test]
    async fn wrong_shape_is_invalid_structure() {
        let err = generator(CannedModel::new(Ok(r#"{"travelPlan": {"destination": "Rome"}}"#)))
            .attempt(&named())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidStructure(StructureIssue::ItineraryNotArray)
        ));
    }

    #[tokio::test]
    async fn model_errors_are_classified() {
        let err = generator(CannedModel::new(Err(ModelError::with_status(503, "busy"))))
            .attempt(&named())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamOverload);

        let err = generator(CannedModel::new(Err(ModelError::new("invalid api key"))))
            .attempt(&named())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test]
    async fn custom_templates_are_used() {
        let model = CannedModel::new(Ok(PLAN));
        let generator = generator(model.clone()).with_templates(PromptTemplates {
            discover: "find {destinationType}".to_string(),
            named: "plan {name}".to_string(),
        });
        assert_eq!(generator.prompt_for(&discover()), "find Beach");
        generator.attempt(&named()).await.unwrap();
        assert_eq!(model.prompts.lock().unwrap()[0], "plan Lisbon");
    }
}
