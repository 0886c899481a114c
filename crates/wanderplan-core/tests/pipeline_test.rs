//! End-to-end tests for single attempts and batches against scripted
//! collaborators.

use std::sync::Arc;

use wanderplan_core::{
    BatchConfig, BatchPhase, BatchScheduler, ErrorKind, GenerationError, PhotoEnricher,
    PipelineConfig, RetryPolicy, SlotStatus, TripGenerator,
};
use wanderplan_test_utils::{
    FailingPlaceLookup, Reply, ScriptedModel, StaticPlaceLookup, discover_request,
    messy_plan_text, named_request, sample_plan_json,
};

// ===========================================================================
// Helpers
// ===========================================================================

fn ok(destination: &str) -> Reply {
    Reply::text(sample_plan_json(destination))
}

fn garbage() -> Reply {
    Reply::text("I'm sorry, I can't plan that trip.")
}

fn scheduler() -> BatchScheduler {
    BatchScheduler::from_config(&PipelineConfig::default())
}

fn generator(model: Arc<ScriptedModel>) -> TripGenerator {
    TripGenerator::new(model, PhotoEnricher::new(StaticPlaceLookup::new()))
}

// ===========================================================================
// Single attempt
// ===========================================================================

#[tokio::test]
async fn messy_model_output_still_yields_a_trip() {
    let model = ScriptedModel::new([Reply::text(messy_plan_text("Porto, Portugal"))]);
    let trip = generator(model).attempt(&discover_request()).await.unwrap();

    assert_eq!(trip.name, "Porto, Portugal");
    assert_eq!(trip.description, "5-day trip to Porto, Portugal");
    assert_eq!(trip.photo_ref.as_deref(), Some("photo:Porto, Portugal"));
}

#[tokio::test]
async fn named_request_photo_uses_place_id() {
    let lookup = StaticPlaceLookup::new();
    let model = ScriptedModel::new([ok("Lisbon, Portugal")]);
    let generator = TripGenerator::new(model.clone(), PhotoEnricher::new(lookup.clone()));

    let request = named_request();
    let trip = generator.attempt(&request).await.unwrap();

    assert_eq!(lookup.queries().await, vec![request.place_id.clone().unwrap()]);
    assert!(trip.photo_ref.unwrap().starts_with("photo:ChIJ"));

    let prompts = model.prompts().await;
    assert!(prompts[0].starts_with("Generate a travel plan for Lisbon, Portugal for 3 days and 2 nights"));
}

#[tokio::test]
async fn failing_photo_lookup_does_not_fail_the_trip() {
    let model = ScriptedModel::new([ok("Lisbon, Portugal")]);
    let generator = TripGenerator::new(model, PhotoEnricher::new(Arc::new(FailingPlaceLookup)));

    let trip = generator.attempt(&named_request()).await.unwrap();
    assert!(trip.photo_ref.is_none());
    assert_eq!(trip.description, "A few days exploring Lisbon, Portugal.");
}

#[tokio::test]
async fn empty_photo_lookup_yields_null_photo() {
    let model = ScriptedModel::new([ok("Lisbon, Portugal")]);
    let generator = TripGenerator::new(model, PhotoEnricher::new(StaticPlaceLookup::empty()));
    let trip = generator.attempt(&named_request()).await.unwrap();
    assert!(trip.photo_ref.is_none());
}

#[tokio::test]
async fn typed_view_reads_generated_plan() {
    let model = ScriptedModel::new([ok("Lisbon, Portugal")]);
    let trip = generator(model).attempt(&named_request()).await.unwrap();

    let plan = trip.travel_plan().unwrap();
    assert_eq!(plan.destination.as_deref(), Some("Lisbon, Portugal"));
    assert_eq!(plan.hotels.len(), 1);
    assert_eq!(plan.itinerary[0].places[0].place_name.as_deref(), Some("Belem Tower"));
}

// ===========================================================================
// Batches
// ===========================================================================

#[tokio::test(start_paused = true)]
async fn one_failing_slot_of_three_leaves_one_hole() {
    let model = ScriptedModel::new([
        ok("Lisbon, Portugal"),
        garbage(),
        garbage(),
        garbage(),
        ok("Porto, Portugal"),
    ]);
    let scheduler = scheduler();

    let trips = scheduler
        .generate_batch(&generator(model.clone()), &named_request())
        .await
        .unwrap();

    assert_eq!(trips.len(), 3);
    assert_eq!(trips.iter().filter(|t| t.is_none()).count(), 1);
    assert!(trips[1].is_none());
    assert_eq!(trips[2].as_ref().unwrap().name, "Porto, Portugal");
    assert_eq!(model.calls(), 5);

    let progress = scheduler.progress();
    assert_eq!(progress.count(SlotStatus::Completed), 2);
    assert_eq!(progress.count(SlotStatus::Error), 1);
    assert_eq!(progress.completed, 3);
    assert_eq!(progress.phase, BatchPhase::Success);
}

#[tokio::test(start_paused = true)]
async fn all_failing_slots_raise_batch_exhaustion() {
    let model = ScriptedModel::always(garbage());
    let scheduler = scheduler();

    let err = scheduler
        .generate_batch(&generator(model.clone()), &named_request())
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::BatchExhaustion { count: 3 }));
    assert_eq!(err.kind(), ErrorKind::BatchExhaustion);
    assert_eq!(model.calls(), 9);
    assert_eq!(scheduler.progress().phase, BatchPhase::Error);
}

#[tokio::test(start_paused = true)]
async fn overloaded_upstream_is_retried_within_a_slot() {
    let model = ScriptedModel::new([
        Reply::status(429, "Resource has been exhausted"),
        Reply::error("The model is overloaded. Please try again later."),
        ok("Lisbon, Portugal"),
        ok("Sintra, Portugal"),
    ]);
    let scheduler = BatchScheduler::new(
        BatchConfig {
            count: 2,
            ..Default::default()
        },
        RetryPolicy::default(),
    );

    let trips = scheduler
        .generate_batch(&generator(model.clone()), &named_request())
        .await
        .unwrap();

    assert!(trips.iter().all(Option::is_some));
    assert_eq!(model.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn transport_failure_is_not_retried() {
    let model = ScriptedModel::with_fallback(
        [Reply::status(400, "API key not valid")],
        ok("Lisbon, Portugal"),
    );
    let scheduler = scheduler();

    let trips = scheduler
        .generate_batch(&generator(model.clone()), &named_request())
        .await
        .unwrap();

    assert!(trips[0].is_none());
    assert!(trips[1].is_some() && trips[2].is_some());
    assert_eq!(model.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn hung_model_times_out_the_slot() {
    let model = ScriptedModel::with_fallback([Reply::Hang], ok("Lisbon, Portugal"));
    let scheduler = BatchScheduler::new(
        BatchConfig {
            count: 2,
            per_item_timeout_ms: 30_000,
            ..Default::default()
        },
        RetryPolicy::default(),
    );

    let trips = scheduler
        .generate_batch(&generator(model.clone()), &discover_request())
        .await
        .unwrap();

    assert!(trips[0].is_none());
    assert!(trips[1].is_some());
    assert_eq!(model.calls(), 2);
    assert_eq!(
        scheduler.progress().statuses,
        vec![SlotStatus::Error, SlotStatus::Completed]
    );
}

#[tokio::test(start_paused = true)]
async fn every_trip_in_a_batch_has_a_distinct_id() {
    let model = ScriptedModel::always(ok("Lisbon, Portugal"));
    let trips = scheduler()
        .generate_batch(&generator(model), &named_request())
        .await
        .unwrap();

    let mut ids: Vec<_> = trips.iter().flatten().map(|t| t.id.clone()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}
