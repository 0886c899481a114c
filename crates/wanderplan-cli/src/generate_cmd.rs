//! `wanderplan generate`: run one batch against an external model command.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use wanderplan_core::provider::{CommandModel, CommandPlaceLookup};
use wanderplan_core::{
    BatchScheduler, PhotoEnricher, PromptTemplates, Trip, TripGenerator, TripStore,
};
use wanderplan_store::JsonTripStore;

use crate::config::{MODEL_CMD_ENV, WanderplanConfig};
use crate::request::RequestArgs;

pub async fn run_generate(
    config: &WanderplanConfig,
    args: &RequestArgs,
    user: Option<&str>,
) -> Result<()> {
    let model_cmd = config.model_cmd.as_deref().with_context(|| {
        format!(
            "no model command configured; pass --model-cmd, set {MODEL_CMD_ENV}, \
             or add [model] command to the config file"
        )
    })?;
    let model = CommandModel::from_command_line(model_cmd)?;

    let store = JsonTripStore::new(&config.store);
    if let Some(user_id) = user {
        store.user_file(user_id)?;
    }

    let enricher = match config.photo_cmd.as_deref() {
        Some(cmd) => PhotoEnricher::new(Arc::new(CommandPlaceLookup::from_command_line(cmd)?)),
        None => PhotoEnricher::disabled(),
    };

    let generator = TripGenerator::new(Arc::new(model), enricher)
        .with_templates(PromptTemplates::from_config(&config.pipeline.templates));
    let scheduler = BatchScheduler::from_config(&config.pipeline);
    let request = args.to_request();

    let mut progress = scheduler.subscribe();
    let reporter = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let snapshot = progress.borrow_and_update().clone();
            eprintln!("progress: {snapshot}");
            if snapshot.is_finished() {
                break;
            }
        }
    });

    let result = scheduler.generate_batch(&generator, &request).await;
    drop(scheduler);
    join_reporter(reporter).await;
    let trips = result?;

    print_trips(&trips);

    if let Some(user_id) = user {
        let generated: Vec<Trip> = trips.into_iter().flatten().collect();
        store.save_trips(user_id, &generated).await?;
        info!(user_id, count = generated.len(), "suggestions saved");
        println!(
            "Saved {} trip(s) for {user_id} under {}",
            generated.len(),
            store.root().display()
        );
    }

    Ok(())
}

/// Wait for the progress reporter. A failed reporter only loses progress
/// lines, so it is logged rather than returned.
async fn join_reporter(reporter: JoinHandle<()>) -> bool {
    match reporter.await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "progress reporter task failed");
            false
        }
    }
}

fn print_trips(trips: &[Option<Trip>]) {
    let generated = trips.iter().filter(|t| t.is_some()).count();
    println!("Generated {generated} of {} trip(s)", trips.len());
    for (i, trip) in trips.iter().enumerate() {
        match trip {
            Some(trip) => print_trip(i + 1, trip),
            None => println!("\n[{}] failed", i + 1),
        }
    }
}

pub fn print_trip(position: usize, trip: &Trip) {
    println!("\n[{position}] {}  ({})", trip.name, trip.id);
    println!("    {}", trip.description);
    if let Some(photo) = &trip.photo_ref {
        println!("    photo: {photo}");
    }
    if let Ok(plan) = trip.travel_plan() {
        println!(
            "    {} hotel(s), {} itinerary day(s)",
            plan.hotels.len(),
            plan.itinerary.len()
        );
    }
}
