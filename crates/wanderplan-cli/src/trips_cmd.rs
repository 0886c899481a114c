//! `wanderplan trips`: list a user's saved suggestions.

use anyhow::Result;

use wanderplan_store::JsonTripStore;

use crate::config::WanderplanConfig;
use crate::generate_cmd::print_trip;

/// List the trips last saved for `user_id`.
pub async fn run_trips(config: &WanderplanConfig, user_id: &str) -> Result<()> {
    let store = JsonTripStore::new(&config.store);
    let Some(record) = store.load_record(user_id).await? else {
        println!("No saved trips for {user_id}.");
        return Ok(());
    };

    println!(
        "{} trip(s) for {user_id}, saved {}",
        record.trips.len(),
        record.saved_at.to_rfc3339()
    );
    for (i, trip) in record.trips.iter().enumerate() {
        print_trip(i + 1, trip);
    }
    Ok(())
}
