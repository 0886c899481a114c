//! Travel request flags shared by `prompt` and `generate`.

use clap::{ArgGroup, Args};

use wanderplan_core::GenerationRequest;

#[derive(Debug, Clone, Args)]
#[command(group(
    ArgGroup::new("target")
        .required(true)
        .args(["name", "destination_type"]),
))]
pub struct RequestArgs {
    /// Plan a trip to this place (e.g. "Lisbon, Portugal")
    #[arg(long)]
    pub name: Option<String>,
    /// Let the model pick a destination of this kind (e.g. Beach, City)
    #[arg(long)]
    pub destination_type: Option<String>,
    /// Stable place identifier for --name, used for the photo lookup
    #[arg(long, requires = "name", conflicts_with = "destination_type")]
    pub place_id: Option<String>,
    /// Trip length in days
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub days: u32,
    /// Number of nights (defaults to days - 1)
    #[arg(long)]
    pub nights: Option<u32>,
    /// Who is travelling (e.g. Solo, Couple, Family)
    #[arg(long, default_value = "Solo")]
    pub who: String,
    /// Budget level (e.g. Cheap, Moderate, Luxury)
    #[arg(long, default_value = "Moderate")]
    pub budget: String,
    /// Activity level (e.g. Relaxed, Balanced, Active)
    #[arg(long, default_value = "Balanced")]
    pub activity: String,
}

impl RequestArgs {
    pub fn to_request(&self) -> GenerationRequest {
        GenerationRequest {
            destination_type: self.destination_type.clone(),
            destination_name: self.name.clone(),
            place_id: self.place_id.clone(),
            total_days: self.days,
            total_nights: self.nights.unwrap_or(self.days.saturating_sub(1)),
            who_is_going: self.who.clone(),
            budget: self.budget.clone(),
            activity_level: self.activity.clone(),
        }
    }
}
