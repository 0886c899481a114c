//! `wanderplan prompt`: print the rendered prompt for a request.

use anyhow::Result;

use wanderplan_core::PromptTemplates;

use crate::config::WanderplanConfig;
use crate::request::RequestArgs;

/// Print the prompt that would be sent for a request.
pub fn run_prompt(config: &WanderplanConfig, args: &RequestArgs) -> Result<()> {
    let templates = PromptTemplates::from_config(&config.pipeline.templates);
    println!("{}", templates.render(&args.to_request()));
    Ok(())
}
