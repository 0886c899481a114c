//! `wanderplan parse`: run saved model output through repair and
//! validation, without calling a model.

use std::io::Read;

use anyhow::{Context, Result};

use wanderplan_core::{GenerationError, sanitize, validate};

/// Read raw model text from `input` (`-` for stdin), repair it, validate
/// it, and print the decoded plan as pretty JSON.
pub fn run_parse(input: &str) -> Result<()> {
    let raw = read_input(input)?;
    let plan = sanitize::parse(&raw)?;
    validate::check(&plan).map_err(GenerationError::InvalidStructure)?;
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read model output from stdin")?;
        Ok(raw)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))
    }
}
