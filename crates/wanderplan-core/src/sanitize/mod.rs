//! Repair and decode free-form model output into a JSON object.
//!
//! Decoding runs as an ordered cascade: the raw text is tried first, then
//! each [`RepairPass`] is applied on top of the previous result and the
//! text is re-decoded after every pass that changed it. The first
//! successful decode wins. When every pass is exhausted the caller gets a
//! [`GenerationError::Parse`] carrying the untouched input, never the
//! unparsed text as if it were a success.

pub mod passes;

use serde_json::Value;
use tracing::debug;

use crate::error::GenerationError;

pub use passes::{EXTRACTION_PASSES, REPAIR_PASSES, RepairPass};

/// Isolate the JSON object candidate in `raw` without syntax repair:
/// strip a code fence, normalize whitespace, slice to the outer braces.
pub fn extract_json(raw: &str) -> String {
    EXTRACTION_PASSES
        .iter()
        .fold(raw.to_string(), |text, pass| (pass.apply)(&text))
}

/// Decode `raw` into a JSON object, repairing it as needed.
pub fn parse(raw: &str) -> Result<Value, GenerationError> {
    let mut last_error = match decode_object(raw) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let mut text = raw.to_string();
    for pass in EXTRACTION_PASSES.iter().chain(REPAIR_PASSES.iter()) {
        let repaired = (pass.apply)(&text);
        if repaired == text {
            continue;
        }
        text = repaired;
        match decode_object(&text) {
            Ok(value) => {
                debug!(pass = pass.name, "model output decoded after repair");
                return Ok(value);
            }
            Err(e) => last_error = e,
        }
    }

    Err(GenerationError::Parse {
        message: last_error,
        raw: raw.to_string(),
    })
}

fn decode_object(text: &str) -> Result<Value, String> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err("expected a JSON object at the top level".to_string()),
        Err(e) => Err(e.to_string()),
    }
}
