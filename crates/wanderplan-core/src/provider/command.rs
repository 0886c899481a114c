//! Subprocess-backed collaborators.
//!
//! [`CommandModel`] pipes the prompt into an external command's stdin and
//! treats its stdout as the model text. [`CommandPlaceLookup`] passes the
//! query as the last argument and reads a photo reference from stdout.
//! Both let any CLI wrapper around a hosted API stand in for the model or
//! the place directory.

use std::process::Stdio;
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::trait_def::{ModelClient, ModelResponse, PlaceLookup};
use crate::error::ModelError;

/// First HTTP-like error status mentioned in a command's stderr.
static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([45]\d\d)\b").expect("valid regex"));

fn extract_status(stderr: &str) -> Option<u16> {
    STATUS_RE
        .captures(stderr)
        .and_then(|caps| caps[1].parse().ok())
}

/// Split a command line on whitespace into program and arguments.
fn split_command_line(command_line: &str) -> Result<(String, Vec<String>)> {
    let mut parts = command_line.split_whitespace().map(str::to_string);
    let program = parts.next().context("command line is empty")?;
    Ok((program, parts.collect()))
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A [`ModelClient`] that runs an external command per prompt.
#[derive(Debug, Clone)]
pub struct CommandModel {
    program: String,
    args: Vec<String>,
}

impl CommandModel {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from a whitespace-separated command line such as
    /// `"llm -m gemini-1.5-flash"`.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let (program, args) = split_command_line(command_line)?;
        Ok(Self { program, args })
    }
}

#[async_trait]
impl ModelClient for CommandModel {
    async fn send_prompt(&self, prompt: &str) -> Result<ModelResponse, ModelError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                ModelError::new(format!("failed to spawn model command '{}': {e}", self.program))
            })?;

        let stdin = child.stdin.take();
        let feed = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(prompt.as_bytes()).await {
                // The command may answer without reading its input.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!(program = %self.program, "model command closed stdin early");
                    Ok(())
                }
                result => result,
            }
        };

        // Feed stdin while draining stdout so a chatty command cannot stall
        // on a full pipe.
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output.map_err(|e| ModelError::new(format!("model command failed: {e}")))?;
        fed.map_err(|e| ModelError::new(format!("failed to write prompt to model command: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("model command exited with {}", output.status)
            } else {
                stderr.to_string()
            };
            return Err(ModelError {
                status: extract_status(stderr),
                message,
            });
        }

        Ok(ModelResponse::new(
            String::from_utf8_lossy(&output.stdout).into_owned(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Place lookup
// ---------------------------------------------------------------------------

/// A [`PlaceLookup`] that runs an external command with the query appended
/// as its last argument.
#[derive(Debug, Clone)]
pub struct CommandPlaceLookup {
    program: String,
    args: Vec<String>,
}

impl CommandPlaceLookup {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let (program, args) = split_command_line(command_line)?;
        Ok(Self { program, args })
    }
}

#[async_trait]
impl PlaceLookup for CommandPlaceLookup {
    async fn find_photo_reference(&self, query: &str) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(query)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .with_context(|| format!("failed to run place lookup command '{}'", self.program))?;

        if !output.status.success() {
            bail!(
                "place lookup command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let reference = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!reference.is_empty()).then_some(reference))
    }
}
