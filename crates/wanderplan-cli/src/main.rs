mod config;
mod generate_cmd;
mod parse_cmd;
mod prompt_cmd;
mod request;
mod trips_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use config::{Overrides, WanderplanConfig};
use request::RequestArgs;

#[derive(Parser)]
#[command(name = "wanderplan", about = "AI trip plan generator")]
struct Cli {
    /// Directory for saved trips (overrides WANDERPLAN_DATA_DIR env var)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default wanderplan config file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Print the prompt for a travel request without calling a model
    Prompt {
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Repair and validate saved model output, printing the plan as JSON
    Parse {
        /// File holding raw model output, or - for stdin
        input: String,
    },
    /// Generate a batch of trips
    Generate {
        #[command(flatten)]
        request: RequestArgs,
        /// Number of trips to generate
        #[arg(long)]
        count: Option<usize>,
        /// Model command; reads the prompt on stdin, writes the reply to stdout
        #[arg(long)]
        model_cmd: Option<String>,
        /// Photo lookup command; gets the place as its last argument
        #[arg(long)]
        photo_cmd: Option<String>,
        /// Save the generated trips as this user's suggestions
        #[arg(long)]
        user: Option<String>,
    },
    /// Show the trips last saved for a user
    Trips {
        /// User ID
        #[arg(long)]
        user: String,
    },
}

/// Execute the `wanderplan init` command: write config file.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    config::save_config(&config::ConfigFile::default())?;

    println!("Config written to {}", path.display());
    println!();
    println!("Next: set [model] command (or {}) to a command that", config::MODEL_CMD_ENV);
    println!("reads a prompt on stdin and prints the model's reply.");

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => {
            cmd_init(force)?;
        }
        Commands::Prompt { request } => {
            let resolved = WanderplanConfig::resolve(Overrides::default())?;
            prompt_cmd::run_prompt(&resolved, &request)?;
        }
        Commands::Parse { input } => {
            parse_cmd::run_parse(&input)?;
        }
        Commands::Generate {
            request,
            count,
            model_cmd,
            photo_cmd,
            user,
        } => {
            let resolved = WanderplanConfig::resolve(Overrides {
                model_cmd,
                photo_cmd,
                data_dir: cli.data_dir,
                count,
            })?;
            generate_cmd::run_generate(&resolved, &request, user.as_deref()).await?;
        }
        Commands::Trips { user } => {
            let resolved = WanderplanConfig::resolve(Overrides {
                data_dir: cli.data_dir,
                ..Default::default()
            })?;
            trips_cmd::run_trips(&resolved, &user).await?;
        }
    }

    Ok(())
}
