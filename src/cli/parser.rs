//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Trip planner: collects trip requirements, researches flights, hotels,
/// dining, activities, events, and local transport in parallel, and writes
/// a budgeted itinerary.
#[derive(Parser, Debug)]
#[command(name = "trip-planner")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose (debug) logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Directory containing prompt template files.
    ///
    /// Defaults to `~/.config/trip-planner/prompts/`.
    #[arg(long, env = "TRIP_PROMPT_DIR", global = true)]
    pub prompt_dir: Option<PathBuf>,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Model and concurrency overrides shared by the planning commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Model for extraction, query refinement, and collection.
    #[arg(long)]
    pub model: Option<String>,

    /// Model for the final plan.
    #[arg(long)]
    pub synthesizer_model: Option<String>,

    /// Maximum research agents running at once.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Per-call timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Web search backend (tavily, brave).
    #[arg(long)]
    pub search_backend: Option<String>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Plan a trip from complete details, skipping the conversation.
    ///
    /// Runs all six research agents and prints the final plan with its
    /// budget breakdown. Requires an OpenAI-compatible API key and a web
    /// search key (Tavily or Brave).
    #[command(after_help = r#"Examples:
  trip-planner plan --from NYC --to Paris --people 2 \
      --start 2025-06-01 --end 2025-06-08 --budget 2000
  trip-planner plan --from Boston --to Lisbon --start 2025-09-10 --end 2025-09-14 \
      --budget 1500 --interests "food, fado"
  trip-planner --format json plan ... | jq '.budget_breakdown'
"#)]
    Plan {
        /// Departure city.
        #[arg(long = "from")]
        origin: String,

        /// Destination city.
        #[arg(long = "to")]
        destination: String,

        /// Number of travelers.
        #[arg(long = "people", default_value = "1")]
        num_people: u32,

        /// Departure date (YYYY-MM-DD).
        #[arg(long = "start")]
        start_date: String,

        /// Return date (YYYY-MM-DD).
        #[arg(long = "end")]
        end_date: String,

        /// Total budget per person in USD.
        #[arg(long = "budget")]
        budget_per_person: f64,

        /// Free-form interests (e.g., "art, jazz").
        #[arg(long)]
        interests: Option<String>,

        #[command(flatten)]
        models: ModelArgs,
    },

    /// Plan a trip through an interactive conversation on stdin.
    ///
    /// Type `exit` or send EOF to stop.
    Chat {
        #[command(flatten)]
        models: ModelArgs,
    },

    /// Serve the planner over HTTP.
    #[cfg(feature = "server")]
    #[command(after_help = r#"Examples:
  trip-planner serve                         # http://127.0.0.1:8000
  trip-planner serve --host 0.0.0.0 --port 9000
  curl -X POST localhost:8000/plan -H 'content-type: application/json' \
      -d '{"message": "NYC to Paris in June", "session_id": "abc"}'
"#)]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind.
        #[arg(long, default_value = "8000")]
        port: u16,

        #[command(flatten)]
        models: ModelArgs,
    },

    /// Write default prompt templates to disk for customization.
    ///
    /// Existing files are left untouched.
    #[command(name = "init-prompts")]
    #[command(after_help = r#"Examples:
  trip-planner init-prompts                    # Write to ~/.config/trip-planner/prompts/
  trip-planner init-prompts --dir ./prompts    # Write to custom directory
"#)]
    InitPrompts {
        /// Target directory for prompt templates.
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}
