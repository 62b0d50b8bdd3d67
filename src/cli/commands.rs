//! CLI command implementations.
//!
//! Async work runs on a runtime created per command; the return value is
//! the text written to stdout by `main`.

use std::io::{self, Write as IoWrite};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::{AgentConfig, BudgetBreakdown, PromptSet, TripPlanner};
use crate::cli::output::{OutputFormat, format_init_prompts, format_plan};
use crate::cli::parser::{Cli, Commands, ModelArgs};
use crate::core::{TripRequest, TripState};
use crate::error::{CommandError, Result};
use crate::search::{SearchProvider, WebSearchProvider};

/// Words that end an interactive chat.
const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

/// Executes the parsed command.
///
/// # Errors
///
/// Returns an error if configuration is incomplete or the command fails.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Plan {
            origin,
            destination,
            num_people,
            start_date,
            end_date,
            budget_per_person,
            interests,
            models,
        } => {
            let request = TripRequest::new(
                origin.as_str(),
                destination.as_str(),
                *num_people,
                start_date,
                end_date,
                *budget_per_person,
                interests.clone(),
            )?;
            cmd_plan(cli, request, models, format)
        }
        Commands::Chat { models } => cmd_chat(cli, models, format),
        #[cfg(feature = "server")]
        Commands::Serve { host, port, models } => cmd_serve(cli, host, *port, models),
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Resolves configuration from the environment plus CLI overrides.
fn build_config(cli: &Cli, models: &ModelArgs) -> Result<AgentConfig> {
    let mut builder = AgentConfig::builder().from_env();
    if let Some(model) = &models.model {
        builder = builder
            .extraction_model(model.as_str())
            .refiner_model(model.as_str())
            .collector_model(model.as_str());
    }
    if let Some(model) = &models.synthesizer_model {
        builder = builder.synthesizer_model(model.as_str());
    }
    if let Some(n) = models.concurrency {
        builder = builder.max_concurrency(n);
    }
    if let Some(secs) = models.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    if let Some(backend) = &models.search_backend {
        builder = builder.search_backend(backend.as_str());
    }
    if let Some(dir) = &cli.prompt_dir {
        builder = builder.prompt_dir(dir.as_path());
    }
    Ok(builder.build()?)
}

fn build_planner(config: &AgentConfig) -> Result<TripPlanner> {
    let prompts = PromptSet::load(config.prompt_dir.as_deref());
    let search: Arc<dyn SearchProvider> = Arc::new(WebSearchProvider::from_config(config)?);
    Ok(TripPlanner::from_config(config, &prompts, search)?)
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CommandError::Other(format!("Failed to create async runtime: {e}")))
}

fn cmd_plan(
    cli: &Cli,
    request: TripRequest,
    models: &ModelArgs,
    format: OutputFormat,
) -> Result<String> {
    let config = build_config(cli, models)?;
    let planner = build_planner(&config)?;

    let state = runtime()?.block_on(planner.plan(request))?;
    let budget = state
        .trip_request
        .as_ref()
        .map(|request| BudgetBreakdown::estimate(request, &state.research));

    Ok(format_plan(&state, budget.as_ref(), format))
}

fn cmd_chat(cli: &Cli, models: &ModelArgs, format: OutputFormat) -> Result<String> {
    let config = build_config(cli, models)?;
    let planner = build_planner(&config)?;
    runtime()?.block_on(chat_loop(&planner, format))
}

/// Reads messages from stdin until the plan is done or the user leaves.
async fn chat_loop(planner: &TripPlanner, format: OutputFormat) -> Result<String> {
    let mut state = TripState::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    say("Where would you like to go? (type `exit` to stop)")?;
    loop {
        prompt()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&message.to_lowercase().as_str()) {
            break;
        }

        let reply = planner.advance(&mut state, message).await?;
        if reply.done {
            break;
        }
        say(&reply.response_text)?;
    }

    if !state.is_terminal() {
        return Ok(String::new());
    }
    let budget = state
        .trip_request
        .as_ref()
        .map(|request| BudgetBreakdown::estimate(request, &state.research));
    Ok(format_plan(&state, budget.as_ref(), format))
}

fn say(text: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{text}\n")?;
    stdout.flush()
}

fn prompt() -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    write!(stdout, "> ")?;
    stdout.flush()
}

#[cfg(feature = "server")]
fn cmd_serve(cli: &Cli, host: &str, port: u16, models: &ModelArgs) -> Result<String> {
    use crate::server::{ServerState, serve};
    use crate::session::SessionStore;
    use tokio_util::sync::CancellationToken;

    let config = build_config(cli, models)?;
    let planner = build_planner(&config)?;
    let state = ServerState::new(Arc::new(planner), Arc::new(SessionStore::from_config(&config)));

    runtime()?.block_on(async {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            trigger.cancel();
        });

        serve(state, host, port, shutdown)
            .await
            .map_err(|e| CommandError::Other(format!("Server error: {e}")))
    })?;

    Ok(String::new())
}

fn cmd_init_prompts(dir: Option<&std::path::Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(std::path::PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::Other(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir)?;
    Ok(format_init_prompts(&target_dir, &written, format))
}
