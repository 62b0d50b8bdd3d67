//! Output formatting for CLI commands.

use std::fmt::Write;

use serde::Serialize;

use crate::agent::BudgetBreakdown;
use crate::core::{Category, TripState};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; unknown names fall back to text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

/// Formats a finished planning session.
#[must_use]
pub fn format_plan(state: &TripState, budget: Option<&BudgetBreakdown>, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = state.final_plan.clone().unwrap_or_default();
            out.push_str("\n\n---\nResearch: ");
            let counts: Vec<String> = Category::ALL
                .into_iter()
                .map(|c| format!("{} {}", state.research.count(c), c.key()))
                .collect();
            out.push_str(&counts.join(", "));
            if !state.failed_agents.is_empty() {
                let _ = write!(out, "\nIncomplete: {}", state.failed_agents.join(", "));
            }
            if let Some(budget) = budget.filter(|b| b.over_budget()) {
                let _ = write!(
                    out,
                    "\nWarning: estimated ${:.2} per person exceeds the ${:.2} budget",
                    budget.estimated(),
                    budget.cap()
                );
            }
            out.push('\n');
            out
        }
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "trip_request": state.trip_request,
            "research": state.research,
            "failed_agents": state.failed_agents,
            "final_plan": state.final_plan,
            "budget_breakdown": state.budget_breakdown,
            "over_budget": budget.is_some_and(BudgetBreakdown::over_budget),
        })),
    }
}

/// Formats the result of `init-prompts`.
#[must_use]
pub fn format_init_prompts(
    dir: &std::path::Path,
    written: &[std::path::PathBuf],
    format: OutputFormat,
) -> String {
    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return format!("All prompt templates already exist in: {}\n", dir.display());
            }
            let mut output = format!(
                "Wrote {} prompt template(s) to: {}\n",
                written.len(),
                dir.display()
            );
            for path in written {
                let _ = writeln!(
                    output,
                    "  {}",
                    path.file_name()
                        .and_then(|n| n.to_str())
                        .unwrap_or("unknown")
                );
            }
            output.push_str("\nEdit these files to customize agent system prompts.\n");
            output
        }
        OutputFormat::Json => format.to_json(&serde_json::json!({
            "directory": dir.to_string_lossy(),
            "written": written.iter().map(|p| p.to_string_lossy().into_owned()).collect::<Vec<_>>(),
            "count": written.len(),
        })),
    }
}
