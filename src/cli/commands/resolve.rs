//! kr resolve - Resolve scored candidates into a load plan

use std::path::PathBuf;

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, robot_ok};
use crate::error::{KrError, Result};
use crate::resolver::{Candidate, LoadPlan, RejectReason};
use crate::session::SessionState;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Candidates as `id`, `id:level`, or `id:level:score`. Equal scores
    /// keep argument order, so bare ids rank in the order given.
    pub candidates: Vec<String>,

    /// Read candidates as a JSON array instead of positional arguments
    #[arg(long, conflicts_with = "candidates")]
    pub candidates_json: Option<PathBuf>,

    /// Session identifier
    #[arg(long, default_value = "default")]
    pub session: String,

    /// Task description (recorded in logs only)
    #[arg(long, default_value = "")]
    pub task: String,

    /// Budget ceiling for a fresh session (defaults to config)
    #[arg(long)]
    pub ceiling: Option<u64>,

    /// Persist session state to this file, restoring it first if present
    #[arg(long)]
    pub state: Option<PathBuf>,
}

pub fn run(ctx: &AppContext, args: &ResolveArgs) -> Result<()> {
    let candidates = gather_candidates(args)?;
    let engine = ctx.engine();

    if let Some(path) = &args.state {
        if path.exists() {
            engine.restore_session(&args.session, SessionState::load(path)?)?;
            debug!(target: "resolve", state = %path.display(), "session restored");
        } else if let Some(ceiling) = args.ceiling {
            engine.open_session(&args.session, ceiling);
        }
    } else if let Some(ceiling) = args.ceiling {
        engine.open_session(&args.session, ceiling);
    }

    let plan = engine.resolve(&args.session, &args.task, &candidates);

    if let Some(path) = &args.state {
        if let Some(state) = engine.session_state(&args.session) {
            state.save(path)?;
        }
    }

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(&plan)),
        OutputFormat::Human => {
            emit_human(human_plan(&plan));
            Ok(())
        }
    }
}

fn gather_candidates(args: &ResolveArgs) -> Result<Vec<Candidate>> {
    if let Some(path) = &args.candidates_json {
        let raw = std::fs::read_to_string(path).map_err(|err| {
            KrError::Config(format!("read candidates {}: {err}", path.display()))
        })?;
        return serde_json::from_str(&raw).map_err(|err| {
            KrError::Config(format!("parse candidates {}: {err}", path.display()))
        });
    }
    args.candidates.iter().map(|raw| parse_candidate(raw)).collect()
}

/// Parse `id`, `id:level`, or `id:level:score`.
fn parse_candidate(raw: &str) -> Result<Candidate> {
    let mut parts = raw.splitn(3, ':');
    let module_id = parts
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| KrError::Config(format!("empty candidate in '{raw}'")))?
        .to_string();

    let requested_level = match parts.next() {
        Some(level) => level
            .parse::<u8>()
            .map_err(|_| KrError::Config(format!("bad tier level in '{raw}'")))?,
        None => 1,
    };

    let score = match parts.next() {
        Some(score) => score
            .parse::<f64>()
            .map_err(|_| KrError::Config(format!("bad score in '{raw}'")))?,
        None => 0.0,
    };

    Ok(Candidate {
        module_id,
        score,
        requested_level,
    })
}

fn human_plan(plan: &LoadPlan) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout.section(&format!(
        "Load plan ({} entries, cost {})",
        plan.entries.len(),
        plan.total_cost
    ));
    for entry in &plan.entries {
        layout.push_line(format!(
            "{:<24} L{}  cost {}",
            entry.module_id, entry.level, entry.cost
        ));
    }
    if !plan.rejected.is_empty() {
        layout.blank().section("Rejected");
        for rejected in &plan.rejected {
            let reason = match rejected.reason {
                RejectReason::BudgetExhausted => "budget exhausted",
                RejectReason::UnknownModule => "unknown module",
            };
            layout.push_line(format!("{:<24} {}", rejected.module_id, reason));
        }
    }
    layout
}
