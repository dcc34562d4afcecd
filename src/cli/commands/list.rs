//! kr list - List modules in the store

use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::manifest::ModuleKind;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by kind: agent, skill, command
    #[arg(long)]
    pub kind: Option<ModuleKind>,
}

#[derive(Serialize)]
struct ListEntry {
    id: String,
    kind: ModuleKind,
    name: String,
    tiers: usize,
    total_cost: u64,
    requires: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &ListArgs) -> Result<()> {
    debug!(target: "list", mode = ?ctx.output_format, "output mode selected");

    let entries: Vec<ListEntry> = ctx
        .store
        .manifests()
        .into_iter()
        .filter(|m| args.kind.is_none_or(|kind| m.kind == kind))
        .map(|m| ListEntry {
            id: m.id.clone(),
            kind: m.kind,
            name: m.name.clone(),
            tiers: m.tiers.len(),
            total_cost: m.total_cost(),
            requires: m.requires.clone(),
        })
        .collect();

    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(entries)),
        OutputFormat::Human => {
            let mut layout = HumanLayout::new();
            layout.section(&format!("Modules ({})", entries.len()));
            for entry in &entries {
                let deps = if entry.requires.is_empty() {
                    String::new()
                } else {
                    format!("  requires {}", entry.requires.join(", "))
                };
                layout.push_line(format!(
                    "{:<24} {:<8} {} tier(s), cost {}{}",
                    entry.id, entry.kind, entry.tiers, entry.total_cost, deps
                ));
            }
            emit_human(layout);
            Ok(())
        }
    }
}
