//! kr show - Show one module's manifest and tiers

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, robot_ok};
use crate::error::Result;
use crate::manifest::{ModuleKind, ModuleManifest};

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Module id
    pub id: String,

    /// Print the content of this tier level instead of the summary
    #[arg(long)]
    pub tier: Option<u8>,
}

#[derive(Serialize)]
struct ShowReport {
    id: String,
    kind: ModuleKind,
    name: String,
    description: String,
    requires: Vec<String>,
    triggers: Vec<String>,
    tiers: Vec<TierReport>,
}

#[derive(Serialize)]
struct TierReport {
    level: u8,
    cost: u32,
    content: String,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    let manifest = ctx.store.manifest(&args.id)?;

    if let Some(level) = args.tier {
        let content = ctx.store.tier_content(&args.id, level)?;
        match ctx.output_format {
            OutputFormat::Json => emit_json(&robot_ok(serde_json::json!({
                "id": args.id,
                "level": level,
                "content": content.as_ref(),
            }))),
            OutputFormat::Human => {
                println!("{content}");
                Ok(())
            }
        }
    } else {
        match ctx.output_format {
            OutputFormat::Json => emit_json(&robot_ok(report(manifest))),
            OutputFormat::Human => {
                emit_human(human_summary(manifest));
                Ok(())
            }
        }
    }
}

fn report(manifest: &ModuleManifest) -> ShowReport {
    ShowReport {
        id: manifest.id.clone(),
        kind: manifest.kind,
        name: manifest.name.clone(),
        description: manifest.description.clone(),
        requires: manifest.requires.clone(),
        triggers: manifest.triggers.clone(),
        tiers: manifest
            .tiers
            .iter()
            .map(|t| TierReport {
                level: t.level,
                cost: t.cost,
                content: t.content.clone(),
            })
            .collect(),
    }
}

fn human_summary(manifest: &ModuleManifest) -> HumanLayout {
    let mut layout = HumanLayout::new();
    layout
        .title(&format!("{} ({})", manifest.id, manifest.kind))
        .kv("name", &manifest.name)
        .kv("description", &manifest.description)
        .kv("requires", &manifest.requires.join(", "))
        .kv("triggers", &manifest.triggers.join(", "))
        .blank()
        .section("Tiers");
    for tier in &manifest.tiers {
        layout.push_line(format!(
            "L{}  cost {:<6} {}",
            tier.level, tier.cost, tier.content
        ));
    }
    layout
}
