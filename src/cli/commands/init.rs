//! kr init - Scaffold a module store

use std::path::{Path, PathBuf};

use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::output::{OutputFormat, emit_json, robot_ok};
use crate::error::{KrError, Result};
use crate::store::{MANIFEST_FILE, MODULES_DIR};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Initialize globally (platform data dir) instead of locally (.kr/)
    #[arg(long)]
    pub global: bool,

    /// Reinitialize even if a store already exists
    #[arg(long, short)]
    pub force: bool,

    /// Skip the sample module
    #[arg(long)]
    pub bare: bool,
}

#[derive(Serialize)]
struct InitReport {
    root: PathBuf,
    sample_module: Option<String>,
}

const SAMPLE_ID: &str = "getting-started";

pub fn run_without_context(format: OutputFormat, args: &InitArgs) -> Result<()> {
    let root = if args.global {
        dirs::data_dir()
            .ok_or_else(|| KrError::Config("data directory not found".to_string()))?
            .join("kr")
    } else {
        std::env::current_dir()?.join(".kr")
    };

    let modules_dir = root.join(MODULES_DIR);
    if modules_dir.is_dir() && !args.force {
        return Err(KrError::Config(format!(
            "store already initialized at {} (use --force to reinitialize)",
            root.display()
        )));
    }

    std::fs::create_dir_all(&modules_dir)?;
    write_default_config(&root)?;
    let sample = if args.bare {
        None
    } else {
        write_sample_module(&modules_dir)?;
        Some(SAMPLE_ID.to_string())
    };
    info!(target: "init", root = %root.display(), "store initialized");

    match format {
        OutputFormat::Json => emit_json(&robot_ok(InitReport {
            root,
            sample_module: sample,
        })),
        OutputFormat::Human => {
            println!("Initialized module store at {}", root.display());
            if sample.is_some() {
                println!("Sample module: {SAMPLE_ID} (see `kr show {SAMPLE_ID}`)");
            }
            Ok(())
        }
    }
}

fn write_default_config(root: &Path) -> Result<()> {
    let path = root.join("config.toml");
    if path.exists() {
        return Ok(());
    }
    let contents = format!(
        "[budget]\nceiling = {}\n",
        crate::config::DEFAULT_CEILING
    );
    std::fs::write(path, contents)?;
    Ok(())
}

fn write_sample_module(modules_dir: &Path) -> Result<()> {
    let dir = modules_dir.join(SAMPLE_ID);
    std::fs::create_dir_all(&dir)?;
    std::fs::write(
        dir.join(MANIFEST_FILE),
        r#"[module]
id = "getting-started"
kind = "skill"
name = "Getting Started"
description = "How kr modules and tiers work"
triggers = ["kr", "modules"]

[[tiers]]
level = 1
cost = 40
content = "tier1.md"

[[tiers]]
level = 2
cost = 160
content = "tier2.md"
"#,
    )?;
    std::fs::write(
        dir.join("tier1.md"),
        "# Getting Started\n\nModules live under modules/<id>/module.toml.\n",
    )?;
    std::fs::write(
        dir.join("tier2.md"),
        "Each [[tiers]] entry declares a disclosure level with a cost in\n\
         budget units. Tier 1 is metadata, tier 2 a summary, higher tiers\n\
         carry full detail. `kr resolve <id>:<level>:<score>` builds a load\n\
         plan within the configured ceiling.\n",
    )?;
    Ok(())
}
