//! kr graph - Inspect the dependency graph

use clap::Args;
use serde::Serialize;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, OutputFormat, emit_human, emit_json, robot_ok};
use crate::error::{KrError, Result};

#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Show the expansion chain for this module instead of the whole graph
    pub id: Option<String>,

    /// Emit Graphviz DOT
    #[arg(long)]
    pub dot: bool,
}

#[derive(Serialize)]
struct GraphReport {
    nodes: usize,
    edges: Vec<(String, String)>,
}

#[derive(Serialize)]
struct ChainReport {
    id: String,
    chain: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &GraphArgs) -> Result<()> {
    if args.dot {
        println!("{}", ctx.graph.to_dot());
        return Ok(());
    }

    if let Some(id) = &args.id {
        if !ctx.graph.contains(id) {
            return Err(KrError::ModuleNotFound(id.clone()));
        }
        let chain = ctx.graph.expand(id)?;
        return match ctx.output_format {
            OutputFormat::Json => emit_json(&robot_ok(ChainReport {
                id: id.clone(),
                chain,
            })),
            OutputFormat::Human => {
                let mut layout = HumanLayout::new();
                layout.section(&format!("Expansion of {id}"));
                for member in &chain {
                    layout.bullet(member);
                }
                emit_human(layout);
                Ok(())
            }
        };
    }

    let edges = ctx.graph.edge_list();
    match ctx.output_format {
        OutputFormat::Json => emit_json(&robot_ok(GraphReport {
            nodes: ctx.graph.node_count(),
            edges,
        })),
        OutputFormat::Human => {
            let mut layout = HumanLayout::new();
            layout.section(&format!(
                "Dependency graph ({} modules, {} edges)",
                ctx.graph.node_count(),
                edges.len()
            ));
            for (from, to) in &edges {
                layout.push_line(format!("{from} -> {to}"));
            }
            emit_human(layout);
            Ok(())
        }
    }
}
