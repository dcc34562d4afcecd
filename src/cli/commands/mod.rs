pub mod graph;
pub mod init;
pub mod list;
pub mod resolve;
pub mod show;
pub mod validate;

use clap::Subcommand;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a module store in the current directory or globally
    Init(init::InitArgs),
    /// Validate every manifest and the dependency graph
    Validate(validate::ValidateArgs),
    /// List modules in the store
    List(list::ListArgs),
    /// Show one module's manifest and tiers
    Show(show::ShowArgs),
    /// Inspect the dependency graph
    Graph(graph::GraphArgs),
    /// Resolve scored candidates into a load plan
    Resolve(resolve::ResolveArgs),
}

pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        // Init and Validate are normally routed before a context exists;
        // reaching them here means a context was buildable anyway.
        Commands::Init(args) => init::run_without_context(ctx.output_format, args),
        Commands::Validate(args) => validate::run_without_context(ctx.output_format, args),
        Commands::List(args) => list::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::Graph(args) => graph::run(ctx, args),
        Commands::Resolve(args) => resolve::run(ctx, args),
    }
}
