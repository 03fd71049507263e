mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::work::WorkSubcommand;
use solokit_core::SolokitError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "sk",
    about = "Session-driven development: work items, dependencies and branch tracking",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .session/ or .git/)
    #[arg(long, global = true, env = "SOLOKIT_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the work item store and default config
    Init,

    /// Manage work items
    Work {
        #[command(subcommand)]
        subcommand: WorkSubcommand,
    },

    /// Start a session on a work item (finalizes stale branch statuses first)
    Start {
        id: String,
        /// Branch the work item's branch is cut from (default: current branch)
        #[arg(long)]
        parent_branch: Option<String>,
    },

    /// End the open session
    End {
        /// Work item id (default: the item with the open session)
        id: Option<String>,
        /// Mark the work item completed
        #[arg(long)]
        complete: bool,
    },

    /// Resolve the live branch status of a work item without saving it
    GitStatus { id: String },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Work { subcommand } => cmd::work::run(&root, subcommand, cli.json),
        Commands::Start { id, parent_branch } => {
            cmd::session::start(&root, &id, parent_branch.as_deref(), cli.json)
        }
        Commands::End { id, complete } => {
            cmd::session::end(&root, id.as_deref(), complete, cli.json)
        }
        Commands::GitStatus { id } => cmd::git_status::run(&root, &id, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

/// Exit code of the first domain error in the chain, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<SolokitError>())
        .map_or(1, SolokitError::exit_code)
}
