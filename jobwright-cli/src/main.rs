//! jobwright: Jenkins job configuration generator and reconciler.
//!
//! # Usage
//!
//! ```text
//! jobwright new <key> --name <job> (--template <ref> | --definition) [--param k=v ...]
//! jobwright apply <key> [--dry-run]
//! jobwright apply --all [--dry-run]
//! jobwright render <key>
//! jobwright status [--json]
//! jobwright destroy <key>
//! jobwright hash <reference>
//! ```
//!
//! Logging goes to stderr through `env_logger`; set `RUST_LOG=debug` for
//! request-level detail.

mod commands;
mod jenkins;
mod tls;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    apply::ApplyArgs, destroy::DestroyArgs, hash::HashArgs, new::NewArgs, render::RenderArgs,
    status::StatusArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "jobwright",
    version,
    about = "Generate Jenkins job configurations and keep them in sync",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a new job manifest under ~/.jobwright/jobs/.
    New(NewArgs),

    /// Create, update or rename jobs on the Jenkins server.
    Apply(ApplyArgs),

    /// Print the config.xml a manifest renders to.
    Render(RenderArgs),

    /// Show which manifests differ from what was last applied.
    Status(StatusArgs),

    /// Delete a job from the server and forget its applied state.
    Destroy(DestroyArgs),

    /// Resolve a template reference and print its content hash.
    Hash(HashArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::New(args) => args.run(),
        Commands::Apply(args) => args.run(),
        Commands::Render(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Destroy(args) => args.run(),
        Commands::Hash(args) => args.run(),
    }
}
