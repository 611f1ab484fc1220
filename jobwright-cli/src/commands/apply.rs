//! `jobwright apply`: reconcile manifests against the Jenkins server.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use jobwright_sync::{
    pipeline::{self, ApplyAction, ApplyScope},
    ApplyResult, Plan, Reconciler,
};

/// Arguments for `jobwright apply`.
#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Manifest key to apply (omit when using `--all`).
    #[arg(required_unless_present = "all")]
    pub key: Option<String>,

    /// Apply every manifest.
    #[arg(long, conflicts_with = "key")]
    pub all: bool,

    /// Show what would change without contacting the server. No server URL
    /// is required.
    #[arg(long)]
    pub dry_run: bool,
}

impl ApplyArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home()?;
        let scope = match self.key {
            Some(key) => ApplyScope::Job(key),
            None => ApplyScope::All,
        };
        let label = match &scope {
            ApplyScope::Job(key) => format!("apply failed for '{key}'"),
            ApplyScope::All => "apply --all failed".to_string(),
        };
        let results = if self.dry_run {
            pipeline::plan(&home, &super::document_builder()?, scope).context(label)?
        } else {
            let client = super::jenkins_client()?;
            let reconciler = Reconciler::with_builder(&client, super::document_builder()?);
            pipeline::run(&home, &reconciler, scope).context(label)?
        };

        if results.is_empty() {
            println!("No job manifests found. Run `jobwright new` first.");
        }
        for result in &results {
            print_result(result, self.dry_run);
        }
        Ok(())
    }
}

fn print_result(result: &ApplyResult, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    let marker = match &result.action {
        ApplyAction::Unchanged | ApplyAction::Planned(Plan::Unchanged) => "·".bright_black(),
        ApplyAction::Created | ApplyAction::Recreated => "+".green(),
        ApplyAction::Replaced | ApplyAction::WouldReplace => "±".yellow(),
        ApplyAction::Planned(Plan::Create) => "+".green(),
        ApplyAction::Updated { .. } | ApplyAction::Planned(Plan::Update { .. }) => "~".cyan(),
    };
    let hash = result
        .template_hash
        .as_deref()
        .map(|h| format!(" [{h}]"))
        .unwrap_or_default();
    println!(
        "{prefix}{marker} '{}' → {}: {}{}",
        result.key,
        result.job,
        result.action.label(),
        hash.bright_black()
    );
}
