//! `jobwright destroy <key>`

use anyhow::{Context, Result};
use clap::Args;

use jobwright_sync::{pipeline, Reconciler};

/// Arguments for `jobwright destroy`.
#[derive(Args, Debug)]
pub struct DestroyArgs {
    /// Manifest key whose job should be deleted. The manifest itself is kept.
    pub key: String,
}

impl DestroyArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home()?;
        let client = super::jenkins_client()?;
        let reconciler = Reconciler::new(&client);

        match pipeline::destroy(&home, &reconciler, &self.key)
            .with_context(|| format!("destroy failed for '{}'", self.key))?
        {
            Some(record) => println!("✓ Deleted job '{}' ('{}')", record.id, self.key),
            None => println!("'{}' was never applied; nothing to delete", self.key),
        }
        Ok(())
    }
}
