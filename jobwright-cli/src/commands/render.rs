//! `jobwright render <key>`: print the document a manifest produces.

use anyhow::{Context, Result};
use clap::Args;

use jobwright_core::manifest_store;

/// Arguments for `jobwright render`.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Manifest key to render.
    pub key: String,
}

impl RenderArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home()?;
        let manifest = manifest_store::load_manifest_at(&home, &self.key)
            .with_context(|| format!("failed to load manifest '{}'", self.key))?;
        let desired = manifest
            .desired()
            .with_context(|| format!("manifest '{}' is not valid", self.key))?;
        let rendered = super::document_builder()?
            .render(&desired)
            .with_context(|| format!("failed to render '{}'", self.key))?;

        tracing::info!("template hash {}", rendered.template_hash());
        print!("{}", rendered.document);
        if !rendered.document.ends_with('\n') {
            println!();
        }
        Ok(())
    }
}
