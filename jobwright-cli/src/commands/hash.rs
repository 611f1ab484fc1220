//! `jobwright hash <reference>`: content hash and template id of a reference.

use anyhow::{Context, Result};
use clap::Args;

use jobwright_core::TemplateReference;
use jobwright_renderer::SourceResolver;

/// Arguments for `jobwright hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Inline text, file://<path> or http(s)://<url>, optionally with @<hash>.
    pub reference: String,
}

impl HashArgs {
    pub fn run(self) -> Result<()> {
        let agent = ureq::AgentBuilder::new().timeout(super::HTTP_TIMEOUT).build();
        let resolved = SourceResolver::with_agent(agent)
            .resolve(&TemplateReference::new(self.reference.as_str()))
            .with_context(|| format!("failed to resolve '{}'", self.reference))?;

        println!("{}", resolved.content_hash());
        println!("{}", resolved.template_id());
        if !resolved.matches_recorded_hash() {
            eprintln!(
                "warning: recorded hash {} does not match content",
                resolved.recorded_hash().unwrap_or_default()
            );
        }
        Ok(())
    }
}
