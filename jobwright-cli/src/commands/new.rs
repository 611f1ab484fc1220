//! `jobwright new <key> --name <job> (--template <ref> | --definition)`

use anyhow::{bail, Context, Result};
use clap::Args;

use jobwright_core::{manifest_store, JobDefinitionModel, JobManifest, TemplateReference};

/// Write a new job manifest.
#[derive(Args, Debug)]
pub struct NewArgs {
    /// Manifest key; the file lands at ~/.jobwright/jobs/<key>.yaml.
    pub key: String,

    /// Jenkins job name.
    #[arg(long, short = 'n')]
    pub name: String,

    /// Template reference: inline text, file://<path> or http(s)://<url>.
    #[arg(long, short = 't', conflicts_with = "definition", required_unless_present = "definition")]
    pub template: Option<String>,

    /// Start from an empty pipeline definition instead of a template.
    #[arg(long)]
    pub definition: bool,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub display_name: Option<String>,

    #[arg(long)]
    pub disabled: bool,

    /// Template parameter as key=value; repeatable.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,
}

impl NewArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home()?;
        let manifest = match self.template {
            Some(reference) => {
                let mut manifest =
                    JobManifest::with_template(self.name, TemplateReference::new(reference));
                manifest.description = self.description;
                manifest.display_name = self.display_name;
                manifest.disabled = self.disabled;
                manifest.parameters.extend(self.params);
                manifest
            }
            None => {
                if !self.params.is_empty() {
                    bail!("--param only applies to template jobs");
                }
                let definition = JobDefinitionModel {
                    description: self.description,
                    display_name: self.display_name,
                    disabled: self.disabled,
                    ..JobDefinitionModel::default()
                };
                JobManifest::with_definition(self.name, definition)
            }
        };
        manifest
            .desired()
            .with_context(|| format!("manifest '{}' is not valid", self.key))?;

        let path = manifest_store::init_at(&home, &self.key, &manifest)
            .with_context(|| format!("failed to create manifest '{}'", self.key))?;
        println!("✓ Created manifest '{}' for job '{}'", self.key, manifest.name);
        println!("  Saved to: {}", path.display());
        Ok(())
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}
