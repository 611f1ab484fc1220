pub mod apply;
pub mod destroy;
pub mod hash;
pub mod new;
pub mod render;
pub mod status;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use jobwright_core::config;

use crate::jenkins::JenkinsClient;

/// Per-request timeout for Jenkins and template fetches.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub fn home() -> Result<PathBuf> {
    dirs::home_dir().context("could not determine home directory")
}

/// Jenkins client built from `~/.jobwright/config.yaml` and `JENKINS_*`.
pub fn jenkins_client() -> Result<JenkinsClient> {
    let config = config::load().context("failed to load server configuration")?;
    tracing::debug!("using Jenkins at {}", config.server_url);
    JenkinsClient::new(&config, HTTP_TIMEOUT).context("failed to set up Jenkins client")
}

/// Template resolver whose HTTP fetches time out and trust `ca_cert`.
/// Needs no server URL, so dry runs work without a configured Jenkins.
pub fn document_builder() -> Result<jobwright_sync::DocumentBuilder> {
    let ca_cert = config::ca_cert_at(&home()?).context("failed to load server configuration")?;
    let agent = crate::tls::agent_builder(HTTP_TIMEOUT, ca_cert.as_deref())?.build();
    Ok(jobwright_sync::DocumentBuilder::with_resolver(
        jobwright_renderer::SourceResolver::with_agent(agent),
    ))
}
