//! HTTP agents that trust an extra CA bundle.
//!
//! Without `ca_cert` the agent keeps ureq's default rustls setup and the
//! bundled webpki roots. With it, the PEM certificates are added on top of
//! those roots, so a Jenkins behind a private CA still verifies.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use rustls::RootCertStore;

pub fn agent_builder(timeout: Duration, ca_cert: Option<&Path>) -> Result<ureq::AgentBuilder> {
    let builder = ureq::AgentBuilder::new().timeout(timeout);
    let Some(path) = ca_cert else {
        return Ok(builder);
    };

    let roots = root_store(path)?;
    let config = rustls::ClientConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .context("failed to configure TLS")?
    .with_root_certificates(roots)
    .with_no_client_auth();
    tracing::debug!("trusting extra CA certificates from {}", path.display());
    Ok(builder.tls_config(Arc::new(config)))
}

/// webpki roots plus every certificate in the PEM file at `path`.
fn root_store(path: &Path) -> Result<RootCertStore> {
    let file = File::open(path)
        .with_context(|| format!("failed to open CA certificate {}", path.display()))?;
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let mut added = 0usize;
    for cert in rustls_pemfile::certs(&mut BufReader::new(file)) {
        let cert =
            cert.with_context(|| format!("failed to read CA certificate {}", path.display()))?;
        roots
            .add(cert)
            .with_context(|| format!("invalid CA certificate in {}", path.display()))?;
        added += 1;
    }
    if added == 0 {
        bail!("no PEM certificates found in {}", path.display());
    }
    Ok(roots)
}
