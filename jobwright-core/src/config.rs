//! Jenkins server connection settings.
//!
//! Read from `~/.jobwright/config.yaml` when present; `JENKINS_URL`,
//! `JENKINS_USERNAME`, `JENKINS_PASSWORD` and `JENKINS_CA_CERT` override the
//! file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub server_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// PEM file with extra CA certificates, for servers behind a private CA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
}

/// `<home>/.jobwright/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".jobwright").join("config.yaml")
}

/// Load the configuration from `home`, applying environment overrides.
pub fn load_at(home: &Path) -> Result<ServerConfig, ConfigError> {
    load_with_env(home, |key| std::env::var(key).ok())
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<ServerConfig, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_at(&home)
}

/// Like [`load_at`], with an injectable environment lookup.
pub fn load_with_env(
    home: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ServerConfig, ConfigError> {
    let mut config = read_with_env(home, env)?;
    if config.server_url.trim().is_empty() {
        return Err(ConfigError::MissingServerUrl {
            path: config_path_at(home),
        });
    }
    config.server_url = config.server_url.trim_end_matches('/').to_string();
    Ok(config)
}

/// The CA bundle to trust, if configured. Unlike [`load_at`] this works
/// without a server URL, for commands that only fetch templates.
pub fn ca_cert_at(home: &Path) -> Result<Option<PathBuf>, ConfigError> {
    Ok(read_with_env(home, |key| std::env::var(key).ok())?.ca_cert)
}

/// File contents merged with the environment, unvalidated.
fn read_with_env(
    home: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ServerConfig, ConfigError> {
    let path = config_path_at(home);
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?
    } else {
        ServerConfig::default()
    };

    let non_empty = |key: &str| env(key).filter(|v| !v.is_empty());
    if let Some(url) = non_empty("JENKINS_URL") {
        config.server_url = url;
    }
    if let Some(username) = non_empty("JENKINS_USERNAME") {
        config.username = Some(username);
    }
    if let Some(password) = non_empty("JENKINS_PASSWORD") {
        config.password = Some(password);
    }
    if let Some(ca_cert) = non_empty("JENKINS_CA_CERT") {
        config.ca_cert = Some(PathBuf::from(ca_cert));
    }
    Ok(config)
}
