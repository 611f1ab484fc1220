//! Blocking Jenkins REST client implementing [`JobRegistry`].
//!
//! | operation | request                                      |
//! |-----------|----------------------------------------------|
//! | get       | `GET  /job/<name>/api/json`                  |
//! | create    | `POST /createItem?name=<name>` (XML body)    |
//! | update    | `POST /job/<name>/config.xml` (XML body)     |
//! | rename    | `POST /job/<name>/doRename?newName=<new>`    |
//! | delete    | `POST /job/<name>/doDelete`                  |
//!
//! POSTs carry a CSRF crumb when the server issues one. Redirects are not
//! followed; Jenkins answers renames and deletes with a 302, which counts as
//! success.

use std::cell::OnceCell;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use url::Url;

use jobwright_core::{JobName, ServerConfig};
use jobwright_sync::{ClientError, JobHandle, JobRegistry, JobSnapshot};

const XML_CONTENT_TYPE: &str = "application/xml";

/// Longest slice of an error body kept in [`ClientError::Status`].
const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Crumb {
    field: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrumbResponse {
    crumb_request_field: String,
    crumb: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResponse {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    disabled: Option<bool>,
    #[serde(default)]
    buildable: Option<bool>,
}

pub struct JenkinsClient {
    agent: ureq::Agent,
    base: Url,
    authorization: Option<String>,
    crumb: OnceCell<Option<Crumb>>,
}

impl JenkinsClient {
    pub fn new(config: &ServerConfig, timeout: Duration) -> Result<Self, ClientError> {
        let agent = crate::tls::agent_builder(timeout, config.ca_cert.as_deref())
            .map_err(|e| ClientError::Other(format!("{e:#}")))?
            .redirects(0)
            .build();
        Self::with_agent(config, agent)
    }

    pub fn with_agent(config: &ServerConfig, agent: ureq::Agent) -> Result<Self, ClientError> {
        let base = Url::parse(&format!("{}/", config.server_url.trim_end_matches('/')))
            .map_err(|e| ClientError::Other(format!("invalid server URL {}: {e}", config.server_url)))?;
        let authorization = config.username.as_ref().map(|user| {
            let password = config.password.as_deref().unwrap_or_default();
            format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
        });
        Ok(JenkinsClient {
            agent,
            base,
            authorization,
            crumb: OnceCell::new(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::Other(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn job_endpoint(&self, name: &JobName, action: &str) -> Result<Url, ClientError> {
        self.endpoint(&["job", name.as_str(), action])
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let request = self.agent.request_url(method, url);
        match &self.authorization {
            Some(auth) => request.set("Authorization", auth),
            None => request,
        }
    }

    fn crumb(&self) -> Result<Option<Crumb>, ClientError> {
        if let Some(crumb) = self.crumb.get() {
            return Ok(crumb.clone());
        }
        let url = self.endpoint(&["crumbIssuer", "api", "json"])?;
        let crumb = match self.request("GET", &url).call() {
            Ok(response) => {
                let body: CrumbResponse = response
                    .into_json()
                    .map_err(|e| ClientError::Other(format!("unreadable crumb response: {e}")))?;
                Some(Crumb {
                    field: body.crumb_request_field,
                    value: body.crumb,
                })
            }
            // CSRF protection disabled.
            Err(ureq::Error::Status(404, _)) => None,
            Err(e) => return Err(client_error(e)),
        };
        tracing::debug!("crumb issuer {}", if crumb.is_some() { "active" } else { "absent" });
        let _ = self.crumb.set(crumb.clone());
        Ok(crumb)
    }

    fn post(&self, url: &Url, xml: Option<&str>) -> Result<(), ClientError> {
        let mut request = self.request("POST", url);
        if let Some(crumb) = self.crumb()? {
            request = request.set(&crumb.field, &crumb.value);
        }
        tracing::debug!("POST {url}");
        let result = match xml {
            Some(body) => request.set("Content-Type", XML_CONTENT_TYPE).send_string(body),
            None => request.call(),
        };
        result.map(|_| ()).map_err(client_error)
    }
}

impl JobRegistry for JenkinsClient {
    fn exists(&self, name: &JobName) -> Result<bool, ClientError> {
        Ok(self.get(name)?.is_some())
    }

    fn get(&self, name: &JobName) -> Result<Option<JobSnapshot>, ClientError> {
        let url = self.endpoint(&["job", name.as_str(), "api", "json"])?;
        tracing::debug!("GET {url}");
        match self.request("GET", &url).call() {
            Ok(response) => {
                let job: JobResponse = response
                    .into_json()
                    .map_err(|e| ClientError::Other(format!("unreadable job response: {e}")))?;
                Ok(Some(JobSnapshot {
                    name: job.name,
                    display_name: job.display_name,
                    url: job.url,
                    disabled: job
                        .disabled
                        .unwrap_or_else(|| !job.buildable.unwrap_or(true)),
                }))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(client_error(e)),
        }
    }

    fn create(&self, name: &JobName, document: &str) -> Result<JobHandle, ClientError> {
        let mut url = self.endpoint(&["createItem"])?;
        url.query_pairs_mut().append_pair("name", name.as_str());
        self.post(&url, Some(document))?;
        Ok(JobHandle::new(name.clone()))
    }

    fn update(&self, handle: &JobHandle, document: &str) -> Result<(), ClientError> {
        let url = self.job_endpoint(handle.name(), "config.xml")?;
        self.post(&url, Some(document))
    }

    fn rename(&self, handle: &JobHandle, new_name: &JobName) -> Result<JobHandle, ClientError> {
        let mut url = self.job_endpoint(handle.name(), "doRename")?;
        url.query_pairs_mut().append_pair("newName", new_name.as_str());
        self.post(&url, None)?;
        Ok(JobHandle::new(new_name.clone()))
    }

    fn delete(&self, name: &JobName) -> Result<(), ClientError> {
        let url = self.job_endpoint(name, "doDelete")?;
        self.post(&url, None)
    }
}

fn client_error(err: ureq::Error) -> ClientError {
    match err {
        ureq::Error::Status(status, response) => {
            let mut message = response.into_string().unwrap_or_default();
            if message.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !message.is_char_boundary(cut) {
                    cut -= 1;
                }
                message.truncate(cut);
            }
            ClientError::Status {
                status,
                message: message.trim().to_string(),
            }
        }
        ureq::Error::Transport(transport) => ClientError::Transport(transport.to_string()),
    }
}
