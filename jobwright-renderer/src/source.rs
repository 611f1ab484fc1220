//! Template source resolution: inline text, `file://` paths and HTTP(S) URLs.
//!
//! Each call performs at most one read and never retries. HTTP fetches use a
//! blocking [`ureq::Agent`]; the default agent has no timeout, so callers that
//! need one should build their own agent and pass it to
//! [`SourceResolver::with_agent`].

use std::io::Read;
use std::path::{Path, PathBuf};

use url::Url;

use jobwright_core::{TemplateAddress, TemplateReference};

use crate::error::{fetch_err, FetchError, RenderError};
use crate::hash::content_hash;

/// Where resolved template bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Inline,
    File(PathBuf),
    Url(Url),
}

/// Raw template bytes plus their content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    source: TemplateSource,
    raw_content: Vec<u8>,
    content_hash: String,
    recorded_hash: Option<String>,
}

impl ResolvedTemplate {
    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn raw_content(&self) -> &[u8] {
        &self.raw_content
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    /// Hash carried by the reference's `@<hash>` suffix, if it had one.
    pub fn recorded_hash(&self) -> Option<&str> {
        self.recorded_hash.as_deref()
    }

    /// True when the reference carried no suffix, or the suffix equals the
    /// freshly computed hash.
    pub fn matches_recorded_hash(&self) -> bool {
        self.recorded_hash
            .as_deref()
            .map_or(true, |recorded| recorded == self.content_hash)
    }

    /// Stable identity of the template: the text itself when inline,
    /// `<address>@<hash>` otherwise.
    pub fn template_id(&self) -> String {
        match &self.source {
            TemplateSource::Inline => String::from_utf8_lossy(&self.raw_content).into_owned(),
            TemplateSource::File(path) => format!("file://{}@{}", path.display(), self.content_hash),
            TemplateSource::Url(url) => format!("{}@{}", url, self.content_hash),
        }
    }
}

/// Turns a [`TemplateReference`] into a [`ResolvedTemplate`].
#[derive(Debug, Clone)]
pub struct SourceResolver {
    agent: ureq::Agent,
}

impl Default for SourceResolver {
    fn default() -> Self {
        SourceResolver::new()
    }
}

impl SourceResolver {
    pub fn new() -> Self {
        SourceResolver {
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    pub fn with_agent(agent: ureq::Agent) -> Self {
        SourceResolver { agent }
    }

    pub fn resolve(&self, reference: &TemplateReference) -> Result<ResolvedTemplate, RenderError> {
        let (source, raw_content) = match reference.address()? {
            TemplateAddress::Url(url) => {
                tracing::debug!("retrieving template from URL {url}");
                let body = self.fetch(&url)?;
                (TemplateSource::Url(url), body)
            }
            TemplateAddress::File(path) => {
                tracing::debug!("retrieving template from {}", path.display());
                let body = read_file(&path)?;
                (TemplateSource::File(path), body)
            }
            TemplateAddress::Inline(text) => (TemplateSource::Inline, text.into_bytes()),
        };

        let content_hash = content_hash(&raw_content);
        Ok(ResolvedTemplate {
            source,
            raw_content,
            content_hash,
            recorded_hash: reference.recorded_hash().map(str::to_string),
        })
    }

    fn fetch(&self, url: &Url) -> Result<Vec<u8>, RenderError> {
        let response = self.agent.get(url.as_str()).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => fetch_err(url.as_str(), FetchError::Status { status }),
            ureq::Error::Transport(t) => {
                fetch_err(url.as_str(), FetchError::Transport(Box::new(t)))
            }
        })?;
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| fetch_err(url.as_str(), FetchError::Body(e)))?;
        Ok(body)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, RenderError> {
    std::fs::read(path).map_err(|source| {
        fetch_err(
            format!("file://{}", path.display()),
            FetchError::Io {
                path: path.to_path_buf(),
                source,
            },
        )
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    /// Serve exactly one HTTP response on a loopback port; returns the base URL.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            loop {
                line.clear();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            stream.flush().unwrap();
        });
        (format!("http://{addr}"), handle)
    }

    #[test]
    fn inline_resolves_verbatim_and_idempotently() {
        let resolver = SourceResolver::new();
        let reference = TemplateReference::new("<project>{{ Name }}</project>");
        let a = resolver.resolve(&reference).unwrap();
        let b = resolver.resolve(&reference).unwrap();
        assert_eq!(a.raw_content(), b"<project>{{ Name }}</project>");
        assert_eq!(a.source(), &TemplateSource::Inline);
        assert_eq!(a, b);
    }

    #[test]
    fn suffix_is_recorded_not_content() {
        let resolver = SourceResolver::new();
        let reference = TemplateReference::new("abc@deadbeefdeadbeefdeadbeefdeadbeef");
        let resolved = resolver.resolve(&reference).unwrap();
        assert_eq!(resolved.raw_content(), b"abc");
        assert_eq!(resolved.recorded_hash(), Some("deadbeefdeadbeefdeadbeefdeadbeef"));
        assert!(!resolved.matches_recorded_hash());
    }

    #[test]
    fn file_resolves_and_hash_tracks_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.txt");
        std::fs::write(&path, "v1").unwrap();
        let reference = TemplateReference::new(format!("file://{}", path.display()));
        let resolver = SourceResolver::new();

        let first = resolver.resolve(&reference).unwrap();
        let second = resolver.resolve(&reference).unwrap();
        assert_eq!(first.content_hash(), second.content_hash());

        std::fs::write(&path, "v2").unwrap();
        let third = resolver.resolve(&reference).unwrap();
        assert_ne!(first.content_hash(), third.content_hash());
        assert_eq!(third.source(), &TemplateSource::File(path.clone()));
    }

    #[test]
    fn missing_file_is_a_fetch_error() {
        let dir = TempDir::new().unwrap();
        let reference =
            TemplateReference::new(format!("file://{}", dir.path().join("nope.xml").display()));
        let err = SourceResolver::new().resolve(&reference).unwrap_err();
        assert!(
            matches!(err, RenderError::Fetch { source: FetchError::Io { .. }, .. }),
            "got: {err}"
        );
    }

    #[test]
    fn template_id_for_file_embeds_hash() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.xml");
        std::fs::write(&path, "<project/>").unwrap();
        let reference = TemplateReference::new(format!("file://{}", path.display()));
        let resolved = SourceResolver::new().resolve(&reference).unwrap();

        let id = resolved.template_id();
        assert_eq!(id, format!("file://{}@{}", path.display(), resolved.content_hash()));

        // Feeding the id back yields a reference whose suffix matches.
        let again = SourceResolver::new()
            .resolve(&TemplateReference::new(id))
            .unwrap();
        assert!(again.matches_recorded_hash());
    }

    #[test]
    fn template_id_for_inline_is_the_text() {
        let resolved = SourceResolver::new()
            .resolve(&TemplateReference::new("<project/>"))
            .unwrap();
        assert_eq!(resolved.template_id(), "<project/>");
    }

    #[test]
    fn http_body_is_fetched() {
        let (base, server) = serve_once("200 OK", "<project>remote</project>");
        let reference = TemplateReference::new(format!("{base}/config.xml"));
        let resolved = SourceResolver::new().resolve(&reference).unwrap();
        server.join().unwrap();
        assert_eq!(resolved.raw_content(), b"<project>remote</project>");
        assert!(matches!(resolved.source(), TemplateSource::Url(_)));
    }

    #[test]
    fn http_error_status_is_a_fetch_error() {
        let (base, server) = serve_once("404 Not Found", "missing");
        let reference = TemplateReference::new(format!("{base}/config.xml"));
        let err = SourceResolver::new().resolve(&reference).unwrap_err();
        server.join().unwrap();
        assert!(
            matches!(err, RenderError::Fetch { source: FetchError::Status { status: 404 }, .. }),
            "got: {err}"
        );
    }
}
