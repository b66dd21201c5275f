//! Where image bytes come from.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, trace};

use super::ResolveError;

/// Upper bound on a single fetched asset.
const MAX_FETCH_BYTES: u64 = 64 * 1024 * 1024;

/// Fetches the raw bytes behind an image reference.
///
/// Called from blocking worker threads; implementations may block.
pub trait ImageSource: Send + Sync + 'static {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, ResolveError>;
}

/// Reads `http(s)://` references over the network and everything else
/// (plain paths, `file://` URLs) from disk.
pub struct DefaultSource {
    agent: ureq::Agent,
}

impl DefaultSource {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }

    fn fetch_remote(&self, reference: &str) -> Result<Vec<u8>, ResolveError> {
        debug!(reference, "Fetching remote image");
        let response = self.agent.get(reference).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => {
                ResolveError::Network(format!("failed to fetch {reference}: HTTP {code}"))
            }
            other => ResolveError::Network(other.to_string()),
        })?;
        let mut buf = Vec::new();
        response
            .into_reader()
            .take(MAX_FETCH_BYTES)
            .read_to_end(&mut buf)?;
        trace!(reference, bytes = buf.len(), "Fetched remote image");
        Ok(buf)
    }

    fn read_local(&self, reference: &str) -> Result<Vec<u8>, ResolveError> {
        let path = reference.strip_prefix("file://").unwrap_or(reference);
        Ok(std::fs::read(Path::new(path))?)
    }
}

impl Default for DefaultSource {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ImageSource for DefaultSource {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, ResolveError> {
        if is_remote(reference) {
            self.fetch_remote(reference)
        } else {
            self.read_local(reference)
        }
    }
}

pub fn is_remote(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}
