//! Package index availability checks
//!
//! An index is probed with `GET {index_url}/{package}/`. Only a 200 response
//! counts as present; every other status and every transport error counts as
//! absent.

use std::time::Duration;

/// Public package index used when no default is configured
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple";

/// Answers whether a package is published on an index
pub trait Prober {
    fn exists(&self, package: &str, index_url: &str) -> bool;
}

/// Build the per-package probe URL
pub fn probe_url(index_url: &str, package: &str) -> String {
    format!("{}/{}/", index_url.trim_end_matches('/'), package)
}

/// Probes indexes over HTTP, one blocking request per call
pub struct HttpProber {
    agent: ureq::Agent,
}

impl HttpProber {
    /// Create a prober; `timeout` of `None` keeps the client's defaults
    pub fn new(timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .into();
        HttpProber { agent }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        HttpProber::new(None)
    }
}

impl Prober for HttpProber {
    fn exists(&self, package: &str, index_url: &str) -> bool {
        let url = probe_url(index_url, package);

        match self.agent.get(&url).call() {
            Ok(response) => {
                let status = response.status().as_u16();
                tracing::debug!("GET {} -> {}", url, status);
                status == 200
            }
            Err(e) => {
                tracing::debug!("GET {} failed: {}", url, e);
                false
            }
        }
    }
}
