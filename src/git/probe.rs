//! Lightweight repository existence probe

use crate::git::remote_url::strip_credentials;
use core::time::Duration;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use tracing::debug;
use url::Url;

/// Default time budget for the probe request
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// What a probe learned about a repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeVerdict {
    /// The remote answered for the repository
    Reachable,
    /// The remote positively reported that the repository does not exist
    Absent,
    /// Nothing conclusive; the fetch proceeds and git decides
    Inconclusive(String),
}

/// Checks a repository URL before any filesystem work starts
pub trait RepositoryProbe {
    fn probe(&self, repository_url: &str) -> ProbeVerdict;
}

/// Unauthenticated smart-HTTP probe
///
/// Asks `<url>/info/refs?service=git-upload-pack` without credentials.
/// Only `404` and `410` count as absence; every other status counts as
/// reachable and every transport failure is inconclusive.
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    /// Create a probe whose request is limited to `timeout`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self { client })
    }
}

impl RepositoryProbe for HttpProbe {
    fn probe(&self, repository_url: &str) -> ProbeVerdict {
        let Some(refs_url) = info_refs_url(repository_url) else {
            return ProbeVerdict::Inconclusive("not an HTTP(S) repository URL".to_owned());
        };

        debug!("Probing {refs_url}");
        match self.client.get(refs_url).send() {
            Ok(response) => classify_status(response.status()),
            Err(e) => ProbeVerdict::Inconclusive(format!("probe request failed: {e}")),
        }
    }
}

/// Smart-HTTP discovery URL for an HTTP(S) repository, without credentials
#[must_use]
pub fn info_refs_url(repository_url: &str) -> Option<Url> {
    let mut url = Url::parse(&strip_credentials(repository_url)).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }

    let path = format!("{}/info/refs", url.path().trim_end_matches('/'));
    url.set_path(&path);
    url.set_query(Some("service=git-upload-pack"));
    url.set_fragment(None);
    Some(url)
}

/// Map a probe response status to a verdict
#[must_use]
pub fn classify_status(status: StatusCode) -> ProbeVerdict {
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        ProbeVerdict::Absent
    } else {
        ProbeVerdict::Reachable
    }
}
