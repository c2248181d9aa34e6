//! The resolved, immutable input of a single fetch

use crate::system::System;
use core::fmt;
use core::time::Duration;
use std::path::PathBuf;

/// Branch pulled when none is configured
pub const DEFAULT_BRANCH: &str = "main";

/// Wall-clock limit applied to every git subprocess by default
pub const DEFAULT_PULL_TIMEOUT: Duration = Duration::from_secs(300);

/// Largest accepted git subprocess timeout, in seconds (one day)
pub const MAX_PULL_TIMEOUT_SECS: u64 = 24 * 60 * 60;

/// Environment key holding the credential principal
pub const ENV_USERNAME: &str = "GIT_USERNAME";

/// Environment key holding the credential secret
pub const ENV_TOKEN: &str = "GIT_TOKEN";

/// Username/token pair embedded into HTTP(S) remotes
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub token: String,
}

impl Credentials {
    /// Create a credential pair
    #[must_use]
    pub fn new<U: Into<String>, T: Into<String>>(username: U, token: T) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    /// Read `GIT_USERNAME` / `GIT_TOKEN`; both must be non-empty
    #[must_use]
    pub fn from_env(system: &dyn System) -> Option<Self> {
        let username = system.env_var(ENV_USERNAME).unwrap_or_default();
        let token = system.env_var(ENV_TOKEN).unwrap_or_default();
        if username.is_empty() || token.is_empty() {
            return None;
        }
        Some(Self { username, token })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("token", &"***")
            .finish()
    }
}

/// Everything one fetch needs to know about what to retrieve and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Remote locator, HTTP(S) or SSH
    pub repository_url: String,
    /// Absolute directory that receives the fetched content
    pub destination_path: PathBuf,
    /// Slash-separated path inside the repository; empty means the whole tree
    pub sparse_path: String,
    pub branch: String,
    /// Optional directory below the destination that receives the content instead
    pub subfolder: Option<String>,
    pub credentials: Option<Credentials>,
}

impl FetchRequest {
    /// Create a request for `sparse_path` on the default branch without credentials
    #[must_use]
    pub fn new<U: Into<String>, D: Into<PathBuf>, S: Into<String>>(
        repository_url: U,
        destination_path: D,
        sparse_path: S,
    ) -> Self {
        Self {
            repository_url: repository_url.into(),
            destination_path: destination_path.into(),
            sparse_path: sparse_path.into(),
            branch: DEFAULT_BRANCH.to_owned(),
            subfolder: None,
            credentials: None,
        }
    }

    /// Set the branch (builder pattern)
    #[must_use]
    pub fn with_branch<B: Into<String>>(mut self, branch: B) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the subfolder (builder pattern)
    #[must_use]
    pub fn with_subfolder<S: Into<String>>(mut self, subfolder: S) -> Self {
        self.subfolder = Some(subfolder.into());
        self
    }

    /// Set credentials (builder pattern)
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Directory that ends up holding the fetched entries
    #[must_use]
    pub fn target_dir(&self) -> PathBuf {
        match &self.subfolder {
            Some(subfolder) => self.destination_path.join(subfolder),
            None => self.destination_path.clone(),
        }
    }
}

/// Knobs that shape how the fetch runs rather than what it fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Limit for each git subprocess
    pub pull_timeout: Duration,
    /// Run the HTTP existence probe before touching the filesystem
    pub probe: bool,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            pull_timeout: DEFAULT_PULL_TIMEOUT,
            probe: false,
        }
    }
}
