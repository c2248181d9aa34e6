//! Fetch error kinds

use thiserror::Error;

/// Every way a single fetch call can fail
///
/// All kinds are terminal for the call. None of them leave a staging
/// directory behind or a half-populated destination.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchError {
    /// Required configuration missing or malformed; nothing was written
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        /// Names of required fields that were not provided
        missing: Vec<String>,
    },

    /// The existence probe positively reported that the repository is absent
    #[error("Repository unreachable: '{url}' was reported as not found")]
    RepositoryUnreachable { url: String },

    /// A git step exited non-zero, timed out, or could not be spawned
    #[error("Git command failed: `{command}`: {output}")]
    VersionControl { command: String, output: String },

    /// The fetched content could not be placed into the destination
    #[error("Relocation error: {message}")]
    Relocation { message: String },
}

impl FetchError {
    /// Create a configuration error for a malformed value
    #[inline]
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            missing: Vec::new(),
        }
    }

    /// Create a configuration error naming every missing required field
    #[inline]
    pub fn missing_configuration(missing: Vec<String>) -> Self {
        Self::Configuration {
            message: format!(
                "Missing required configuration: {}",
                missing.join(", ")
            ),
            missing,
        }
    }

    /// Create an unreachable-repository error
    #[inline]
    pub fn unreachable<S: Into<String>>(url: S) -> Self {
        Self::RepositoryUnreachable { url: url.into() }
    }

    /// Create a version-control error
    #[inline]
    pub fn version_control<C: Into<String>, O: Into<String>>(command: C, output: O) -> Self {
        Self::VersionControl {
            command: command.into(),
            output: output.into(),
        }
    }

    /// Create a relocation error
    #[inline]
    pub fn relocation<S: Into<String>>(message: S) -> Self {
        Self::Relocation {
            message: message.into(),
        }
    }

    /// Names of missing required fields, empty for every other kind
    #[must_use]
    pub fn missing_fields(&self) -> &[String] {
        match self {
            Self::Configuration { missing, .. } => missing,
            _ => &[],
        }
    }
}
