//! YAML configuration loading and parsing

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::system::System;
use std::path::Path;

/// Load and parse a YAML configuration file
///
/// # Errors
///
/// Returns a configuration error if the file is missing, unreadable or
/// not a valid configuration document
pub fn load_config(system: &dyn System, path: &str) -> Result<FetchConfig, FetchError> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj) {
        return Err(FetchError::configuration(format!(
            "Configuration file not found: {path}"
        )));
    }

    let content = system.read_to_string(path_obj).map_err(|e| {
        FetchError::configuration(format!("Failed to read configuration file {path}: {e}"))
    })?;

    if content.trim().is_empty() {
        return Ok(FetchConfig::default());
    }

    serde_yaml::from_str(&content).map_err(|e| {
        FetchError::configuration(format!(
            "Failed to parse YAML configuration in file {path}: {e}"
        ))
    })
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;
    use crate::system::MockSystem;

    #[test]
    fn loads_all_fields() {
        let system = MockSystem::new()
            .with_file(
                "/etc/fetch.yaml",
                br#"
repository_url: "https://example.com/repo.git"
destination_path: "/data/out"
sparse_path: "docs"
branch: "release"
subfolder: "schemas"
timeout_secs: 30
probe: true
"#,
            )
            .unwrap();

        let config = load_config(&system, "/etc/fetch.yaml").unwrap();
        assert_eq!(
            config.repository_url.as_deref(),
            Some("https://example.com/repo.git")
        );
        assert_eq!(config.destination_path.as_deref(), Some("/data/out"));
        assert_eq!(config.sparse_path.as_deref(), Some("docs"));
        assert_eq!(config.branch.as_deref(), Some("release"));
        assert_eq!(config.subfolder.as_deref(), Some("schemas"));
        assert_eq!(config.timeout_secs, Some(30));
        assert_eq!(config.probe, Some(true));
    }

    #[test]
    fn accepts_target_path_alias() {
        let system = MockSystem::new()
            .with_file("/c.yaml", b"target_path: /data/out\n")
            .unwrap();
        let config = load_config(&system, "/c.yaml").unwrap();
        assert_eq!(config.destination_path.as_deref(), Some("/data/out"));
    }

    #[test]
    fn rejects_unknown_fields_and_credentials() {
        let system = MockSystem::new()
            .with_file("/c.yaml", b"token: hunter2\n")
            .unwrap();
        let err = load_config(&system, "/c.yaml").unwrap_err();
        assert!(matches!(err, FetchError::Configuration { .. }));
    }

    #[test]
    fn missing_file_is_configuration_error() {
        let system = MockSystem::new();
        let err = load_config(&system, "/nope.yaml").unwrap_err();
        assert!(err.to_string().contains("Configuration file not found"));
    }
}
