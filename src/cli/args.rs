use clap::Parser;

/// Command-line arguments for sparsefetch
///
/// With no positionals everything is read from the `GIT_*` environment.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sparsefetch")]
#[command(about = "Fetch a single path from a Git repository branch into a local directory")]
#[command(long_about = None)]
#[command(version)]
pub struct Args {
    /// Remote repository URL (HTTP(S) or SSH)
    #[arg(value_name = "REPOSITORY_URL")]
    pub repository_url: Option<String>,

    /// Local directory that receives the fetched content
    #[arg(value_name = "DESTINATION_PATH")]
    pub destination_path: Option<String>,

    /// Path inside the repository to fetch (file or directory)
    #[arg(value_name = "SPARSE_PATH")]
    pub sparse_path: Option<String>,

    /// Branch to pull [default: main]
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Place the content in this directory below the destination
    #[arg(long, value_name = "DIR")]
    pub subfolder: Option<String>,

    /// YAML configuration file, overridden by GIT_* variables and arguments
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Timeout in seconds for each git command [default: 300]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Check that the repository exists over HTTP before fetching
    #[arg(long)]
    pub probe: bool,

    /// Print a JSON summary of the fetch on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "This is a test module")]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_and_flags() {
        let args = Args::try_parse_from([
            "sparsefetch",
            "https://example.com/repo.git",
            "/tmp/out",
            "docs/api",
            "develop",
            "--subfolder",
            "api",
            "--timeout",
            "60",
            "--probe",
        ])
        .unwrap();

        assert_eq!(args.repository_url.as_deref(), Some("https://example.com/repo.git"));
        assert_eq!(args.destination_path.as_deref(), Some("/tmp/out"));
        assert_eq!(args.sparse_path.as_deref(), Some("docs/api"));
        assert_eq!(args.branch.as_deref(), Some("develop"));
        assert_eq!(args.subfolder.as_deref(), Some("api"));
        assert_eq!(args.timeout, Some(60));
        assert!(args.probe);
        assert!(!args.json);
    }

    #[test]
    fn no_arguments_is_valid() {
        let args = Args::try_parse_from(["sparsefetch"]).unwrap();
        assert!(args.repository_url.is_none());
        assert!(args.config.is_none());
    }
}
