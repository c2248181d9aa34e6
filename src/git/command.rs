//! `VersionControl` backed by the `git` executable

use crate::error::FetchError;
use crate::git::port::{SPARSE_CHECKOUT_FILE, VersionControl, render_patterns};
use crate::git::remote_url::redact_credentials;
use crate::system::System;
use core::time::Duration;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::debug;

/// How often a running git process is polled for completion
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs each step as a `git` subprocess bounded by a wall-clock timeout
pub struct GitCommand<'src> {
    system: &'src dyn System,
    timeout: Duration,
}

impl<'src> GitCommand<'src> {
    /// Create a runner whose every git invocation is limited to `timeout`
    #[must_use]
    pub fn new(system: &'src dyn System, timeout: Duration) -> Self {
        Self { system, timeout }
    }

    /// Run `git <args>` in `cwd`, returning its standard output
    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, FetchError> {
        let command_line = display_command(args);
        debug!("Running `{command_line}`");

        let mut command = Command::new("git");
        command
            .args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let mut child = command
            .spawn()
            .map_err(|e| FetchError::version_control(&command_line, format!("failed to start git: {e}")))?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = wait_with_deadline(&mut child, self.timeout)
            .map_err(|message| FetchError::version_control(&command_line, message))?;

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            let code = status
                .code()
                .map_or_else(|| "signal".to_owned(), |c| c.to_string());
            let mut output = format!("exit status {code}");
            for stream in [stderr.trim(), stdout.trim()] {
                if !stream.is_empty() {
                    output.push_str(": ");
                    output.push_str(&redact_credentials(stream));
                }
            }
            debug!("`{command_line}` failed: {output}");
            return Err(FetchError::version_control(command_line, output));
        }

        debug!("`{command_line}` succeeded");
        Ok(stdout)
    }
}

impl VersionControl for GitCommand<'_> {
    fn init(&self, repo: &Path) -> Result<(), FetchError> {
        self.run(Some(repo), &["init", "--quiet"]).map(drop)
    }

    fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<(), FetchError> {
        self.run(Some(repo), &["remote", "add", name, url]).map(drop)
    }

    fn enable_sparse_checkout(&self, repo: &Path) -> Result<(), FetchError> {
        self.run(Some(repo), &["config", "core.sparseCheckout", "true"])
            .map(drop)
    }

    fn write_sparse_patterns(&self, repo: &Path, patterns: &[String]) -> Result<(), FetchError> {
        let file = repo.join(SPARSE_CHECKOUT_FILE);
        let write = || -> std::io::Result<()> {
            if let Some(parent) = file.parent() {
                self.system.create_dir_all(parent)?;
            }
            self.system
                .write(&file, render_patterns(patterns).as_bytes())
        };

        write().map_err(|e| {
            FetchError::version_control(
                format!("write {}", file.display()),
                format!("failed to write sparse-checkout patterns: {e}"),
            )
        })
    }

    fn pull(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), FetchError> {
        self.run(Some(repo), &["pull", "--depth=1", remote, branch])
            .map(drop)
    }
}

/// Verify that git can be executed, returning its version line
///
/// # Errors
///
/// Returns a version-control error if `git --version` cannot be run
pub fn check_git_availability(system: &dyn System) -> Result<String, FetchError> {
    let version = GitCommand::new(system, Duration::from_secs(30)).run(None, &["--version"])?;
    let version = version.trim().to_owned();
    debug!("Using {version}");
    Ok(version)
}

/// Command line with any embedded credentials redacted
fn display_command(args: &[&str]) -> String {
    let mut command_line = String::from("git");
    for arg in args {
        command_line.push(' ');
        command_line.push_str(&redact_credentials(arg));
    }
    command_line
}

/// Read a child pipe to completion on a helper thread so the child never
/// blocks on a full pipe while the parent is polling
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            // A read error only truncates diagnostics
            let _ = pipe.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

/// Wait for `child`, killing it once `timeout` has elapsed
///
/// A timeout too large to represent as an instant never expires.
fn wait_with_deadline(child: &mut Child, timeout: Duration) -> Result<ExitStatus, String> {
    let deadline = Instant::now().checked_add(timeout);
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if deadline.is_some_and(|deadline| Instant::now() >= deadline) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("timed out after {}s", timeout.as_secs()));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(format!("failed to wait for git: {e}"));
            }
        }
    }
}
