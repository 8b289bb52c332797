//! External download executable.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::PipelineError;

/// How many trailing stderr lines are kept for a failed run.
const STDERR_TAIL_LINES: usize = 5;

/// One transfer handed to a `Downloader`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub media_url: String,
    /// Detail page the media is embedded in; sent as the referer.
    pub referer: String,
    pub output: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}{}", stderr_suffix(.stderr))]
    Exit {
        program: String,
        status: String,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Performs one transfer. Success means the tool reported success; the caller
/// still verifies the output file.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, job: &DownloadJob) -> Result<(), DownloadError>;
}

/// Runs `<program> --referer <url> --output <path> [extra args] <media url>`.
#[derive(Debug, Clone)]
pub struct CommandDownloader {
    program: PathBuf,
    extra_args: Vec<String>,
}

impl CommandDownloader {
    pub fn new(program: impl Into<PathBuf>, extra_args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            extra_args,
        }
    }

    /// Resolves `program` on `PATH` (or as a path when it contains a separator).
    pub fn locate(program: &str, extra_args: Vec<String>) -> Result<Self, PipelineError> {
        let found = find_executable(program).ok_or_else(|| PipelineError::ToolingMissing(program.to_string()))?;
        tracing::debug!(program = %found.display(), "using downloader");
        Ok(Self::new(found, extra_args))
    }

    pub fn args(&self, job: &DownloadJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--referer".into(),
            job.referer.clone().into(),
            "--output".into(),
            job.output.clone().into_os_string(),
        ];
        args.extend(self.extra_args.iter().map(OsString::from));
        args.push(job.media_url.clone().into());
        args
    }
}

#[async_trait]
impl Downloader for CommandDownloader {
    async fn download(&self, job: &DownloadJob) -> Result<(), DownloadError> {
        let program = self.program.display().to_string();
        let output = tokio::process::Command::new(&self.program)
            .args(self.args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DownloadError::Spawn {
                program: program.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(());
        }
        Err(DownloadError::Exit {
            program,
            status: output.status.to_string(),
            stderr: tail_lines(&String::from_utf8_lossy(&output.stderr), STDERR_TAIL_LINES),
        })
    }
}

/// Last `n` non-empty lines of `text`, joined with ` | `.
fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join(" | ")
}

/// Absolute path of an executable named `program`, searching `PATH` unless
/// `program` already names a path.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|p| is_executable(p))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
