//! Logging init: structured lines on stderr, mirrored to a file under the XDG state dir.
//!
//! The terminal is where progress and per-item failures are read, so stderr is
//! always attached. The file layer is best effort: if the state dir is
//! unwritable the run continues with stderr only.

use anyhow::Result;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "info,vmirror_core=debug,vmirror=debug";

/// Writer that is either the log file or stderr (used when the file handle cannot be cloned).
enum FileOrStderr {
    File(fs::File),
    Stderr,
}

impl io::Write for FileOrStderr {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FileOrStderr::File(f) => f.write(buf),
            FileOrStderr::Stderr => io::stderr().lock().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FileOrStderr::File(f) => f.flush(),
            FileOrStderr::Stderr => io::stderr().lock().flush(),
        }
    }
}

struct FileMakeWriter(fs::File);

impl<'a> MakeWriter<'a> for FileMakeWriter {
    type Writer = FileOrStderr;

    fn make_writer(&'a self) -> Self::Writer {
        self.0
            .try_clone()
            .map(FileOrStderr::File)
            .unwrap_or(FileOrStderr::Stderr)
    }
}

/// Path of the log file: `~/.local/state/vmirror/vmirror.log`.
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vmirror")?;
    Ok(xdg_dirs.get_state_home().join("vmirror.log"))
}

fn open_log_file() -> Result<(fs::File, PathBuf)> {
    let path = log_file_path()?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = fs::OpenOptions::new().create(true).append(true).open(&path)?;
    Ok((file, path))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize logging to stderr plus the state-dir log file.
///
/// Returns the log file path when the file layer is active, `None` when only
/// stderr could be set up.
pub fn init_logging() -> Option<PathBuf> {
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false);

    match open_log_file() {
        Ok((file, path)) => {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(BoxMakeWriter::new(FileMakeWriter(file)))
                .with_ansi(false);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .with(file_layer)
                .init();
            tracing::debug!(path = %path.display(), "vmirror logging initialized");
            Some(path)
        }
        Err(err) => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .init();
            tracing::warn!(error = %err, "log file unavailable, logging to stderr only");
            None
        }
    }
}
