//! Run-level failures.
//!
//! Per-item and per-section problems are logged and contained inside each
//! stage. The variants here are the ones that abort a whole run.

use crate::browse::BrowseError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The post-login marker never appeared.
    #[error("authentication failed: {0}")]
    AuthFailure(#[source] BrowseError),

    /// A required external executable is not installed.
    #[error("required tool `{0}` not found on PATH")]
    ToolingMissing(String),

    /// The browser could not be started or the session was lost.
    #[error("browser session: {0}")]
    Session(#[from] BrowseError),
}
