//! Errors raised by browser primitives.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    /// The element was replaced between lookup and use.
    #[error("stale element: {locator}")]
    Stale { locator: String },

    /// Nothing on the current page matches.
    #[error("element not found: {locator}")]
    NotFound { locator: String },

    /// The element exists but cannot take input yet (covered, detached, animating).
    #[error("element not interactable: {locator}")]
    NotInteractable { locator: String },

    /// A bounded wait ran out.
    #[error("timed out after {after:?} waiting for {what}")]
    Timeout { what: String, after: Duration },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// The automation driver itself failed (connection lost, protocol error).
    #[error("browser driver: {0}")]
    Driver(String),
}

pub type BrowseResult<T> = Result<T, BrowseError>;

impl BrowseError {
    pub fn not_found(locator: &impl std::fmt::Display) -> Self {
        BrowseError::NotFound {
            locator: locator.to_string(),
        }
    }

    pub fn stale(locator: &impl std::fmt::Display) -> Self {
        BrowseError::Stale {
            locator: locator.to_string(),
        }
    }
}
