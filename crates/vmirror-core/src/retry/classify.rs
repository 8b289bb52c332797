//! Classify browser errors into retry policy error kinds.

use crate::browse::BrowseError;
use crate::retry::policy::ErrorKind;

/// Classify a browsing error for retry decisions.
pub fn classify(e: &BrowseError) -> ErrorKind {
    match e {
        BrowseError::Stale { .. } | BrowseError::NotInteractable { .. } => ErrorKind::Transient,
        BrowseError::Timeout { .. } => ErrorKind::Timeout,
        BrowseError::NotFound { .. } | BrowseError::Navigation { .. } | BrowseError::Driver(_) => {
            ErrorKind::Other
        }
    }
}
