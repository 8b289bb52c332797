//! URL and path modeling.
//!
//! Normalises detail-page links into stable manifest keys and derives
//! filesystem-safe output paths from breadcrumb paths and titles.

mod link;
mod sanitize;

pub use link::normalize_detail_url;
pub use sanitize::{output_path, sanitize_path, sanitize_title, UNTITLED};
