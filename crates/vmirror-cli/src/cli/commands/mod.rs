//! CLI command handlers. Each command is in its own file.

mod crawl;
mod fetch;
mod resolve;
mod session;
mod status;

pub use crawl::run_crawl_cmd;
pub use fetch::run_fetch_cmd;
pub use resolve::run_resolve_cmd;
pub use status::run_status;
