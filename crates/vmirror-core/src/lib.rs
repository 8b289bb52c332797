pub mod browse;
pub mod catalogue;
pub mod config;
pub mod control;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod manifest;
pub mod resolver;
pub mod retry;
pub mod session;
pub mod status;
pub mod url_model;
