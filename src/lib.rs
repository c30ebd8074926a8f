//! Retrieves Microsoft Teams meeting attendance from a meeting invitation.
//!
//! The invitation's HTML body yields the meeting's thread identifier, an OAuth2
//! grant yields a bearer token, and the Microsoft Graph attendance endpoints
//! yield the reports and records that end up in a JSON file.

pub mod artifacts;
pub mod auth;
pub mod config;
pub mod email;
pub mod graph;
pub mod model;
pub mod prompt;
pub mod report;

/// Sets up `env_logger` the same way for every binary in this crate.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .init();
}
