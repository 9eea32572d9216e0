pub mod auth;
pub mod config;
pub mod constants;
pub mod envelope;
pub mod extract;
pub mod hardening;
pub mod health;
pub mod ingress;
pub mod logging;
pub mod main_helper;
pub mod pipeline;
pub mod prompt;
pub mod redaction;
pub mod server;
pub mod specs;
pub mod str_utils;
pub mod types;
pub mod upstream;

pub use types::*;

pub use main_helper::{AppState, Args};
