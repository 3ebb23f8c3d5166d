//! Admission CLI - command-line front end for the draft controller

#![allow(missing_docs)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;

pub use cli::cli;
pub use config::{AppConfig, ConfigError, Overrides, StorageConfig};
