//! proxygen CLI library
//!
//! Argument types, configuration and command implementations behind the
//! `proxygen` binary, which generates interceptor proxies for Go interfaces.

pub mod cli;
pub mod commands;
pub mod diagnostics;

pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug)]
    pub enum CliError {
        #[error(transparent)]
        Core(#[from] proxygen_core::Error),

        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),

        #[error("Configuration error: {0}")]
        Config(String),

        #[error("Invalid input: {0}")]
        InvalidInput(String),
    }

    pub type Result<T> = std::result::Result<T, CliError>;
}

pub use error::{CliError, Result};
