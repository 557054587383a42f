use std::result;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("interface {name} not found in package {module}")]
    NotFound { module: String, name: String },
    #[error("{name} in package {module} cannot be proxied: {reason}")]
    AmbiguousDeclaration {
        module: String,
        name: String,
        reason: String,
    },
    #[error("package not found: {0}")]
    ModuleNotFound(String),
    #[error("failed to load package {module}: {message}")]
    Load { module: String, message: String },
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error("generated source does not format: {message}\n{fragment}")]
    Format { message: String, fragment: String },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Generic error: {0}")]
    Generic(String),
}

impl Error {
    pub fn load(module: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Load {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn format(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        Error::Format {
            message: message.into(),
            fragment: fragment.into(),
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

// Convert from eyre::Report to our Error type
impl From<eyre::Report> for Error {
    fn from(err: eyre::Report) -> Self {
        Error::Generic(err.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Generic(s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Generic(e.to_string())
    }
}
