//! Diagnostic and error reporting utilities

use crate::{CliError, Result};
use miette::Diagnostic;
use thiserror::Error;

/// Set up enhanced error reporting with miette
pub fn setup_error_reporting() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .map_err(|e| CliError::Config(format!("Failed to setup error reporting: {}", e)))?;

    Ok(())
}

/// Diagnostics with a source snippet or a hint attached
#[derive(Error, Debug, Diagnostic)]
pub enum ProxygenDiagnostic {
    #[error("generated proxy does not format: {message}")]
    #[diagnostic(
        code(proxygen::format_error),
        help("the interface probably uses a construct the generator copies verbatim")
    )]
    Format {
        message: String,
        #[source_code]
        src: String,
        #[label("rejected here")]
        err_span: miette::SourceSpan,
    },

    #[error("{message}")]
    #[diagnostic(
        code(proxygen::lookup_error),
        help("check --interface and --dir; the package must be reachable from the nearest go.mod, vendor/ or a configured search path")
    )]
    Lookup { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(proxygen::config_error),
        help("check proxygen.toml for correct syntax and values")
    )]
    Config { message: String },
}

/// Helper to attach the rejected fragment of a format failure
pub fn format_error(message: impl Into<String>, fragment: &str) -> ProxygenDiagnostic {
    ProxygenDiagnostic::Format {
        message: message.into(),
        src: fragment.to_string(),
        err_span: (0, fragment.len()).into(),
    }
}

/// Convert a CLI error into a rich diagnostic when one applies
pub fn diagnose(error: &CliError) -> Option<ProxygenDiagnostic> {
    use proxygen_core::Error;

    match error {
        CliError::Core(Error::Format { message, fragment }) if !fragment.is_empty() => {
            Some(format_error(message.clone(), fragment))
        }
        CliError::Core(
            err @ (Error::NotFound { .. } | Error::ModuleNotFound(_) | Error::Load { .. }),
        ) => Some(ProxygenDiagnostic::Lookup {
            message: err.to_string(),
        }),
        CliError::Config(message) => Some(ProxygenDiagnostic::Config {
            message: message.clone(),
        }),
        _ => None,
    }
}

/// Print `error` through miette. Returns false when the error has no
/// diagnostic form and should be reported by the caller.
pub fn render_cli_error(error: &CliError) -> bool {
    match diagnose(error) {
        Some(diagnostic) => {
            eprintln!("{:?}", miette::Report::new(diagnostic));
            true
        }
        None => false,
    }
}
