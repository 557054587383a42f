use crate::error::Result;

/// Canonical source formatter for generated text.
///
/// Implementations return the normalized text, or [`crate::Error::Format`]
/// naming the offending fragment when the text does not parse.
pub trait SourceFormatter: Send + Sync {
    fn format(&self, source: &str) -> Result<String>;
}

/// Returns the text unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct PassthroughFormatter;

impl SourceFormatter for PassthroughFormatter {
    fn format(&self, source: &str) -> Result<String> {
        Ok(source.to_string())
    }
}
