//! Command implementations for the proxygen CLI

pub mod generate;
pub mod inspect;
pub mod runtime;

pub use generate::generate_command;
pub use inspect::inspect_command;
pub use runtime::runtime_command;

use crate::cli::{CliConfig, FormatterKind};
use crate::Result;
use proxygen_core::{Generator, PassthroughFormatter, SourceFormatter};
use proxygen_golang::{BuildContext, GoFormatter, GoLoaderOptions, GoModuleLoader, GofmtFormatter};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Formatter selected by `kind`, configured from `config`.
pub fn formatter(kind: FormatterKind, config: &CliConfig) -> Result<Arc<dyn SourceFormatter>> {
    Ok(match kind {
        FormatterKind::Builtin => Arc::new(GoFormatter::new()?),
        FormatterKind::Gofmt => Arc::new(GofmtFormatter::new(config.format.gofmt.clone())),
        FormatterKind::None => Arc::new(PassthroughFormatter),
    })
}

/// Filesystem loader rooted at `dir`.
pub fn loader(dir: &Path, config: &CliConfig) -> Result<GoModuleLoader> {
    let options = GoLoaderOptions {
        root: dir.to_path_buf(),
        search_paths: config.loader.search_paths.clone(),
        vendor: config.loader.vendor,
        goroot: config.loader.goroot.clone(),
        gomodcache: config.loader.gomodcache.clone(),
        build: BuildContext::host().with_tags(config.loader.build_tags.iter().cloned()),
    };
    Ok(GoModuleLoader::new(options)?)
}

/// Generator wired with the Go loader and the selected formatter.
pub fn generator(dir: &Path, kind: FormatterKind, config: &CliConfig) -> Result<Generator> {
    debug!(dir = %dir.display(), formatter = ?kind, "creating generator");
    let loader = loader(dir, config)?;
    Ok(Generator::new(
        Arc::new(loader),
        formatter(kind, config)?,
        config.generator.clone(),
    ))
}
