//! Go interceptor runtime command implementation

use crate::cli::{CliConfig, FormatterKind};
use crate::Result;
use clap::Args;
use console::style;
use proxygen_core::generator::write_artifact;
use proxygen_core::ProxyRenderer;
use std::path::PathBuf;
use tracing::info;

/// Arguments for the runtime command
#[derive(Debug, Clone, Args)]
pub struct RuntimeArgs {
    /// Package clause of the runtime file
    #[arg(short, long, default_value = "interceptor")]
    pub package: String,

    /// Output file, overwritten if it exists
    #[arg(short, long)]
    pub output: PathBuf,

    /// Formatter for the generated source (defaults to the configured one)
    #[arg(long, value_enum)]
    pub formatter: Option<FormatterKind>,
}

/// Execute the runtime command
pub fn runtime_command(args: RuntimeArgs, config: &CliConfig) -> Result<()> {
    let kind = args.formatter.unwrap_or(config.format.formatter);
    let renderer = ProxyRenderer::new(super::formatter(kind, config)?, config.generator.clone());
    let source = renderer.render_runtime(&args.package)?;
    write_artifact(&args.output, &source)?;
    info!(output = %args.output.display(), "runtime package written");
    println!(
        "{} runtime package written to {}",
        style("✓").green(),
        args.output.display()
    );
    Ok(())
}
