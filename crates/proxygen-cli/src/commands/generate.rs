//! Proxy generation command implementation

use crate::cli::{CliConfig, FormatterKind};
use crate::Result;
use clap::Args;
use console::style;
use proxygen_core::{GenerateRequest, InterfacePath};
use std::path::PathBuf;

/// Arguments for the generate command
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Interface to proxy, as `<package path>.<Interface>`
    #[arg(short, long)]
    pub interface: String,

    /// Package clause of the generated file
    #[arg(short, long)]
    pub package: String,

    /// Name of the generated proxy type
    #[arg(short, long)]
    pub name: String,

    /// Output file, overwritten if it exists
    #[arg(short, long)]
    pub output: PathBuf,

    /// Formatter for the generated source (defaults to the configured one)
    #[arg(long, value_enum)]
    pub formatter: Option<FormatterKind>,

    /// Directory the go.mod lookup starts from
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

/// Execute the generate command
pub fn generate_command(args: GenerateArgs, config: &CliConfig) -> Result<()> {
    let interface: InterfacePath = args.interface.parse()?;
    let kind = args.formatter.unwrap_or(config.format.formatter);
    let generator = super::generator(&args.dir, kind, config)?;

    let request = GenerateRequest {
        interface,
        package: args.package,
        type_name: args.name,
    };
    generator.generate_to_file(&request, &args.output)?;
    println!("{} proxy generated successfully", style("✓").green());
    Ok(())
}
