//! Interface inspection command implementation

use crate::cli::{CliConfig, FormatterKind};
use crate::Result;
use clap::Args;
use proxygen_core::InterfacePath;
use std::path::PathBuf;

/// Arguments for the inspect command
#[derive(Debug, Clone, Args)]
pub struct InspectArgs {
    /// Interface to describe, as `<package path>.<Interface>`
    #[arg(short, long)]
    pub interface: String,

    /// Package the type references are qualified against
    #[arg(short, long, default_value = "proxy")]
    pub package: String,

    /// Directory the go.mod lookup starts from
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

/// Flattened descriptor of the interface as pretty JSON.
pub fn inspect_json(args: &InspectArgs, config: &CliConfig) -> Result<String> {
    let interface: InterfacePath = args.interface.parse()?;
    let generator = super::generator(&args.dir, FormatterKind::None, config)?;
    let descriptor = generator.describe(&interface, &args.package)?;
    serde_json::to_string_pretty(&descriptor.summary())
        .map_err(|e| proxygen_core::Error::from(e).into())
}

/// Execute the inspect command
pub fn inspect_command(args: InspectArgs, config: &CliConfig) -> Result<()> {
    println!("{}", inspect_json(&args, config)?);
    Ok(())
}
