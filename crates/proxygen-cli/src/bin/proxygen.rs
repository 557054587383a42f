//! proxygen CLI Binary
//!
//! Generates Go proxies that route every method of an interface through an
//! interceptor chain.
//!
//! # Usage
//!
//! ```bash
//! # Generate a proxy for example.com/app/service.Greeter
//! proxygen generate --interface example.com/app/service.Greeter \
//!     --package proxies --name GreeterProxy --output proxies/greeter.go
//!
//! # Write the interceptor runtime package the proxies import
//! proxygen runtime --package interceptor --output interceptor/interceptor.go
//!
//! # Show the flattened method set of an interface
//! proxygen inspect --interface example.com/app/service.Greeter
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use proxygen_cli::{
    Result,
    cli::CliConfig,
    commands::{self, generate::GenerateArgs, inspect::InspectArgs, runtime::RuntimeArgs},
    diagnostics::setup_error_reporting,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "proxygen",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate interceptor proxies for Go interfaces",
    long_about = r#"
proxygen reads a Go interface, flattens its embedded interfaces and writes a
proxy type whose methods pass their arguments through an interceptor chain
before reaching the wrapped implementation.

EXAMPLES:
    proxygen generate -i example.com/app/service.Greeter -p proxies -n GreeterProxy -o greeter.go
    proxygen runtime -p interceptor -o interceptor/interceptor.go
    proxygen inspect -i example.com/app/service.Greeter
    "#
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, global = true, value_enum)]
    log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, global = true, value_enum, default_value = "pretty")]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Working directory
    #[arg(short = 'C', long, global = true)]
    directory: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a proxy for a Go interface
    Generate(GenerateArgs),

    /// Write the Go interceptor runtime package
    Runtime(RuntimeArgs),

    /// Print the flattened descriptor of a Go interface as JSON
    Inspect(InspectArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_error_reporting()?;

    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(proxygen_cli::CliError::Io)?;
    }

    let result = CliConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Generate(args) => commands::generate_command(args, &config),
        Commands::Runtime(args) => commands::runtime_command(args, &config),
        Commands::Inspect(args) => commands::inspect_command(args, &config),
    });

    match result {
        Ok(_) => {
            if cli.verbose > 0 {
                info!("Command completed successfully");
            }
            Ok(())
        }
        Err(e) => {
            use tracing::error;
            if !proxygen_cli::diagnostics::render_cli_error(&e) {
                error!("{}", e);
            }
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            std::process::exit(1);
        }
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
