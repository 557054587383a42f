//! CLI configuration and settings management

use crate::{CliError, Result};
use proxygen_core::RenderOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "proxygen.toml";

/// CLI configuration loaded from config files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Proxy template settings
    pub generator: RenderOptions,

    /// Package lookup settings
    pub loader: LoaderConfig,

    /// Output formatting settings
    pub format: FormatConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// GOPATH-style roots searched after the main module
    pub search_paths: Vec<PathBuf>,

    /// Resolve imports through `vendor/`
    pub vendor: bool,

    /// Standard library root, found through `$GOROOT` or the `go` binary when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goroot: Option<PathBuf>,

    /// Module cache for `require`d modules, defaults to `go env GOMODCACHE`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gomodcache: Option<PathBuf>,

    /// Extra build tags, as with `go build -tags`
    pub build_tags: Vec<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            vendor: true,
            goroot: None,
            gomodcache: None,
            build_tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FormatterKind {
    /// Built-in tree-sitter validation and layout normalization
    #[default]
    Builtin,
    /// Pipe the output through `gofmt`
    Gofmt,
    /// Write the rendered text unchanged
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Formatter used when `--formatter` is not given
    pub formatter: FormatterKind,

    /// `gofmt` binary
    pub gofmt: PathBuf,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            formatter: FormatterKind::Builtin,
            gofmt: PathBuf::from("gofmt"),
        }
    }
}

impl CliConfig {
    /// Load configuration from file, falling back to defaults
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(home_dir) = dirs::home_dir() {
            candidates.push(home_dir.join(".proxygen.toml"));
        }
        if let Some(path) = Self::default_config_path() {
            candidates.push(path);
        }

        for candidate in candidates {
            if candidate.is_file() {
                debug!(path = %candidate.display(), "loading configuration");
                return Self::load_from_file(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| {
            CliError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                CliError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        std::fs::write(path, content)
            .map_err(|e| CliError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("proxygen").join("config.toml"))
    }
}
