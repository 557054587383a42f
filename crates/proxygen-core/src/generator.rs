//! One generation request end to end: build, finalize, render, write.

use std::fmt::{self, Display};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::builder::InterfaceBuilder;
use crate::descriptor::InterfaceDescriptor;
use crate::error::{Error, Result};
use crate::format::SourceFormatter;
use crate::module::ModuleLoader;
use crate::render::{is_identifier, ProxyRenderer, ProxyTarget, RenderOptions};

/// `import/path.InterfaceName`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfacePath {
    pub module: String,
    pub name: String,
}

impl InterfacePath {
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }
}

impl FromStr for InterfacePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            Error::InvalidInput(format!(
                "interface path {:?} must look like <package path>.<Interface>",
                s
            ))
        };
        // The package path may itself contain dots (`github.com/...`), so only
        // the last element is split.
        let (module, name) = s.rsplit_once('.').ok_or_else(invalid)?;
        if module.is_empty() || module.ends_with('/') || !is_identifier(name) {
            return Err(invalid());
        }
        Ok(Self::new(module, name))
    }
}

impl Display for InterfacePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerateRequest {
    pub interface: InterfacePath,
    /// Package clause of the generated file.
    pub package: String,
    /// Name of the generated proxy type.
    pub type_name: String,
}

pub struct Generator {
    loader: Arc<dyn ModuleLoader>,
    renderer: ProxyRenderer,
}

impl Generator {
    pub fn new(
        loader: Arc<dyn ModuleLoader>,
        formatter: Arc<dyn SourceFormatter>,
        options: RenderOptions,
    ) -> Self {
        Self {
            loader,
            renderer: ProxyRenderer::new(formatter, options),
        }
    }

    /// Flattened, finalized descriptor of `interface`.
    pub fn describe(&self, interface: &InterfacePath, package: &str) -> Result<InterfaceDescriptor> {
        let mut builder = InterfaceBuilder::new(self.loader.clone());
        let descriptor = builder
            .build(&interface.module, &interface.name, package)?
            .finalize();
        debug!(
            interface = %interface,
            methods = descriptor.methods.len(),
            imports = descriptor.imports.len(),
            "interface resolved"
        );
        Ok(descriptor)
    }

    /// Formatted proxy source for `request`.
    pub fn generate(&self, request: &GenerateRequest) -> Result<String> {
        let descriptor = self.describe(&request.interface, &request.package)?;
        let target = ProxyTarget::new(&request.package, &request.type_name);
        self.renderer.render(&descriptor, &target)
    }

    /// Generate and write the proxy. Nothing is written unless generation
    /// succeeds.
    pub fn generate_to_file(&self, request: &GenerateRequest, output: &Path) -> Result<()> {
        let source = self.generate(request)?;
        write_artifact(output, &source)?;
        info!(interface = %request.interface, output = %output.display(), "proxy written");
        Ok(())
    }

    /// Write the Go interceptor runtime package source.
    pub fn write_runtime(&self, package: &str, output: &Path) -> Result<()> {
        let source = self.renderer.render_runtime(package)?;
        write_artifact(output, &source)?;
        info!(output = %output.display(), "runtime package written");
        Ok(())
    }
}

/// Replace `path` with `contents`. A failed write removes the partial file.
pub fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    if let Err(err) = fs::write(path, contents) {
        if path.exists() {
            if let Err(cleanup) = fs::remove_file(path) {
                warn!(output = %path.display(), error = %cleanup, "could not remove partial output");
            }
        }
        return Err(err.into());
    }
    Ok(())
}
