//! Interface reflection and proxy generation for Go packages.
//!
//! The pipeline loads an interface declaration through a [`ModuleLoader`],
//! flattens it (embedded interfaces included) into an
//! [`InterfaceDescriptor`] whose types are resolved against a deterministic
//! import table, and renders a forwarding proxy that routes every call
//! through an interceptor chain.

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod generator;
pub mod imports;
pub mod module;
pub mod render;
pub mod resolve;
pub mod ty;

// Re-export commonly used items for convenience
pub use tracing;

pub use builder::InterfaceBuilder;
pub use descriptor::{EmbeddedInterface, InterfaceDescriptor, MethodDescriptor, Param};
pub use error::{Error, Result};
pub use format::{PassthroughFormatter, SourceFormatter};
pub use generator::{GenerateRequest, Generator, InterfacePath};
pub use imports::{ExistingImport, ImportEntry, ImportTable, Usage};
pub use module::{ModuleDescriptor, ModuleLoader, StaticModuleLoader};
pub use render::{ProxyRenderer, ProxyTarget, RenderOptions};
pub use resolve::TypeResolver;
pub use ty::{ChanDir, TypeExpr, TypeRef};

#[cfg(test)]
mod tests;
