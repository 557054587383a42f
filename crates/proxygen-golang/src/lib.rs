//! Go language support for proxygen: a tree-sitter parser for declarations,
//! a filesystem package loader that honours build constraints and the module
//! cache, and formatters for generated code.

pub mod constraints;
pub mod env;
pub mod formatter;
pub mod gomod;
pub mod loader;
pub mod parser;

pub use constraints::BuildContext;
pub use env::GoEnv;
pub use formatter::{GoFormatter, GofmtFormatter};
pub use gomod::GoMod;
pub use loader::{GoLoaderOptions, GoModuleLoader};
pub use parser::GoParser;
