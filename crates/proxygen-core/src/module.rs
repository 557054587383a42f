//! Package model supplied by a loader, and the loader seam itself.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::imports::{guess_package_name, ExistingImport};
use crate::ty::TypeExpr;

/// A direct dependency of a package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
    pub path: String,
    /// Declared package name, as far as the loader knows it.
    pub name: String,
}

impl Dependency {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportSpec {
    pub path: String,
    pub alias: Option<String>,
}

impl ImportSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: None,
        }
    }

    pub fn aliased(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            alias: Some(alias.into()),
        }
    }
}

/// One parameter or result declaration: `a, b int`, `...string`, `error`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldGroup {
    pub names: Vec<String>,
    /// For a variadic group this is the element type.
    pub ty: TypeExpr,
    pub variadic: bool,
}

impl FieldGroup {
    pub fn new(names: Vec<String>, ty: TypeExpr) -> Self {
        Self {
            names,
            ty,
            variadic: false,
        }
    }

    pub fn unnamed(ty: TypeExpr) -> Self {
        Self::new(Vec::new(), ty)
    }

    pub fn variadic(names: Vec<String>, elem: TypeExpr) -> Self {
        Self {
            names,
            ty: elem,
            variadic: true,
        }
    }

    /// Number of positional slots this group occupies.
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSpec {
    pub name: String,
    pub params: Vec<FieldGroup>,
    pub results: Vec<FieldGroup>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InterfaceMember {
    Method(MethodSpec),
    /// An unnamed member: an embedded interface, or a type-set element.
    Embedded(TypeExpr),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InterfaceDecl {
    pub members: Vec<InterfaceMember>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeDeclKind {
    Interface(InterfaceDecl),
    /// `type A = B`
    Alias,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub kind: TypeDeclKind,
}

impl TypeDecl {
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }

    pub fn as_interface(&self) -> Option<&InterfaceDecl> {
        match &self.kind {
            TypeDeclKind::Interface(decl) => Some(decl),
            _ => None,
        }
    }
}

/// One parsed file of a package.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub imports: Vec<ImportSpec>,
    pub types: Vec<TypeDecl>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleDescriptor {
    pub path: String,
    pub name: String,
    pub units: Vec<SourceUnit>,
    pub dependencies: Vec<Dependency>,
    exports: BTreeSet<String>,
}

impl ModuleDescriptor {
    pub fn new(
        path: impl Into<String>,
        name: impl Into<String>,
        units: Vec<SourceUnit>,
        dependencies: Vec<Dependency>,
    ) -> Self {
        let exports = units
            .iter()
            .flat_map(|unit| unit.types.iter())
            .filter(|decl| decl.is_exported())
            .map(|decl| decl.name.clone())
            .collect();
        Self {
            path: path.into(),
            name: name.into(),
            units,
            dependencies,
            exports,
        }
    }

    /// Exported type names declared by this package.
    pub fn exports(&self) -> &BTreeSet<String> {
        &self.exports
    }

    /// Every declaration of `name`, with the file that declares it.
    pub fn find_type(&self, name: &str) -> Vec<(&SourceUnit, &TypeDecl)> {
        self.units
            .iter()
            .flat_map(|unit| unit.types.iter().map(move |decl| (unit, decl)))
            .filter(|(_, decl)| decl.name == name)
            .collect()
    }

    pub fn dependency_name(&self, path: &str) -> Option<&str> {
        self.dependencies
            .iter()
            .find(|dep| dep.path == path)
            .map(|dep| dep.name.as_str())
    }

    /// The import declarations of `unit` as seen from inside this package.
    pub fn existing_imports(&self, unit: &SourceUnit) -> Vec<ExistingImport> {
        unit.imports
            .iter()
            .map(|spec| {
                let name = self
                    .dependency_name(&spec.path)
                    .map(str::to_string)
                    .unwrap_or_else(|| guess_package_name(&spec.path));
                ExistingImport::new(spec.path.clone(), name, spec.alias.clone())
            })
            .collect()
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Supplies parsed packages by import path.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, path: &str) -> Result<Arc<ModuleDescriptor>>;
}

/// Loader over a fixed set of packages held in memory.
#[derive(Default)]
pub struct StaticModuleLoader {
    modules: HashMap<String, Arc<ModuleDescriptor>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, module: ModuleDescriptor) {
        self.modules.insert(module.path.clone(), Arc::new(module));
    }

    pub fn with_module(mut self, module: ModuleDescriptor) -> Self {
        self.insert(module);
        self
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, path: &str) -> Result<Arc<ModuleDescriptor>> {
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ModuleNotFound(path.to_string()))
    }
}
