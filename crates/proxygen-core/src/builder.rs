//! Builds the flattened [`InterfaceDescriptor`] of an interface.
//!
//! Embedded interfaces are walked with an explicit stack of
//! `(package path, type name)` pairs and a visited set. Declared methods come
//! first, then embedded ones in embedding order, depth-first. An interface
//! reached twice (diamond or cycle) is only flattened once.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::descriptor::{EmbeddedInterface, InterfaceDescriptor, MethodDescriptor, Param};
use crate::error::{Error, Result};
use crate::imports::{ImportTable, Usage};
use crate::module::{
    FieldGroup, InterfaceDecl, InterfaceMember, MethodSpec, ModuleDescriptor, ModuleLoader,
    SourceUnit, TypeDecl,
};
use crate::resolve::TypeResolver;
use crate::ty::{TypeExpr, TypeRef};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct WorkItem {
    module: String,
    name: String,
}

/// Embedded members are queued in declaration order; predeclared interfaces
/// carry their method so it lands at the position of the embed.
enum Step {
    Interface(WorkItem),
    Predeclared(MethodDescriptor),
}

pub struct InterfaceBuilder {
    loader: Arc<dyn ModuleLoader>,
    modules: HashMap<String, Arc<ModuleDescriptor>>,
}

impl InterfaceBuilder {
    pub fn new(loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            loader,
            modules: HashMap::new(),
        }
    }

    /// Build the descriptor of `module_path.interface_name`. Imports are
    /// provisional: call [`InterfaceDescriptor::finalize`] before rendering.
    pub fn build(
        &mut self,
        module_path: &str,
        interface_name: &str,
        output_package: &str,
    ) -> Result<InterfaceDescriptor> {
        debug!(module_path, interface_name, output_package, "building interface descriptor");
        let root = WorkItem {
            module: module_path.to_string(),
            name: interface_name.to_string(),
        };

        let mut imports = ImportTable::new(interface_name);
        let mut methods: Vec<MethodDescriptor> = Vec::new();
        let mut method_names = HashSet::new();
        let mut embedded = Vec::new();
        let mut implementation_type = None;

        let mut visited = HashSet::new();
        let mut stack = vec![Step::Interface(root.clone())];
        while let Some(step) = stack.pop() {
            let item = match step {
                Step::Interface(item) => item,
                Step::Predeclared(method) => {
                    if method_names.insert(method.name.clone()) {
                        methods.push(method);
                    }
                    continue;
                }
            };
            if !visited.insert(item.clone()) {
                debug!(module = %item.module, name = %item.name, "interface already flattened");
                continue;
            }
            let is_root = item == root;
            let module = self.module(&item.module)?;
            if is_root && module.name == output_package {
                warn!(
                    module = %module.path,
                    "output package has the same name as the interface's package"
                );
            }
            let (unit, decl) = locate(&module, &item.name, is_root)?;
            let interface = interface_of(&module, decl)?;

            let existing = module.existing_imports(unit);
            let mut local = provisional_imports(interface_name, &module, &existing);
            let usage = if is_root {
                Usage::Root
            } else {
                Usage::EmbeddedInterface
            };
            let resolver = TypeResolver::new(&module.path, module.exports(), &existing, usage);

            if is_root {
                implementation_type =
                    Some(resolver.resolve_ref(&TypeExpr::named(&item.name), &mut local));
            } else if decl.is_exported() {
                let owner =
                    TypeResolver::new(&module.path, module.exports(), &existing, Usage::EmbeddingOwner);
                embedded.push(EmbeddedInterface {
                    module: module.path.clone(),
                    name: item.name.clone(),
                    ty: owner.resolve_ref(&TypeExpr::named(&item.name), &mut local),
                });
            }

            let mut children = Vec::new();
            for member in &interface.members {
                match member {
                    InterfaceMember::Method(spec) => {
                        if !method_names.insert(spec.name.clone()) {
                            debug!(method = %spec.name, "method already present, keeping first");
                            continue;
                        }
                        methods.push(resolve_method(&resolver, spec, &mut local));
                    }
                    InterfaceMember::Embedded(expr) => {
                        match embedded_target(&resolver, &module, expr) {
                            EmbeddedTarget::Interface(child) => children.push(Step::Interface(child)),
                            EmbeddedTarget::Predeclared(name) => {
                                children.extend(predeclared_method(name).map(Step::Predeclared));
                            }
                            EmbeddedTarget::Skipped => {}
                        }
                    }
                }
            }

            imports.merge(local);
            stack.extend(children.into_iter().rev());
        }

        let implementation_type = implementation_type.ok_or_else(|| Error::NotFound {
            module: module_path.to_string(),
            name: interface_name.to_string(),
        })?;

        Ok(InterfaceDescriptor {
            home_module: module_path.to_string(),
            interface_name: interface_name.to_string(),
            methods,
            imports,
            implementation_type,
            embedded,
        })
    }

    fn module(&mut self, path: &str) -> Result<Arc<ModuleDescriptor>> {
        if let Some(module) = self.modules.get(path) {
            return Ok(module.clone());
        }
        let module = self.loader.load(path)?;
        self.modules.insert(path.to_string(), module.clone());
        Ok(module)
    }
}

fn locate<'m>(
    module: &'m ModuleDescriptor,
    name: &str,
    require_exported: bool,
) -> Result<(&'m SourceUnit, &'m TypeDecl)> {
    let not_found = || Error::NotFound {
        module: module.path.clone(),
        name: name.to_string(),
    };
    let candidates = module.find_type(name);
    match candidates.as_slice() {
        [] => Err(not_found()),
        [(_, decl)] if require_exported && !decl.is_exported() => Err(not_found()),
        [found] => Ok(*found),
        _ => Err(Error::AmbiguousDeclaration {
            module: module.path.clone(),
            name: name.to_string(),
            reason: format!("declared {} times", candidates.len()),
        }),
    }
}

fn interface_of<'d>(module: &ModuleDescriptor, decl: &'d TypeDecl) -> Result<&'d InterfaceDecl> {
    let interface = decl
        .as_interface()
        .ok_or_else(|| Error::AmbiguousDeclaration {
            module: module.path.clone(),
            name: decl.name.clone(),
            reason: "not an interface type".to_string(),
        })?;
    if !decl.type_params.is_empty() {
        return Err(Error::Unsupported(format!(
            "generic interface {}.{}",
            module.path, decl.name
        )));
    }
    Ok(interface)
}

/// The declaring package plus every import of the declaring file.
fn provisional_imports(
    interface_name: &str,
    module: &ModuleDescriptor,
    existing: &[crate::imports::ExistingImport],
) -> ImportTable {
    let candidates = std::iter::once((module.path.clone(), module.name.clone())).chain(
        existing
            .iter()
            .map(|import| (import.path.clone(), import.name.clone())),
    );
    ImportTable::provisional(interface_name, candidates)
}

fn resolve_method(
    resolver: &TypeResolver<'_>,
    spec: &MethodSpec,
    imports: &mut ImportTable,
) -> MethodDescriptor {
    let params = spec
        .params
        .iter()
        .flat_map(|group| expand(group, resolver, imports))
        .collect();
    let results = spec
        .results
        .iter()
        .flat_map(|group| expand(group, resolver, imports))
        .map(|param| param.ty)
        .collect();
    MethodDescriptor {
        name: spec.name.clone(),
        params,
        results,
    }
}

/// One entry per declared name, so `a, b int` keeps its arity of two.
fn expand(group: &FieldGroup, resolver: &TypeResolver<'_>, imports: &mut ImportTable) -> Vec<Param> {
    let ty = resolver.resolve_ref(&group.ty, imports);
    (0..group.arity())
        .map(|_| Param {
            ty: ty.clone(),
            variadic: group.variadic,
        })
        .collect()
}

enum EmbeddedTarget<'a> {
    Interface(WorkItem),
    Predeclared(&'a str),
    Skipped,
}

fn embedded_target<'a>(
    resolver: &TypeResolver<'_>,
    module: &ModuleDescriptor,
    expr: &'a TypeExpr,
) -> EmbeddedTarget<'a> {
    match expr {
        TypeExpr::Named(name) if module.find_type(name).is_empty() => {
            EmbeddedTarget::Predeclared(name)
        }
        TypeExpr::Named(name) => EmbeddedTarget::Interface(WorkItem {
            module: module.path.clone(),
            name: name.clone(),
        }),
        TypeExpr::Qualified { qualifier, name } => match resolver.module_for_qualifier(qualifier) {
            Some(path) => EmbeddedTarget::Interface(WorkItem {
                module: path.to_string(),
                name: name.clone(),
            }),
            None => {
                warn!(
                    module = %module.path,
                    qualifier = %qualifier,
                    name = %name,
                    "embedded interface has an unknown package selector, skipping it"
                );
                EmbeddedTarget::Skipped
            }
        },
        other => {
            warn!(module = %module.path, member = ?other, "skipping type-set element in interface");
            EmbeddedTarget::Skipped
        }
    }
}

/// Methods contributed by embedding a predeclared interface.
fn predeclared_method(name: &str) -> Option<MethodDescriptor> {
    match name {
        "error" => Some(MethodDescriptor {
            name: "Error".to_string(),
            params: Vec::new(),
            results: vec![TypeRef::builtin("string")],
        }),
        "any" | "comparable" => None,
        other => {
            warn!(name = other, "embedded identifier is neither declared nor predeclared");
            None
        }
    }
}
