use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::imports::{find_by_selector, ExistingImport, ImportTable, Usage};
use crate::ty::{TypeExpr, TypeRef};

/// Rewrites type expressions read from one source file so they are valid in
/// the generated file.
///
/// Every package a resolved expression refers to is marked used in the target
/// import table with the resolver's [`Usage`].
pub struct TypeResolver<'a> {
    home_module: &'a str,
    home_types: &'a BTreeSet<String>,
    existing: &'a [ExistingImport],
    usage: Usage,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        home_module: &'a str,
        home_types: &'a BTreeSet<String>,
        existing: &'a [ExistingImport],
        usage: Usage,
    ) -> Self {
        Self {
            home_module,
            home_types,
            existing,
            usage,
        }
    }

    /// Resolve and render `expr` against `imports`.
    pub fn resolve(&self, expr: &TypeExpr, imports: &mut ImportTable) -> String {
        let resolved = self.resolve_ref(expr, imports);
        resolved.render(imports)
    }

    pub fn resolve_ref(&self, expr: &TypeExpr, imports: &mut ImportTable) -> TypeRef {
        match expr {
            TypeExpr::Named(name) => {
                if self.home_types.contains(name) {
                    imports.mark_used(self.home_module, self.usage);
                    TypeRef::qualified(self.home_module, name.clone())
                } else {
                    TypeRef::builtin(name.clone())
                }
            }
            TypeExpr::Pointer(inner) => TypeRef::Pointer {
                inner: Box::new(self.resolve_ref(inner, imports)),
            },
            TypeExpr::Qualified { qualifier, name } => {
                self.resolve_selector(qualifier, name, imports)
            }
            TypeExpr::Slice(elem) => TypeRef::Slice {
                elem: Box::new(self.resolve_ref(elem, imports)),
            },
            TypeExpr::Array { len, elem } => TypeRef::Array {
                len: len.clone(),
                elem: Box::new(self.resolve_ref(elem, imports)),
            },
            TypeExpr::Map { key, value } => TypeRef::Map {
                key: Box::new(self.resolve_ref(key, imports)),
                value: Box::new(self.resolve_ref(value, imports)),
            },
            TypeExpr::Channel { dir, elem } => TypeRef::Channel {
                dir: *dir,
                elem: Box::new(self.resolve_ref(elem, imports)),
            },
            TypeExpr::Raw(text) => {
                debug!(text = %text, "no rewrite rule for type construct, kept verbatim");
                TypeRef::Raw { text: text.clone() }
            }
        }
    }

    /// Package path a file-local qualifier refers to.
    pub fn module_for_qualifier(&self, qualifier: &str) -> Option<&'a str> {
        find_by_selector(self.existing, qualifier).map(|import| import.path.as_str())
    }

    fn resolve_selector(&self, qualifier: &str, name: &str, imports: &mut ImportTable) -> TypeRef {
        let Some(import) = find_by_selector(self.existing, qualifier) else {
            warn!(
                module = self.home_module,
                qualifier, name, "unresolved package selector, emitting it as written"
            );
            return TypeRef::Unresolved {
                qualifier: qualifier.to_string(),
                name: name.to_string(),
            };
        };
        if !imports.mark_used(&import.path, self.usage) {
            imports.insert(import.path.clone(), import.name.clone());
            imports.mark_used(&import.path, self.usage);
        }
        TypeRef::qualified(import.path.clone(), name)
    }
}
