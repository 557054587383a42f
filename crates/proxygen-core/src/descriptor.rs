use serde::Serialize;

use crate::imports::ImportTable;
use crate::ty::TypeRef;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Param {
    /// Element type when `variadic` is set.
    pub ty: TypeRef,
    pub variadic: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MethodDescriptor {
    pub name: String,
    pub params: Vec<Param>,
    pub results: Vec<TypeRef>,
}

/// An exported interface flattened into the descriptor through embedding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbeddedInterface {
    pub module: String,
    pub name: String,
    pub ty: TypeRef,
}

/// Flattened method and import model of one interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InterfaceDescriptor {
    pub home_module: String,
    pub interface_name: String,
    pub methods: Vec<MethodDescriptor>,
    pub imports: ImportTable,
    pub implementation_type: TypeRef,
    pub embedded: Vec<EmbeddedInterface>,
}

impl InterfaceDescriptor {
    pub fn render_type(&self, ty: &TypeRef) -> String {
        ty.render(&self.imports)
    }

    pub fn implementation_type_name(&self) -> String {
        self.render_type(&self.implementation_type)
    }

    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|method| method.name == name)
    }

    /// Prune unused imports and renumber the remaining aliases.
    pub fn finalize(mut self) -> Self {
        self.imports = self.imports.finalize();
        self
    }

    /// The descriptor with every type rendered against its import table.
    pub fn summary(&self) -> InterfaceSummary {
        InterfaceSummary {
            home_module: self.home_module.clone(),
            interface_name: self.interface_name.clone(),
            implementation_type: self.implementation_type_name(),
            imports: self
                .imports
                .entries()
                .iter()
                .map(|entry| ImportSummary {
                    path: entry.path.clone(),
                    alias: entry.alias.clone(),
                })
                .collect(),
            methods: self
                .methods
                .iter()
                .map(|method| MethodSummary {
                    name: method.name.clone(),
                    params: method
                        .params
                        .iter()
                        .map(|param| {
                            let ty = self.render_type(&param.ty);
                            if param.variadic {
                                format!("...{}", ty)
                            } else {
                                ty
                            }
                        })
                        .collect(),
                    results: method
                        .results
                        .iter()
                        .map(|ty| self.render_type(ty))
                        .collect(),
                })
                .collect(),
            embedded: self
                .embedded
                .iter()
                .map(|embedded| self.render_type(&embedded.ty))
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InterfaceSummary {
    pub home_module: String,
    pub interface_name: String,
    pub implementation_type: String,
    pub imports: Vec<ImportSummary>,
    pub methods: Vec<MethodSummary>,
    pub embedded: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub path: String,
    pub alias: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MethodSummary {
    pub name: String,
    pub params: Vec<String>,
    pub results: Vec<String>,
}
