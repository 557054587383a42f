//! Type expressions as written in a method signature and as resolved against
//! the import table of the generated file.

use serde::Serialize;

use crate::imports::{guess_package_name, ImportTable};

/// Direction of a channel type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

impl ChanDir {
    fn wrap(self, elem: &str) -> String {
        match self {
            ChanDir::Both => format!("chan {}", elem),
            ChanDir::Send => format!("chan<- {}", elem),
            ChanDir::Recv => format!("<-chan {}", elem),
        }
    }
}

/// Syntactic type expression, exactly as the loader parsed it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// Bare identifier: a predeclared type or a type of the declaring package.
    Named(String),
    Pointer(Box<TypeExpr>),
    /// `qualifier.Name`, where `qualifier` is the file-local package selector.
    Qualified { qualifier: String, name: String },
    /// `[]T`
    Slice(Box<TypeExpr>),
    /// `[N]T`
    Array { len: String, elem: Box<TypeExpr> },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Channel { dir: ChanDir, elem: Box<TypeExpr> },
    /// Verbatim source text of a construct without a rewrite rule
    /// (function types, generic instantiations, inline struct types, ...).
    Raw(String),
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        TypeExpr::Qualified {
            qualifier: qualifier.into(),
            name: name.into(),
        }
    }

    pub fn pointer(inner: TypeExpr) -> Self {
        TypeExpr::Pointer(Box::new(inner))
    }

    pub fn slice(elem: TypeExpr) -> Self {
        TypeExpr::Slice(Box::new(elem))
    }

    pub fn array(len: impl Into<String>, elem: TypeExpr) -> Self {
        TypeExpr::Array {
            len: len.into(),
            elem: Box::new(elem),
        }
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn channel(dir: ChanDir, elem: TypeExpr) -> Self {
        TypeExpr::Channel {
            dir,
            elem: Box::new(elem),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        TypeExpr::Raw(text.into())
    }
}

/// A type expression after resolution. Package references are keyed by
/// import path so the same tree renders against any import table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeRef {
    Builtin { name: String },
    Qualified { module: String, name: String },
    /// A selector whose package could not be matched; rendered as written.
    Unresolved { qualifier: String, name: String },
    Pointer { inner: Box<TypeRef> },
    Slice { elem: Box<TypeRef> },
    Array { len: String, elem: Box<TypeRef> },
    Map { key: Box<TypeRef>, value: Box<TypeRef> },
    Channel { dir: ChanDir, elem: Box<TypeRef> },
    Raw { text: String },
}

impl TypeRef {
    pub fn builtin(name: impl Into<String>) -> Self {
        TypeRef::Builtin { name: name.into() }
    }

    pub fn qualified(module: impl Into<String>, name: impl Into<String>) -> Self {
        TypeRef::Qualified {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Slice form of this type, used to unpack a variadic argument.
    pub fn to_slice(&self) -> TypeRef {
        TypeRef::Slice {
            elem: Box::new(self.clone()),
        }
    }

    /// Render the type for a file whose imports are described by `imports`.
    pub fn render(&self, imports: &ImportTable) -> String {
        match self {
            TypeRef::Builtin { name } => name.clone(),
            TypeRef::Qualified { module, name } => match imports.alias_of(module) {
                Some(alias) => format!("{}.{}", alias, name),
                None => format!("{}.{}", guess_package_name(module), name),
            },
            TypeRef::Unresolved { qualifier, name } => format!("{}.{}", qualifier, name),
            TypeRef::Pointer { inner } => format!("*{}", inner.render(imports)),
            TypeRef::Slice { elem } => format!("[]{}", elem.render(imports)),
            TypeRef::Array { len, elem } => format!("[{}]{}", len, elem.render(imports)),
            TypeRef::Map { key, value } => {
                format!("map[{}]{}", key.render(imports), value.render(imports))
            }
            TypeRef::Channel { dir, elem } => {
                let rendered = elem.render(imports);
                // `chan <-chan T` would parse as `chan<- (chan T)`
                let receive_elem = matches!(
                    elem.as_ref(),
                    TypeRef::Channel {
                        dir: ChanDir::Recv,
                        ..
                    }
                );
                if *dir == ChanDir::Both && receive_elem {
                    format!("chan ({})", rendered)
                } else {
                    dir.wrap(&rendered)
                }
            }
            TypeRef::Raw { text } => text.clone(),
        }
    }
}
