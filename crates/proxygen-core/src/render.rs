//! Go source emission for proxies and for the interceptor runtime package.

use std::sync::Arc;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::descriptor::{InterfaceDescriptor, MethodDescriptor};
use crate::error::{Error, Result};
use crate::format::SourceFormatter;

pub const DEFAULT_INTERCEPTOR_IMPORT: &str = "github.com/panagiotisptr/proxygen/interceptor";

/// Knobs of the proxy template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Import path of the Go interceptor runtime package.
    pub interceptor_import: String,
    /// Alias the runtime package is imported under.
    pub interceptor_alias: String,
    /// Receiver name of the generated methods.
    pub receiver: String,
    /// First line of every generated file.
    pub header: String,
    /// Emit a `New<Type>` constructor.
    pub constructor: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            interceptor_import: DEFAULT_INTERCEPTOR_IMPORT.to_string(),
            interceptor_alias: "proxygenInterceptor".to_string(),
            receiver: "proxy".to_string(),
            header: "// Code generated by proxygen. DO NOT EDIT.".to_string(),
            constructor: true,
        }
    }
}

/// Where the proxy goes: its package clause and type name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyTarget {
    pub package: String,
    pub type_name: String,
}

impl ProxyTarget {
    pub fn new(package: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            type_name: type_name.into(),
        }
    }
}

pub struct ProxyRenderer {
    formatter: Arc<dyn SourceFormatter>,
    options: RenderOptions,
}

impl ProxyRenderer {
    pub fn new(formatter: Arc<dyn SourceFormatter>, options: RenderOptions) -> Self {
        Self { formatter, options }
    }

    /// Render the proxy for a finalized descriptor and format it.
    pub fn render(&self, descriptor: &InterfaceDescriptor, target: &ProxyTarget) -> Result<String> {
        ensure_identifier("package name", &target.package)?;
        ensure_identifier("type name", &target.type_name)?;
        ensure_identifier("receiver name", &self.options.receiver)?;
        ensure_identifier("interceptor alias", &self.options.interceptor_alias)?;
        if let Some(field) = PROXY_FIELDS
            .iter()
            .find(|field| descriptor.method(field).is_some())
        {
            return Err(Error::InvalidInput(format!(
                "method {}.{} collides with the {} field of the generated proxy",
                descriptor.interface_name, field, field
            )));
        }

        let mut emitter = ProxyEmitter::new(&self.options, descriptor, target);
        emitter.emit();
        self.formatter.format(&emitter.finish())
    }

    /// Render the Go interceptor runtime package the proxies import.
    pub fn render_runtime(&self, package: &str) -> Result<String> {
        ensure_identifier("package name", package)?;
        let source = format!(
            "{}\n\npackage {}\n{}",
            self.options.header, package, RUNTIME_BODY
        );
        self.formatter.format(&source)
    }
}

/// Struct fields of every generated proxy.
const PROXY_FIELDS: [&str; 2] = ["Implementation", "Interceptors"];

const RUNTIME_BODY: &str = r#"
import (
	"fmt"
	"reflect"
)

// Handler receives the packed arguments of a call and returns its packed results.
type Handler func(args []interface{}) []interface{}

// Interceptor wraps the next handler of a chain for one method call.
type Interceptor func(method string, next Handler) Handler

// InterceptorChain is an ordered list of interceptors. Index 0 runs outermost.
type InterceptorChain []Interceptor

// Apply composes the chain around h and invokes it once with args.
func (chain InterceptorChain) Apply(args []interface{}, method string, h Handler) []interface{} {
	for i := len(chain) - 1; i >= 0; i-- {
		h = chain[i](method, h)
	}
	return h(args)
}

// Cast unpacks a value produced by a handler. A nil value yields the zero
// value of T; a value of any other type panics.
func Cast[T any](val interface{}) T {
	var zero T
	if val == nil {
		return zero
	}
	v, ok := val.(T)
	if !ok {
		panic(fmt.Sprintf("proxygen: cannot cast %T to %v", val, reflect.TypeOf((*T)(nil)).Elem()))
	}
	return v
}
"#;

struct ProxyEmitter<'a> {
    options: &'a RenderOptions,
    descriptor: &'a InterfaceDescriptor,
    target: &'a ProxyTarget,
    code: String,
    indent: usize,
}

impl<'a> ProxyEmitter<'a> {
    fn new(
        options: &'a RenderOptions,
        descriptor: &'a InterfaceDescriptor,
        target: &'a ProxyTarget,
    ) -> Self {
        Self {
            options,
            descriptor,
            target,
            code: String::new(),
            indent: 0,
        }
    }

    fn finish(mut self) -> String {
        let trimmed = self.code.trim_end().len();
        self.code.truncate(trimmed);
        self.code.push('\n');
        self.code
    }

    fn emit(&mut self) {
        self.push_line(&self.options.header);
        self.push_blank_line();
        self.push_line(&format!("package {}", self.target.package));
        self.push_blank_line();
        self.emit_imports();
        self.emit_assertions();
        self.emit_struct();
        if self.options.constructor {
            self.emit_constructor();
        }
        let descriptor = self.descriptor;
        for method in &descriptor.methods {
            self.emit_method(method);
        }
    }

    fn emit_imports(&mut self) {
        self.push_line("import (");
        self.indent += 1;
        self.push_line(&format!(
            "{} \"{}\"",
            self.options.interceptor_alias, self.options.interceptor_import
        ));
        if !self.descriptor.imports.is_empty() {
            self.push_blank_line();
        }
        for entry in self.descriptor.imports.entries() {
            self.push_line(&format!("{} \"{}\"", entry.alias, entry.path));
        }
        self.indent -= 1;
        self.push_line(")");
        self.push_blank_line();
    }

    fn emit_assertions(&mut self) {
        let target = self.target;
        let type_name = &target.type_name;
        let mut interfaces = vec![self.descriptor.implementation_type_name()];
        interfaces.extend(
            self.descriptor
                .embedded
                .iter()
                .map(|embedded| self.descriptor.render_type(&embedded.ty)),
        );
        for interface in interfaces {
            self.push_line(&format!("var _ {} = (*{})(nil)", interface, type_name));
        }
        self.push_blank_line();
    }

    fn emit_struct(&mut self) {
        let [implementation, interceptors] = PROXY_FIELDS;
        let fields = [
            (implementation, self.descriptor.implementation_type_name()),
            (
                interceptors,
                format!("{}.InterceptorChain", self.options.interceptor_alias),
            ),
        ];
        let width = fields.iter().map(|(name, _)| name.len()).max().unwrap_or(0);

        self.push_line(&format!("type {} struct {{", self.target.type_name));
        self.indent += 1;
        for (name, ty) in &fields {
            self.push_line(&format!("{:width$} {}", name, ty, width = width));
        }
        self.indent -= 1;
        self.push_line("}");
        self.push_blank_line();
    }

    fn emit_constructor(&mut self) {
        let target = self.target;
        let type_name = &target.type_name;
        self.push_line(&format!(
            "// New{} wraps impl so that every call runs through interceptors.",
            type_name
        ));
        self.push_line(&format!(
            "func New{}(impl {}, interceptors ...{}.Interceptor) *{} {{",
            type_name,
            self.descriptor.implementation_type_name(),
            self.options.interceptor_alias,
            type_name
        ));
        self.indent += 1;
        self.push_line(&format!("return &{}{{", type_name));
        self.indent += 1;
        self.push_line("Implementation: impl,");
        self.push_line("Interceptors:   interceptors,");
        self.indent -= 1;
        self.push_line("}");
        self.indent -= 1;
        self.push_line("}");
        self.push_blank_line();
    }

    fn emit_method(&mut self, method: &MethodDescriptor) {
        let descriptor = self.descriptor;
        let options = self.options;
        let alias = &options.interceptor_alias;
        let receiver = &options.receiver;

        let params = method
            .params
            .iter()
            .enumerate()
            .map(|(idx, param)| {
                let ty = descriptor.render_type(&param.ty);
                if param.variadic {
                    format!("arg{} ...{}", idx, ty)
                } else {
                    format!("arg{} {}", idx, ty)
                }
            })
            .join(", ");
        let results = method
            .results
            .iter()
            .map(|ty| descriptor.render_type(ty))
            .collect::<Vec<_>>();
        let result_list = match results.as_slice() {
            [] => String::new(),
            [single] => format!(" {}", single),
            many => format!(" ({})", many.join(", ")),
        };

        self.push_line(&format!(
            "func ({} *{}) {}({}){} {{",
            receiver, self.target.type_name, method.name, params, result_list
        ));
        self.indent += 1;

        let apply = format!("{}.Interceptors.Apply(", receiver);
        if results.is_empty() {
            self.push_line(&apply);
        } else {
            self.push_line(&format!("rets := {}", apply));
        }
        self.indent += 1;
        let packed = (0..method.params.len())
            .map(|idx| format!("arg{}", idx))
            .join(", ");
        self.push_line(&format!("[]interface{{}}{{{}}},", packed));
        self.push_line(&format!("\"{}\",", method.name));
        self.push_line("func(args []interface{}) []interface{} {");
        self.indent += 1;
        self.emit_terminal_call(method);
        let packed_results = (0..results.len())
            .map(|idx| format!("res{}", idx))
            .join(", ");
        self.push_line(&format!("return []interface{{}}{{{}}}", packed_results));
        self.indent -= 1;
        self.push_line("},");
        self.indent -= 1;
        self.push_line(")");

        if !results.is_empty() {
            let unpacked = results
                .iter()
                .enumerate()
                .map(|(idx, ty)| format!("{}.Cast[{}](rets[{}])", alias, ty, idx))
                .join(", ");
            self.push_line(&format!("return {}", unpacked));
        }
        self.indent -= 1;
        self.push_line("}");
        self.push_blank_line();
    }

    /// The call to the wrapped implementation inside the terminal handler.
    fn emit_terminal_call(&mut self, method: &MethodDescriptor) {
        let descriptor = self.descriptor;
        let options = self.options;
        let alias = &options.interceptor_alias;
        let bindings = if method.results.is_empty() {
            String::new()
        } else {
            let names = (0..method.results.len())
                .map(|idx| format!("res{}", idx))
                .join(", ");
            format!("{} := ", names)
        };
        let call = format!(
            "{}{}.Implementation.{}(",
            bindings, options.receiver, method.name
        );
        if method.params.is_empty() {
            self.push_line(&format!("{})", call));
            return;
        }
        self.push_line(&call);
        self.indent += 1;
        for (idx, param) in method.params.iter().enumerate() {
            if param.variadic {
                let slice = descriptor.render_type(&param.ty.to_slice());
                self.push_line(&format!("{}.Cast[{}](args[{}])...,", alias, slice, idx));
            } else {
                let ty = descriptor.render_type(&param.ty);
                self.push_line(&format!("{}.Cast[{}](args[{}]),", alias, ty, idx));
            }
        }
        self.indent -= 1;
        self.push_line(")");
    }

    fn push_line(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.code.push('\t');
        }
        self.code.push_str(line);
        self.code.push('\n');
    }

    fn push_blank_line(&mut self) {
        if self.code.ends_with("\n\n") || self.code.is_empty() {
            return;
        }
        if !self.code.ends_with('\n') {
            self.code.push('\n');
        }
        self.code.push('\n');
    }
}

const GO_KEYWORDS: &[&str] = &[
    "break",
    "case",
    "chan",
    "const",
    "continue",
    "default",
    "defer",
    "else",
    "fallthrough",
    "for",
    "func",
    "go",
    "goto",
    "if",
    "import",
    "interface",
    "map",
    "package",
    "range",
    "return",
    "select",
    "struct",
    "switch",
    "type",
    "var",
];

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_');
    starts_well
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_')
        && !GO_KEYWORDS.contains(&name)
}

fn ensure_identifier(what: &str, name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{} {:?} is not a valid Go identifier",
            what, name
        )))
    }
}
