//! Go declaration parser built on top of `tree-sitter-go`.
//!
//! Only the parts of a file the proxy generator looks at are mapped: the
//! package clause, import declarations and type declarations. Interface
//! bodies are mapped member by member; everything else is summarized as
//! [`TypeDeclKind::Other`].

use std::path::Path;

use eyre::{eyre, Result};
use proxygen_core::module::{
    FieldGroup, ImportSpec, InterfaceDecl, InterfaceMember, MethodSpec, SourceUnit, TypeDecl,
    TypeDeclKind,
};
use proxygen_core::ty::{ChanDir, TypeExpr};
use tracing::warn;
use tree_sitter::{Node as TsNode, Parser as TsParser, Tree};

/// A parsed Go file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedFile {
    pub package: String,
    pub unit: SourceUnit,
}

/// Position of the first syntax error of a file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxError {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
    /// Source text of the offending line.
    pub fragment: String,
}

/// High-level parser that owns a tree-sitter instance for Go.
pub struct GoParser {
    parser: TsParser,
}

impl GoParser {
    /// Create a new parser instance with the Go grammar loaded.
    pub fn new() -> Result<Self> {
        let mut parser = TsParser::new();
        parser
            .set_language(&tree_sitter_go::LANGUAGE.into())
            .map_err(|err| eyre!("Failed to load tree-sitter Go grammar: {err}"))?;
        Ok(Self { parser })
    }

    fn tree(&mut self, source: &str) -> Result<Tree> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| eyre!("failed to parse Go source"))
    }

    /// Parse the declarations of one Go file. A file with syntax errors is
    /// rejected.
    pub fn parse_str(&mut self, source: &str, path: &Path) -> Result<ParsedFile> {
        let tree = self.tree(source)?;
        let root = tree.root_node();
        if let Some(error) = first_syntax_error(root, source) {
            return Err(eyre!(
                "syntax error in {} at line {}, column {}: {}",
                path.display(),
                error.line,
                error.column,
                error.fragment.trim()
            ));
        }
        parse_file(root, source, path)
    }

    /// Package clause of `source`, without mapping the rest of the file.
    pub fn package_name(&mut self, source: &str) -> Result<Option<String>> {
        let tree = self.tree(source)?;
        let root = tree.root_node();
        let mut cursor = root.walk();
        let clause = root
            .named_children(&mut cursor)
            .find(|child| child.kind() == "package_clause");
        Ok(clause.and_then(|clause| parse_package_clause(clause, source)))
    }

    /// First syntax error of `source`, if any.
    pub fn check(&mut self, source: &str) -> Result<Option<SyntaxError>> {
        let tree = self.tree(source)?;
        Ok(first_syntax_error(tree.root_node(), source))
    }
}

fn first_syntax_error(root: TsNode, source: &str) -> Option<SyntaxError> {
    if !root.has_error() {
        return None;
    }
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let position = node.start_position();
            return Some(SyntaxError {
                line: position.row + 1,
                column: position.column + 1,
                fragment: source.lines().nth(position.row).unwrap_or_default().to_string(),
            });
        }
        if !node.has_error() {
            continue;
        }
        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    let end = root.end_position();
    Some(SyntaxError {
        line: end.row + 1,
        column: end.column + 1,
        fragment: String::new(),
    })
}

fn parse_file(root: TsNode, source: &str, path: &Path) -> Result<ParsedFile> {
    let mut cursor = root.walk();
    let mut package = None;
    let mut imports = Vec::new();
    let mut types = Vec::new();

    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "package_clause" => {
                package = parse_package_clause(child, source);
            }
            "import_declaration" => {
                imports.extend(parse_import_declaration(child, source)?);
            }
            "type_declaration" => {
                types.extend(parse_type_declaration(child, source)?);
            }
            // values and functions carry nothing a proxy needs
            _ => {}
        }
    }

    let package = package.ok_or_else(|| eyre!("{} has no package clause", path.display()))?;
    Ok(ParsedFile {
        package,
        unit: SourceUnit {
            path: path.to_path_buf(),
            imports,
            types,
        },
    })
}

fn parse_package_clause(node: TsNode, source: &str) -> Option<String> {
    if let Some(name_node) = node.child_by_field_name("name") {
        if let Ok(name) = name_node.utf8_text(source.as_bytes()) {
            return Some(name.to_string());
        }
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.kind() == "identifier" || child.kind() == "package_identifier" {
            if let Ok(name) = child.utf8_text(source.as_bytes()) {
                return Some(name.to_string());
            }
        }
    }
    warn!("package clause missing name");
    None
}

fn parse_import_declaration(node: TsNode, source: &str) -> Result<Vec<ImportSpec>> {
    let mut imports = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => imports.extend(parse_import_spec(child, source)?),
            "import_spec_list" => {
                let mut list_cursor = child.walk();
                for spec in child.named_children(&mut list_cursor) {
                    if spec.kind() == "import_spec" {
                        imports.extend(parse_import_spec(spec, source)?);
                    }
                }
            }
            _ => {}
        }
    }
    Ok(imports)
}

fn parse_import_spec(node: TsNode, source: &str) -> Result<Option<ImportSpec>> {
    let Some(path_node) = node.child_by_field_name("path") else {
        return Ok(None);
    };
    let path = parse_string_literal(path_node, source)?;
    let alias = node
        .child_by_field_name("name")
        .and_then(|node| node.utf8_text(source.as_bytes()).ok())
        .map(|text| text.to_string());

    Ok(Some(ImportSpec { path, alias }))
}

fn parse_type_declaration(node: TsNode, source: &str) -> Result<Vec<TypeDecl>> {
    let mut decls = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "type_spec" => decls.push(parse_type_spec(child, source)?),
            "type_alias" => {
                let name = required_field(child, "name", "type alias missing name")?;
                decls.push(TypeDecl {
                    name: name.utf8_text(source.as_bytes())?.to_string(),
                    type_params: parse_type_parameters(child, source)?,
                    kind: TypeDeclKind::Alias,
                });
            }
            _ => {}
        }
    }
    Ok(decls)
}

fn parse_type_spec(node: TsNode, source: &str) -> Result<TypeDecl> {
    let name_node = required_field(node, "name", "type spec missing name")?;
    let name = name_node.utf8_text(source.as_bytes())?.to_string();
    let ty_node = required_field(node, "type", "type spec missing type")?;

    let kind = match ty_node.kind() {
        "interface_type" => TypeDeclKind::Interface(parse_interface(ty_node, source)?),
        _ => TypeDeclKind::Other,
    };

    Ok(TypeDecl {
        name,
        type_params: parse_type_parameters(node, source)?,
        kind,
    })
}

fn parse_type_parameters(node: TsNode, source: &str) -> Result<Vec<String>> {
    let Some(list) = node.child_by_field_name("type_parameters") else {
        return Ok(Vec::new());
    };
    let mut names = Vec::new();
    let mut cursor = list.walk();
    for decl in list.named_children(&mut cursor) {
        let mut name_cursor = decl.walk();
        for name in decl.children_by_field_name("name", &mut name_cursor) {
            names.push(name.utf8_text(source.as_bytes())?.to_string());
        }
    }
    Ok(names)
}

fn parse_interface(node: TsNode, source: &str) -> Result<InterfaceDecl> {
    let mut members = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "method_elem" | "method_spec" => {
                members.push(InterfaceMember::Method(parse_method(child, source)?));
            }
            "type_elem" | "constraint_elem" => {
                members.push(InterfaceMember::Embedded(parse_type_elem(child, source)?));
            }
            "type_identifier" | "qualified_type" | "interface_type_name" => {
                members.push(InterfaceMember::Embedded(parse_type_node(child, source)?));
            }
            "comment" => {}
            kind => {
                warn!("unsupported go interface member: {kind:?}");
            }
        }
    }
    Ok(InterfaceDecl { members })
}

/// An embedded interface, or a type-set element kept verbatim.
fn parse_type_elem(node: TsNode, source: &str) -> Result<TypeExpr> {
    let mut cursor = node.walk();
    let types: Vec<_> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .collect();
    match types.as_slice() {
        [single] if single.kind() != "negated_type" => parse_type_node(*single, source),
        _ => Ok(TypeExpr::raw(node.utf8_text(source.as_bytes())?)),
    }
}

fn parse_method(node: TsNode, source: &str) -> Result<MethodSpec> {
    let name = required_field(node, "name", "interface method missing name")?
        .utf8_text(source.as_bytes())?
        .to_string();

    let params = node
        .child_by_field_name("parameters")
        .map(|node| parse_parameter_list(node, source))
        .transpose()?
        .unwrap_or_default();

    let results = match node.child_by_field_name("result") {
        Some(result) if result.kind() == "parameter_list" => parse_parameter_list(result, source)?,
        Some(result) => vec![FieldGroup::unnamed(parse_type_node(result, source)?)],
        None => Vec::new(),
    };

    Ok(MethodSpec {
        name,
        params,
        results,
    })
}

fn parse_parameter_list(node: TsNode, source: &str) -> Result<Vec<FieldGroup>> {
    let mut groups = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        match child.kind() {
            "parameter_declaration" => {
                groups.push(parse_parameter_declaration(child, source, false)?)
            }
            "variadic_parameter_declaration" => {
                groups.push(parse_parameter_declaration(child, source, true)?)
            }
            _ => {}
        }
    }
    Ok(groups)
}

fn parse_parameter_declaration(node: TsNode, source: &str, variadic: bool) -> Result<FieldGroup> {
    let ty_node = node
        .child_by_field_name("type")
        .or_else(|| last_named_child(node))
        .ok_or_else(|| eyre!("parameter missing type"))?;
    let ty = parse_type_node(ty_node, source)?;

    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        if child.id() == ty_node.id() {
            continue;
        }
        if child.kind() == "identifier" {
            names.push(child.utf8_text(source.as_bytes())?.to_string());
        }
    }

    Ok(if variadic {
        FieldGroup::variadic(names, ty)
    } else {
        FieldGroup::new(names, ty)
    })
}

fn parse_type_node(node: TsNode, source: &str) -> Result<TypeExpr> {
    match node.kind() {
        "identifier" | "type_identifier" => {
            Ok(TypeExpr::named(node.utf8_text(source.as_bytes())?))
        }
        "qualified_type" => {
            let package = required_field(node, "package", "qualified type missing package")?;
            let name = required_field(node, "name", "qualified type missing name")?;
            Ok(TypeExpr::qualified(
                package.utf8_text(source.as_bytes())?,
                name.utf8_text(source.as_bytes())?,
            ))
        }
        "interface_type_name" | "parenthesized_type" => {
            let inner = last_named_child(node)
                .ok_or_else(|| eyre!("{} missing inner type", node.kind()))?;
            parse_type_node(inner, source)
        }
        "pointer_type" => {
            let inner = node
                .child_by_field_name("type")
                .or_else(|| last_named_child(node))
                .ok_or_else(|| eyre!("pointer type missing inner"))?;
            Ok(TypeExpr::pointer(parse_type_node(inner, source)?))
        }
        "slice_type" => {
            let inner = node
                .child_by_field_name("element")
                .or_else(|| last_named_child(node))
                .ok_or_else(|| eyre!("slice type missing element"))?;
            Ok(TypeExpr::slice(parse_type_node(inner, source)?))
        }
        "array_type" => {
            let elem = node
                .child_by_field_name("element")
                .or_else(|| last_named_child(node))
                .ok_or_else(|| eyre!("array type missing element"))?;
            let len = required_field(node, "length", "array type missing length")?;
            Ok(TypeExpr::array(
                len.utf8_text(source.as_bytes())?,
                parse_type_node(elem, source)?,
            ))
        }
        "map_type" => {
            let key = required_field(node, "key", "map type missing key")?;
            let value = required_field(node, "value", "map type missing value")?;
            Ok(TypeExpr::map(
                parse_type_node(key, source)?,
                parse_type_node(value, source)?,
            ))
        }
        "channel_type" => {
            let elem = node
                .child_by_field_name("value")
                .or_else(|| last_named_child(node))
                .ok_or_else(|| eyre!("channel type missing element"))?;
            Ok(TypeExpr::channel(
                channel_direction(node),
                parse_type_node(elem, source)?,
            ))
        }
        // function types, generic instantiations, inline struct and
        // interface types
        _ => Ok(TypeExpr::raw(node.utf8_text(source.as_bytes())?)),
    }
}

/// `<-chan T` starts with the arrow, `chan<- T` has it right after `chan`.
fn channel_direction(node: TsNode) -> ChanDir {
    let token = |idx: usize| node.child(idx).map(|child| child.kind());
    match (token(0), token(1)) {
        (Some("<-"), _) => ChanDir::Recv,
        (_, Some("<-")) => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

fn parse_string_literal(node: TsNode, source: &str) -> Result<String> {
    let raw = node.utf8_text(source.as_bytes())?;
    if raw.starts_with('`') && raw.ends_with('`') && raw.len() >= 2 {
        return Ok(raw[1..raw.len() - 1].to_string());
    }
    if raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2 {
        let inner = &raw[1..raw.len() - 1];
        return Ok(inner.replace("\\\"", "\""));
    }
    Ok(raw.to_string())
}

fn required_field<'t>(node: TsNode<'t>, field: &str, message: &str) -> Result<TsNode<'t>> {
    node.child_by_field_name(field)
        .ok_or_else(|| eyre!("{message}"))
}

fn last_named_child(node: TsNode) -> Option<TsNode> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).last()
}
