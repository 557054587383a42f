use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::builder::InterfaceBuilder;
use crate::error::Error;
use crate::format::{PassthroughFormatter, SourceFormatter};
use crate::generator::{GenerateRequest, Generator, InterfacePath};
use crate::imports::{guess_package_name, import_alias, ExistingImport, ImportTable, Usage};
use crate::module::{
    Dependency, FieldGroup, ImportSpec, InterfaceDecl, InterfaceMember, MethodSpec,
    ModuleDescriptor, ModuleLoader, SourceUnit, StaticModuleLoader, TypeDecl, TypeDeclKind,
};
use crate::render::RenderOptions;
use crate::resolve::TypeResolver;
use crate::ty::{ChanDir, TypeExpr};

fn method(name: &str, params: Vec<FieldGroup>, results: Vec<FieldGroup>) -> InterfaceMember {
    InterfaceMember::Method(MethodSpec {
        name: name.to_string(),
        params,
        results,
    })
}

fn param(name: &str, ty: TypeExpr) -> FieldGroup {
    FieldGroup::new(vec![name.to_string()], ty)
}

fn ret(ty: TypeExpr) -> FieldGroup {
    FieldGroup::unnamed(ty)
}

fn interface(name: &str, members: Vec<InterfaceMember>) -> TypeDecl {
    TypeDecl {
        name: name.to_string(),
        type_params: Vec::new(),
        kind: TypeDeclKind::Interface(InterfaceDecl { members }),
    }
}

fn other(name: &str) -> TypeDecl {
    TypeDecl {
        name: name.to_string(),
        type_params: Vec::new(),
        kind: TypeDeclKind::Other,
    }
}

fn unit(file: &str, imports: Vec<ImportSpec>, types: Vec<TypeDecl>) -> SourceUnit {
    SourceUnit {
        path: file.into(),
        imports,
        types,
    }
}

fn package(path: &str, name: &str, units: Vec<SourceUnit>, deps: Vec<Dependency>) -> ModuleDescriptor {
    ModuleDescriptor::new(path, name, units, deps)
}

fn greeter_package() -> ModuleDescriptor {
    package(
        "example.com/greet",
        "greet",
        vec![unit(
            "greeter.go",
            Vec::new(),
            vec![interface(
                "Greeter",
                vec![method(
                    "Greet",
                    vec![param("name", TypeExpr::named("string"))],
                    vec![ret(TypeExpr::named("string")), ret(TypeExpr::named("error"))],
                )],
            )],
        )],
        Vec::new(),
    )
}

/// `app.Service` embeds `store.Reader`, whose method returns `model.Record`.
fn layered_loader(extra_store_imports: Vec<ImportSpec>) -> StaticModuleLoader {
    let app = package(
        "example.com/app",
        "app",
        vec![unit(
            "service.go",
            vec![ImportSpec::new("example.com/store")],
            vec![interface(
                "Service",
                vec![
                    InterfaceMember::Embedded(TypeExpr::qualified("store", "Reader")),
                    method("Ping", Vec::new(), vec![ret(TypeExpr::named("error"))]),
                ],
            )],
        )],
        vec![Dependency::new("example.com/store", "store")],
    );

    let mut store_imports = vec![ImportSpec::new("example.com/model")];
    store_imports.extend(extra_store_imports);
    let store = package(
        "example.com/store",
        "store",
        vec![unit(
            "reader.go",
            store_imports,
            vec![interface(
                "Reader",
                vec![method(
                    "Read",
                    vec![param("id", TypeExpr::named("string"))],
                    vec![
                        ret(TypeExpr::qualified("model", "Record")),
                        ret(TypeExpr::named("error")),
                    ],
                )],
            )],
        )],
        vec![Dependency::new("example.com/model", "model")],
    );

    let model = package(
        "example.com/model",
        "model",
        vec![unit("record.go", Vec::new(), vec![other("Record")])],
        Vec::new(),
    );

    StaticModuleLoader::new()
        .with_module(app)
        .with_module(store)
        .with_module(model)
}

fn generator(loader: StaticModuleLoader) -> Generator {
    Generator::new(
        Arc::new(loader),
        Arc::new(PassthroughFormatter),
        RenderOptions::default(),
    )
}

fn request(interface: &str, package: &str, type_name: &str) -> GenerateRequest {
    GenerateRequest {
        interface: interface.parse().expect("valid interface path"),
        package: package.to_string(),
        type_name: type_name.to_string(),
    }
}

#[test]
fn resolver_rewrites_type_expressions() {
    let home_types: BTreeSet<String> = ["Config".to_string()].into_iter().collect();
    let existing = vec![
        ExistingImport::new("context", "context", None),
        ExistingImport::new("example.com/lib/v2", "lib", Some("mylib".to_string())),
        ExistingImport::new("example.com/side", "side", Some("_".to_string())),
    ];
    let mut imports = ImportTable::provisional(
        "Store",
        [
            ("example.com/home", "home"),
            ("context", "context"),
            ("example.com/lib/v2", "lib"),
        ],
    );
    let resolver = TypeResolver::new("example.com/home", &home_types, &existing, Usage::Root);

    let cases = [
        (TypeExpr::named("int64"), "int64"),
        (TypeExpr::named("Config"), "homeStore1.Config"),
        (TypeExpr::pointer(TypeExpr::named("Config")), "*homeStore1.Config"),
        (TypeExpr::qualified("context", "Context"), "contextStore0.Context"),
        (
            TypeExpr::slice(TypeExpr::qualified("mylib", "Item")),
            "[]libStore2.Item",
        ),
        (
            TypeExpr::array("4", TypeExpr::named("byte")),
            "[4]byte",
        ),
        (
            TypeExpr::map(TypeExpr::named("string"), TypeExpr::pointer(TypeExpr::named("Config"))),
            "map[string]*homeStore1.Config",
        ),
        (
            TypeExpr::channel(ChanDir::Recv, TypeExpr::named("int")),
            "<-chan int",
        ),
        (
            TypeExpr::channel(ChanDir::Send, TypeExpr::named("int")),
            "chan<- int",
        ),
        (
            TypeExpr::channel(
                ChanDir::Both,
                TypeExpr::channel(ChanDir::Recv, TypeExpr::named("int")),
            ),
            "chan (<-chan int)",
        ),
        (
            TypeExpr::raw("func(ctx context.Context) error"),
            "func(ctx context.Context) error",
        ),
        (TypeExpr::qualified("nowhere", "Thing"), "nowhere.Thing"),
        // a blank import is not a selector
        (TypeExpr::qualified("_", "Thing"), "_.Thing"),
    ];

    for (expr, expected) in cases {
        assert_eq!(resolver.resolve(&expr, &mut imports), expected, "{:?}", expr);
    }

    let used: Vec<_> = imports
        .entries()
        .iter()
        .filter(|entry| entry.used_by_root)
        .map(|entry| entry.path.as_str())
        .collect();
    assert_eq!(used, vec!["context", "example.com/home", "example.com/lib/v2"]);
}

#[test]
fn resolver_is_referentially_transparent() {
    let home_types = BTreeSet::new();
    let existing = vec![ExistingImport::new("time", "time", None)];
    let mut imports = ImportTable::provisional("Clock", [("time", "time")]);
    let resolver = TypeResolver::new("example.com/clock", &home_types, &existing, Usage::Root);
    let expr = TypeExpr::map(
        TypeExpr::named("string"),
        TypeExpr::slice(TypeExpr::qualified("time", "Duration")),
    );

    let first = resolver.resolve(&expr, &mut imports);
    let second = resolver.resolve(&expr, &mut imports);
    assert_eq!(first, second);
    assert_eq!(first, "map[string][]timeClock0.Duration");
}

#[test]
fn resolver_adds_missing_import_entries() {
    let home_types = BTreeSet::new();
    let existing = vec![ExistingImport::new("net/http", "http", None)];
    let mut imports = ImportTable::new("Handler");
    let resolver =
        TypeResolver::new("example.com/web", &home_types, &existing, Usage::EmbeddedInterface);

    let rendered = resolver.resolve(&TypeExpr::qualified("http", "Request"), &mut imports);
    assert_eq!(rendered, "httpHandler0.Request");
    let entry = imports.get("net/http").expect("entry inserted");
    assert!(entry.used_as_embedding_interface);
    assert!(!entry.used_by_root);
}

#[test]
fn import_table_sorts_and_deduplicates() {
    let mut table = ImportTable::provisional(
        "Repo",
        [
            ("github.com/zeta/z", "z"),
            ("context", "context"),
            ("github.com/alpha/a", "a"),
            ("context", "context"),
        ],
    );
    let paths: Vec<_> = table.entries().iter().map(|entry| entry.path.as_str()).collect();
    assert_eq!(paths, vec!["context", "github.com/alpha/a", "github.com/zeta/z"]);
    assert_eq!(table.alias_of("github.com/zeta/z"), Some("zRepo2"));

    assert!(!table.insert("context", "context"));
    assert!(table.mark_used("github.com/zeta/z", Usage::Root));
    assert!(!table.mark_used("github.com/missing", Usage::Root));

    let mut other = ImportTable::provisional("Repo", [("github.com/zeta/z", "z")]);
    other.mark_used("github.com/zeta/z", Usage::EmbeddingOwner);
    table.merge(other);
    assert_eq!(table.len(), 3);
    let entry = table.get("github.com/zeta/z").expect("entry present");
    assert!(entry.used_by_root && entry.used_as_embedding_owner);

    let table = table.finalize();
    assert_eq!(table.len(), 1);
    assert_eq!(table.alias_of("github.com/zeta/z"), Some("zRepo0"));
}

#[test]
fn alias_helpers() {
    assert_eq!(import_alias("store", "Service", 3), "storeService3");
    assert_eq!(import_alias("", "Service", 0), "pkgService0");
    assert_eq!(import_alias("3d", "Mesh", 1), "pkg3dMesh1");

    assert_eq!(guess_package_name("context"), "context");
    assert_eq!(guess_package_name("github.com/go-redis/redis/v9"), "redis");
    assert_eq!(guess_package_name("gopkg.in/yaml.v3"), "yaml");
    assert_eq!(guess_package_name("github.com/mattn/go-sqlite3"), "sqlite3");
    assert_eq!(guess_package_name("example.com/my-lib"), "mylib");
}

#[test]
fn interface_path_parsing() {
    let path: InterfacePath = "github.com/acme/svc.Greeter".parse().expect("valid path");
    assert_eq!(path, InterfacePath::new("github.com/acme/svc", "Greeter"));
    assert_eq!(path.to_string(), "github.com/acme/svc.Greeter");

    for invalid in ["Greeter", ".Greeter", "github.com/acme/svc.", "a/.X", "pkg.1Bad"] {
        let err = invalid.parse::<InterfacePath>().expect_err(invalid);
        assert!(matches!(err, Error::InvalidInput(_)), "{}: {:?}", invalid, err);
    }
}

#[test]
fn greeter_descriptor() {
    let loader = Arc::new(StaticModuleLoader::new().with_module(greeter_package()));
    let mut builder = InterfaceBuilder::new(loader);
    let descriptor = builder
        .build("example.com/greet", "Greeter", "proxies")
        .expect("descriptor")
        .finalize();

    let summary = descriptor.summary();
    assert_eq!(summary.implementation_type, "greetGreeter0.Greeter");
    assert_eq!(summary.imports.len(), 1);
    assert_eq!(summary.methods.len(), 1);
    assert_eq!(summary.methods[0].name, "Greet");
    assert_eq!(summary.methods[0].params, vec!["string"]);
    assert_eq!(summary.methods[0].results, vec!["string", "error"]);
    assert!(summary.embedded.is_empty());
}

#[test]
fn greeter_proxy_source() {
    let source = generator(StaticModuleLoader::new().with_module(greeter_package()))
        .generate(&request("example.com/greet.Greeter", "proxies", "GreeterProxy"))
        .expect("generate");

    let expected = r#"// Code generated by proxygen. DO NOT EDIT.

package proxies

import (
	proxygenInterceptor "github.com/panagiotisptr/proxygen/interceptor"

	greetGreeter0 "example.com/greet"
)

var _ greetGreeter0.Greeter = (*GreeterProxy)(nil)

type GreeterProxy struct {
	Implementation greetGreeter0.Greeter
	Interceptors   proxygenInterceptor.InterceptorChain
}

// NewGreeterProxy wraps impl so that every call runs through interceptors.
func NewGreeterProxy(impl greetGreeter0.Greeter, interceptors ...proxygenInterceptor.Interceptor) *GreeterProxy {
	return &GreeterProxy{
		Implementation: impl,
		Interceptors:   interceptors,
	}
}

func (proxy *GreeterProxy) Greet(arg0 string) (string, error) {
	rets := proxy.Interceptors.Apply(
		[]interface{}{arg0},
		"Greet",
		func(args []interface{}) []interface{} {
			res0, res1 := proxy.Implementation.Greet(
				proxygenInterceptor.Cast[string](args[0]),
			)
			return []interface{}{res0, res1}
		},
	)
	return proxygenInterceptor.Cast[string](rets[0]), proxygenInterceptor.Cast[error](rets[1])
}
"#;
    assert_eq!(source, expected);
}

#[test]
fn generation_is_deterministic() {
    let generator = generator(layered_loader(Vec::new()));
    let request = request("example.com/app.Service", "proxies", "ServiceProxy");
    let first = generator.generate(&request).expect("first run");
    let second = generator.generate(&request).expect("second run");
    assert_eq!(first, second);
}

#[test]
fn embedding_across_three_packages() {
    let loader = Arc::new(layered_loader(Vec::new()));
    let descriptor = InterfaceBuilder::new(loader)
        .build("example.com/app", "Service", "proxies")
        .expect("descriptor")
        .finalize();
    let summary = descriptor.summary();

    let imports: Vec<_> = summary
        .imports
        .iter()
        .map(|import| (import.path.as_str(), import.alias.as_str()))
        .collect();
    assert_eq!(
        imports,
        vec![
            ("example.com/app", "appService0"),
            ("example.com/model", "modelService1"),
            ("example.com/store", "storeService2"),
        ]
    );

    let names: Vec<_> = summary.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Ping", "Read"]);
    let read = descriptor.method("Read").expect("Read flattened");
    assert_eq!(descriptor.render_type(&read.results[0]), "modelService1.Record");
    assert_eq!(summary.embedded, vec!["storeService2.Reader"]);

    let store = descriptor.imports.get("example.com/store").expect("store import");
    assert!(store.used_as_embedding_owner);
    assert!(!store.used_by_root);
    let model = descriptor.imports.get("example.com/model").expect("model import");
    assert!(model.used_as_embedding_interface);
}

#[test]
fn unused_imports_do_not_shift_aliases() {
    let build = |extra: Vec<ImportSpec>| {
        InterfaceBuilder::new(Arc::new(layered_loader(extra)))
            .build("example.com/app", "Service", "proxies")
            .expect("descriptor")
            .finalize()
            .summary()
    };

    let plain = build(Vec::new());
    let with_unused = build(vec![
        ImportSpec::new("example.com/aardvark"),
        ImportSpec::new("example.com/zebra"),
    ]);
    assert_eq!(plain, with_unused);
}

#[test]
fn diamond_and_cycle_are_flattened_once() {
    let module = package(
        "example.com/shapes",
        "shapes",
        vec![unit(
            "shapes.go",
            Vec::new(),
            vec![
                interface(
                    "Top",
                    vec![
                        InterfaceMember::Embedded(TypeExpr::named("Left")),
                        InterfaceMember::Embedded(TypeExpr::named("Right")),
                        method("Top", Vec::new(), Vec::new()),
                    ],
                ),
                interface(
                    "Left",
                    vec![
                        InterfaceMember::Embedded(TypeExpr::named("base")),
                        method("Left", Vec::new(), Vec::new()),
                    ],
                ),
                interface(
                    "Right",
                    vec![
                        InterfaceMember::Embedded(TypeExpr::named("base")),
                        method("Right", Vec::new(), Vec::new()),
                        // overlaps with Left's method set
                        method("Left", Vec::new(), Vec::new()),
                    ],
                ),
                interface(
                    "base",
                    vec![
                        InterfaceMember::Embedded(TypeExpr::named("Top")),
                        InterfaceMember::Embedded(TypeExpr::named("error")),
                        method("Base", Vec::new(), vec![ret(TypeExpr::named("int"))]),
                    ],
                ),
            ],
        )],
        Vec::new(),
    );

    let descriptor = InterfaceBuilder::new(Arc::new(StaticModuleLoader::new().with_module(module)))
        .build("example.com/shapes", "Top", "proxies")
        .expect("descriptor")
        .finalize();

    let names: Vec<_> = descriptor.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Top", "Left", "Base", "Error", "Right"]);

    // `base` is unexported: flattened, but no conformance assertion
    let embedded: Vec<_> = descriptor.embedded.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(embedded, vec!["Left", "Right"]);
}

#[test]
fn predeclared_embed_keeps_its_position() {
    let module = package(
        "example.com/res",
        "res",
        vec![unit(
            "res.go",
            Vec::new(),
            vec![
                interface(
                    "Resource",
                    vec![
                        InterfaceMember::Embedded(TypeExpr::named("Closer")),
                        InterfaceMember::Embedded(TypeExpr::named("error")),
                        method("Name", Vec::new(), vec![ret(TypeExpr::named("string"))]),
                    ],
                ),
                interface(
                    "Closer",
                    vec![method("Close", Vec::new(), vec![ret(TypeExpr::named("error"))])],
                ),
            ],
        )],
        Vec::new(),
    );

    let descriptor = InterfaceBuilder::new(Arc::new(StaticModuleLoader::new().with_module(module)))
        .build("example.com/res", "Resource", "proxies")
        .expect("descriptor")
        .finalize();

    let names: Vec<_> = descriptor.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Name", "Close", "Error"]);
}

#[test]
fn named_groups_expand_per_name() {
    let module = package(
        "example.com/geo",
        "geo",
        vec![unit(
            "geo.go",
            Vec::new(),
            vec![interface(
                "Plane",
                vec![method(
                    "Move",
                    vec![
                        FieldGroup::new(
                            vec!["x".to_string(), "y".to_string()],
                            TypeExpr::named("float64"),
                        ),
                        FieldGroup::variadic(vec!["tags".to_string()], TypeExpr::named("string")),
                    ],
                    vec![FieldGroup::new(
                        vec!["dx".to_string(), "dy".to_string()],
                        TypeExpr::named("float64"),
                    )],
                )],
            )],
        )],
        Vec::new(),
    );

    let descriptor = InterfaceBuilder::new(Arc::new(StaticModuleLoader::new().with_module(module)))
        .build("example.com/geo", "Plane", "proxies")
        .expect("descriptor")
        .finalize();
    let summary = descriptor.summary();
    assert_eq!(summary.methods[0].params, vec!["float64", "float64", "...string"]);
    assert_eq!(summary.methods[0].results, vec!["float64", "float64"]);
}

#[test]
fn variadic_parameter_is_packed_once() {
    let module = package(
        "example.com/logging",
        "logging",
        vec![unit(
            "logger.go",
            Vec::new(),
            vec![interface(
                "Logger",
                vec![method(
                    "Log",
                    vec![FieldGroup::variadic(
                        vec!["tags".to_string()],
                        TypeExpr::named("string"),
                    )],
                    Vec::new(),
                )],
            )],
        )],
        Vec::new(),
    );

    let source = generator(StaticModuleLoader::new().with_module(module))
        .generate(&request("example.com/logging.Logger", "proxies", "LoggerProxy"))
        .expect("generate");

    assert!(source.contains("func (proxy *LoggerProxy) Log(arg0 ...string) {\n"));
    assert!(source.contains("\t\t[]interface{}{arg0},\n"));
    assert!(source.contains("proxygenInterceptor.Cast[[]string](args[0])...,\n"));
    // no results: nothing to bind or unpack
    assert!(!source.contains("rets :="));
    assert!(source.contains("\t\t\treturn []interface{}{}\n"));
}

#[test]
fn embedded_interfaces_get_assertions() {
    let source = generator(layered_loader(Vec::new()))
        .generate(&request("example.com/app.Service", "proxies", "ServiceProxy"))
        .expect("generate");

    assert!(source.contains("var _ appService0.Service = (*ServiceProxy)(nil)\n"));
    assert!(source.contains("var _ storeService2.Reader = (*ServiceProxy)(nil)\n"));
    assert!(source.contains("func (proxy *ServiceProxy) Read(arg0 string) (modelService1.Record, error) {"));
    assert!(source.contains("\tstoreService2 \"example.com/store\"\n"));
}

#[test]
fn lookup_failures() {
    let mut module = greeter_package();
    module.units.push(unit(
        "more.go",
        Vec::new(),
        vec![
            other("Config"),
            interface("hidden", Vec::new()),
            interface("Twice", Vec::new()),
            interface("Twice", Vec::new()),
            TypeDecl {
                name: "Box".to_string(),
                type_params: vec!["T".to_string()],
                kind: TypeDeclKind::Interface(InterfaceDecl::default()),
            },
        ],
    ));
    let module = ModuleDescriptor::new(module.path, module.name, module.units, module.dependencies);
    let loader: Arc<dyn ModuleLoader> = Arc::new(StaticModuleLoader::new().with_module(module));
    let build = |name: &str| {
        InterfaceBuilder::new(loader.clone())
            .build("example.com/greet", name, "proxies")
            .expect_err(name)
    };

    assert!(matches!(build("Missing"), Error::NotFound { .. }));
    assert!(matches!(build("hidden"), Error::NotFound { .. }));
    assert!(matches!(build("Config"), Error::AmbiguousDeclaration { .. }));
    assert!(matches!(build("Twice"), Error::AmbiguousDeclaration { .. }));
    assert!(matches!(build("Box"), Error::Unsupported(_)));

    let err = InterfaceBuilder::new(loader.clone())
        .build("example.com/absent", "Greeter", "proxies")
        .expect_err("unknown package");
    assert!(matches!(err, Error::ModuleNotFound(path) if path == "example.com/absent"));
}

#[test]
fn invalid_target_identifiers_are_rejected() {
    let generator = generator(StaticModuleLoader::new().with_module(greeter_package()));
    for (package, type_name) in [("my-proxies", "GreeterProxy"), ("proxies", "type")] {
        let err = generator
            .generate(&request("example.com/greet.Greeter", package, type_name))
            .expect_err("invalid identifier");
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}

#[test]
fn methods_named_like_proxy_fields_are_rejected() {
    let module = package(
        "example.com/pipe",
        "pipe",
        vec![unit(
            "pipe.go",
            Vec::new(),
            vec![interface(
                "Pipeline",
                vec![
                    method("Run", Vec::new(), Vec::new()),
                    method("Interceptors", Vec::new(), vec![ret(TypeExpr::named("int"))]),
                ],
            )],
        )],
        Vec::new(),
    );

    let err = generator(StaticModuleLoader::new().with_module(module))
        .generate(&request("example.com/pipe.Pipeline", "proxies", "PipelineProxy"))
        .expect_err("field collision");
    assert!(matches!(err, Error::InvalidInput(message) if message.contains("Interceptors")));
}

struct RejectingFormatter;

impl SourceFormatter for RejectingFormatter {
    fn format(&self, source: &str) -> crate::Result<String> {
        Err(Error::format("unexpected token", source.lines().next().unwrap_or_default()))
    }
}

#[test]
fn output_file_is_all_or_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("gen").join("greeter_proxy.go");
    let request = request("example.com/greet.Greeter", "proxies", "GreeterProxy");

    let failing = Generator::new(
        Arc::new(StaticModuleLoader::new().with_module(greeter_package())),
        Arc::new(RejectingFormatter),
        RenderOptions::default(),
    );
    let err = failing
        .generate_to_file(&request, &output)
        .expect_err("formatter rejects");
    assert!(matches!(err, Error::Format { .. }));
    assert!(!output.exists());

    let missing = generator(StaticModuleLoader::new())
        .generate_to_file(&request, &output)
        .expect_err("package missing");
    assert!(matches!(missing, Error::ModuleNotFound(_)));
    assert!(!output.exists());

    let generator = generator(StaticModuleLoader::new().with_module(greeter_package()));
    std::fs::create_dir_all(output.parent().expect("parent")).expect("mkdir");
    std::fs::write(&output, "stale contents").expect("seed output");
    generator.generate_to_file(&request, &output).expect("write");
    let written = std::fs::read_to_string(&output).expect("read back");
    assert_eq!(written, generator.generate(&request).expect("generate"));
}

#[test]
fn runtime_package_source() {
    let dir = tempfile::tempdir().expect("tempdir");
    let output = dir.path().join("interceptor.go");
    generator(StaticModuleLoader::new())
        .write_runtime("interceptor", &output)
        .expect("runtime");

    let source = std::fs::read_to_string(&output).expect("read back");
    assert!(source.starts_with("// Code generated by proxygen. DO NOT EDIT.\n\npackage interceptor\n"));
    assert!(source.contains("type InterceptorChain []Interceptor"));
    assert!(source.contains("func Cast[T any](val interface{}) T {"));
}

#[test]
fn render_options_deserialize_with_defaults() {
    let options: RenderOptions =
        serde_json::from_str(r#"{"receiver": "p", "constructor": false}"#).expect("options");
    assert_eq!(options.receiver, "p");
    assert!(!options.constructor);
    assert_eq!(options.interceptor_alias, RenderOptions::default().interceptor_alias);
}
