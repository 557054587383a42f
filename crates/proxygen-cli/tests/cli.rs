use pretty_assertions::assert_eq;
use proxygen_cli::cli::{CliConfig, FormatterKind};
use proxygen_cli::commands::generate::{generate_command, GenerateArgs};
use proxygen_cli::commands::inspect::{inspect_json, InspectArgs};
use proxygen_cli::commands::runtime::{runtime_command, RuntimeArgs};
use proxygen_cli::CliError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const GREETER: &str = r#"package service

// Greeter says hello.
type Greeter interface {
	Greet(name string) (string, error)
}
"#;

const STORE: &str = r#"package store

import "example.com/app/model"

type Reader interface {
	Read(id string) (model.Record, error)
}
"#;

const MODEL: &str = r#"package model

type Record struct {
	ID string
}
"#;

const SERVICE: &str = r#"package service

import "example.com/app/store"

type Service interface {
	store.Reader
	Ping() error
	Log(format string, args ...string)
}
"#;

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn module() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "go.mod", "module example.com/app\n\ngo 1.21\n");
    write(dir.path(), "service/greeter.go", GREETER);
    write(dir.path(), "service/service.go", SERVICE);
    write(dir.path(), "store/reader.go", STORE);
    write(dir.path(), "model/record.go", MODEL);
    dir
}

fn generate_args(dir: &Path, interface: &str, name: &str, output: PathBuf) -> GenerateArgs {
    GenerateArgs {
        interface: interface.to_string(),
        package: "proxies".to_string(),
        name: name.to_string(),
        output,
        formatter: Some(FormatterKind::Builtin),
        dir: dir.to_path_buf(),
    }
}

#[test]
fn generate_writes_formatted_proxy() {
    let dir = module();
    let output = dir.path().join("proxies/greeter.go");
    let args = generate_args(dir.path(), "example.com/app/service.Greeter", "GreeterProxy", output.clone());

    generate_command(args, &CliConfig::default()).unwrap();

    let source = fs::read_to_string(&output).unwrap();
    assert!(source.starts_with("// Code generated by proxygen. DO NOT EDIT.\n\npackage proxies\n"));
    assert!(source.contains("serviceGreeter0 \"example.com/app/service\""));
    assert!(source.contains("var _ serviceGreeter0.Greeter = (*GreeterProxy)(nil)"));
    assert!(source.contains("func (proxy *GreeterProxy) Greet(arg0 string) (string, error) {"));
    assert!(source.ends_with("}\n"));
}

#[test]
fn generate_flattens_embedded_packages() {
    let dir = module();
    let output = dir.path().join("service_proxy.go");
    let args = generate_args(dir.path(), "example.com/app/service.Service", "ServiceProxy", output.clone());

    generate_command(args, &CliConfig::default()).unwrap();

    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("modelService0 \"example.com/app/model\""));
    assert!(source.contains("serviceService1 \"example.com/app/service\""));
    assert!(source.contains("storeService2 \"example.com/app/store\""));
    assert!(source.contains("var _ storeService2.Reader = (*ServiceProxy)(nil)"));
    assert!(source.contains("(modelService0.Record, error)"));
    assert!(source.contains("proxygenInterceptor.Cast[[]string](args[1])...,"));
}

#[test]
fn failed_generation_leaves_no_output() {
    let dir = module();
    let output = dir.path().join("missing.go");
    let args = generate_args(dir.path(), "example.com/app/service.Missing", "MissingProxy", output.clone());

    let err = generate_command(args, &CliConfig::default()).unwrap_err();

    assert!(matches!(err, CliError::Core(proxygen_core::Error::NotFound { .. })));
    assert!(!output.exists());
}

#[test]
fn malformed_interface_path_is_rejected() {
    let dir = module();
    let args = generate_args(dir.path(), "Greeter", "GreeterProxy", dir.path().join("out.go"));
    let err = generate_command(args, &CliConfig::default()).unwrap_err();
    assert!(matches!(err, CliError::Core(proxygen_core::Error::InvalidInput(_))));
}

#[test]
fn configured_receiver_is_used() {
    let dir = module();
    let output = dir.path().join("greeter.go");
    let mut config = CliConfig::default();
    config.generator.receiver = "p".to_string();
    config.generator.constructor = false;

    generate_command(
        generate_args(dir.path(), "example.com/app/service.Greeter", "GreeterProxy", output.clone()),
        &config,
    )
    .unwrap();

    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("func (p *GreeterProxy) Greet("));
    assert!(!source.contains("func NewGreeterProxy"));
}

#[test]
fn inspect_reports_flattened_methods() {
    let dir = module();
    let args = InspectArgs {
        interface: "example.com/app/service.Service".to_string(),
        package: "proxies".to_string(),
        dir: dir.path().to_path_buf(),
    };

    let json: serde_json::Value =
        serde_json::from_str(&inspect_json(&args, &CliConfig::default()).unwrap()).unwrap();

    let names: Vec<&str> = json["methods"]
        .as_array()
        .unwrap()
        .iter()
        .map(|method| method["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ping", "Log", "Read"]);
    assert_eq!(json["implementation_type"], "serviceService1.Service");
}

#[test]
fn runtime_package_is_written() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("interceptor/interceptor.go");
    let args = RuntimeArgs {
        package: "interceptor".to_string(),
        output: output.clone(),
        formatter: Some(FormatterKind::Builtin),
    };

    runtime_command(args, &CliConfig::default()).unwrap();

    let source = fs::read_to_string(&output).unwrap();
    assert!(source.contains("package interceptor\n"));
    assert!(source.contains("func Cast["));
}

fn proxygen(dir: &Path) -> Command {
    let config = dir.join("proxygen-test.toml");
    if !config.exists() {
        fs::write(&config, "[format]\nformatter = \"builtin\"\n").unwrap();
    }
    let mut command = Command::new(env!("CARGO_BIN_EXE_proxygen"));
    command.arg("-C").arg(dir).arg("--config").arg(config);
    command
}

#[test]
fn binary_reports_success() {
    let dir = module();
    let output = proxygen(dir.path())
        .args([
            "generate",
            "--interface",
            "example.com/app/service.Greeter",
            "--package",
            "proxies",
            "--name",
            "GreeterProxy",
            "--output",
            "proxies/greeter.go",
        ])
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("proxy generated successfully"));
    assert!(dir.path().join("proxies/greeter.go").is_file());
}

#[test]
fn binary_exits_with_failure() {
    let dir = module();
    let output = proxygen(dir.path())
        .args([
            "generate",
            "--interface",
            "example.com/app/nowhere.Greeter",
            "--package",
            "proxies",
            "--name",
            "GreeterProxy",
            "--output",
            "greeter.go",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("example.com/app/nowhere"));
    assert!(!dir.path().join("greeter.go").exists());
}
