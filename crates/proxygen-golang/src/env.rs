//! Locating the Go toolchain directories: GOROOT for the standard library and
//! GOMODCACHE for required modules.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoEnv {
    pub goroot: Option<PathBuf>,
    pub gomodcache: Option<PathBuf>,
}

impl GoEnv {
    /// Environment of this process, asking the `go` binary on `PATH` for
    /// whatever the variables leave unset.
    pub fn detect() -> Self {
        let go = find_executable("go", std::env::var_os("PATH").as_deref());
        let mut env = Self::resolve(|key| std::env::var_os(key), go.as_deref());
        if env.gomodcache.is_none() {
            env.gomodcache = dirs::home_dir().map(|home| home.join("go").join("pkg").join("mod"));
        }
        env
    }

    /// Resolution order for each directory: the variable itself, then
    /// `go env`, then (GOROOT only) the directory the `go` binary lives in.
    /// GOMODCACHE also falls back to the first `GOPATH` entry.
    pub fn resolve(env: impl Fn(&str) -> Option<OsString>, go: Option<&Path>) -> Self {
        let var = |key: &str| env(key).filter(|value| !value.is_empty()).map(PathBuf::from);

        let mut goroot = var("GOROOT");
        let mut gomodcache = var("GOMODCACHE").or_else(|| {
            env("GOPATH")
                .and_then(|paths| std::env::split_paths(&paths).find(|p| !p.as_os_str().is_empty()))
                .map(|gopath| gopath.join("pkg").join("mod"))
        });

        if let Some(go) = go {
            if goroot.is_none() || gomodcache.is_none() {
                if let Some((root, cache)) = go_env(go) {
                    goroot = goroot.or(root);
                    gomodcache = gomodcache.or(cache);
                }
            }
            if goroot.is_none() {
                goroot = goroot_of_binary(go);
            }
        }
        debug!(goroot = ?goroot, gomodcache = ?gomodcache, "go environment");
        Self { goroot, gomodcache }
    }
}

/// `go env GOROOT GOMODCACHE`, one value per line.
fn go_env(go: &Path) -> Option<(Option<PathBuf>, Option<PathBuf>)> {
    let output = Command::new(go)
        .args(["env", "GOROOT", "GOMODCACHE"])
        .output()
        .map_err(|err| debug!(go = %go.display(), error = %err, "go env failed to start"))
        .ok()?;
    if !output.status.success() {
        debug!(go = %go.display(), status = %output.status, "go env failed");
        return None;
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines().map(str::trim);
    let mut next = || {
        lines
            .next()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
    };
    let goroot = next();
    let gomodcache = next();
    Some((goroot, gomodcache))
}

/// `<goroot>/bin/go` → `<goroot>`, following symlinks such as
/// `/usr/local/bin/go`.
fn goroot_of_binary(go: &Path) -> Option<PathBuf> {
    let resolved = std::fs::canonicalize(go).ok()?;
    let root = resolved.parent()?.parent()?;
    root.join("src").is_dir().then(|| root.to_path_buf())
}

/// First `name` executable found on a `PATH`-style list.
pub fn find_executable(name: &str, path_var: Option<&std::ffi::OsStr>) -> Option<PathBuf> {
    let file_name = if cfg!(windows) {
        format!("{}.exe", name)
    } else {
        name.to_string()
    };
    std::env::split_paths(path_var?)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}
