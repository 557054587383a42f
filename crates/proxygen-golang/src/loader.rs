//! Filesystem loader for Go packages.
//!
//! Import paths are mapped to directories the way the go tool would for a
//! module-mode build without network access: the main module (from the
//! nearest `go.mod`), then its `vendor/` tree, then the module cache entry of
//! the `require`d (or `replace`d) module, then extra GOPATH-style search
//! roots, then the standard library under GOROOT. Only files selected by the
//! build context are read.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use itertools::Itertools;
use proxygen_core::error::{Error, Result};
use proxygen_core::imports::guess_package_name;
use proxygen_core::module::{Dependency, ModuleDescriptor, ModuleLoader, SourceUnit};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::constraints::BuildContext;
use crate::env::GoEnv;
use crate::gomod::{escape_module_path, GoMod, ReplaceTarget, Requirement};
use crate::parser::GoParser;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoLoaderOptions {
    /// Directory the search for `go.mod` starts from.
    pub root: PathBuf,
    /// Roots searched as `<root>/<import path>` and `<root>/src/<import path>`.
    pub search_paths: Vec<PathBuf>,
    /// Resolve imports through the main module's `vendor/` directory.
    pub vendor: bool,
    /// Overrides the `GOROOT` environment variable.
    pub goroot: Option<PathBuf>,
    /// Overrides the `GOMODCACHE` environment variable.
    pub gomodcache: Option<PathBuf>,
    /// Platform and tags deciding which files belong to a package.
    pub build: BuildContext,
}

impl Default for GoLoaderOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            search_paths: Vec::new(),
            vendor: true,
            goroot: None,
            gomodcache: None,
            build: BuildContext::host(),
        }
    }
}

impl GoLoaderOptions {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// The module declared by a `go.mod` file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MainModule {
    pub path: String,
    pub dir: PathBuf,
    pub go_mod: GoMod,
}

#[derive(Debug)]
pub struct GoModuleLoader {
    options: GoLoaderOptions,
    main_module: Option<MainModule>,
    goroot: Option<PathBuf>,
    gomodcache: Option<PathBuf>,
    packages: RwLock<HashMap<String, Arc<ModuleDescriptor>>>,
    package_names: RwLock<HashMap<String, String>>,
}

impl GoModuleLoader {
    pub fn new(options: GoLoaderOptions) -> Result<Self> {
        let main_module = find_main_module(&options.root)?;
        match &main_module {
            Some(module) => debug!(module = %module.path, dir = %module.dir.display(), "found go.mod"),
            None => warn!(root = %options.root.display(), "no go.mod found, only search paths are used"),
        }
        let detected = if options.goroot.is_none() || options.gomodcache.is_none() {
            GoEnv::detect()
        } else {
            GoEnv::default()
        };
        let goroot = options.goroot.clone().or(detected.goroot);
        let gomodcache = options.gomodcache.clone().or(detected.gomodcache);
        if goroot.is_none() {
            warn!("GOROOT not found, standard library packages cannot be loaded");
        }
        Ok(Self {
            options,
            main_module,
            goroot,
            gomodcache,
            packages: RwLock::new(HashMap::new()),
            package_names: RwLock::new(HashMap::new()),
        })
    }

    pub fn main_module(&self) -> Option<&MainModule> {
        self.main_module.as_ref()
    }

    /// Directory holding the package `import_path`.
    pub fn package_dir(&self, import_path: &str) -> Option<PathBuf> {
        self.candidate_dirs(import_path)
            .into_iter()
            .find(|dir| dir.is_dir())
    }

    fn candidate_dirs(&self, import_path: &str) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(module) = &self.main_module {
            if import_path == module.path {
                candidates.push(module.dir.clone());
            } else if let Some(rest) = import_path
                .strip_prefix(module.path.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
            {
                candidates.push(module.dir.join(rest));
            }
            if self.options.vendor {
                candidates.push(module.dir.join("vendor").join(import_path));
            }
            candidates.extend(self.required_module_dir(module, import_path));
        }
        for root in &self.options.search_paths {
            candidates.push(root.join(import_path));
            candidates.push(root.join("src").join(import_path));
        }
        if let Some(goroot) = &self.goroot {
            candidates.push(goroot.join("src").join(import_path));
        }
        candidates
    }

    /// Directory of `import_path` inside the module that `go.mod` requires
    /// for it, honouring `replace` directives.
    fn required_module_dir(&self, module: &MainModule, import_path: &str) -> Option<PathBuf> {
        let requirement = module.go_mod.requirement_for(import_path)?;
        let base = match module.go_mod.replacement_for(requirement).map(|r| &r.target) {
            Some(ReplaceTarget::Dir(dir)) => module.dir.join(dir),
            Some(ReplaceTarget::Module(target)) => self.module_cache_dir(target)?,
            None => self.module_cache_dir(requirement)?,
        };
        let rest = import_path[requirement.path.len()..].trim_start_matches('/');
        Some(if rest.is_empty() { base } else { base.join(rest) })
    }

    fn module_cache_dir(&self, requirement: &Requirement) -> Option<PathBuf> {
        let cache = self.gomodcache.as_ref()?;
        Some(cache.join(format!(
            "{}@{}",
            escape_module_path(&requirement.path),
            escape_module_path(&requirement.version)
        )))
    }

    /// Sources of the files in `dir` that belong to the build.
    fn build_files(&self, dir: &Path) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();
        for file in go_files(dir)? {
            let name = file
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !self.options.build.matches_file_name(&name) {
                debug!(file = %file.display(), "excluded by file name suffix");
                continue;
            }
            let source = fs::read_to_string(&file)?;
            if !self.options.build.matches_source(&source) {
                debug!(file = %file.display(), "excluded by build constraint");
                continue;
            }
            files.push((file, source));
        }
        Ok(files)
    }

    fn parse_package(&self, import_path: &str, dir: &Path) -> Result<ModuleDescriptor> {
        let mut parser = GoParser::new()?;
        let mut parsed = Vec::new();
        for (file, source) in self.build_files(dir)? {
            let file_parsed = parser
                .parse_str(&source, &file)
                .map_err(|err| Error::load(import_path, err.to_string()))?;
            parsed.push((file, file_parsed));
        }

        let name = choose_package_name(
            import_path,
            parsed.iter().map(|(_, file)| file.package.as_str()),
        )
        .ok_or_else(|| Error::load(import_path, format!("no buildable Go files in {}", dir.display())))?;

        let mut units = Vec::new();
        for (file, parsed) in parsed {
            if parsed.package != name {
                warn!(
                    file = %file.display(),
                    package = %parsed.package,
                    expected = %name,
                    "skipping file of a different package"
                );
                continue;
            }
            units.push(parsed.unit);
        }

        let dependencies = self.dependencies(&units);
        debug!(
            package = import_path,
            files = units.len(),
            dependencies = dependencies.len(),
            "parsed package"
        );
        Ok(ModuleDescriptor::new(import_path, name, units, dependencies))
    }

    fn dependencies(&self, units: &[SourceUnit]) -> Vec<Dependency> {
        units
            .iter()
            .flat_map(|unit| unit.imports.iter())
            .map(|import| import.path.as_str())
            .sorted()
            .dedup()
            .map(|path| Dependency::new(path, self.package_name(path)))
            .collect()
    }

    /// Declared package name of `import_path`, read from its buildable files
    /// when the package can be found.
    fn package_name(&self, import_path: &str) -> String {
        if let Some(name) = self
            .package_names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(import_path)
        {
            return name.clone();
        }
        let name = self
            .package_dir(import_path)
            .and_then(|dir| self.read_package_clause(import_path, &dir))
            .unwrap_or_else(|| guess_package_name(import_path));
        self.package_names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(import_path.to_string(), name.clone());
        name
    }

    fn read_package_clause(&self, import_path: &str, dir: &Path) -> Option<String> {
        let files = self.build_files(dir).ok()?;
        let mut parser = GoParser::new().ok()?;
        let names: Vec<String> = files
            .iter()
            .filter_map(|(_, source)| parser.package_name(source).ok().flatten())
            .collect();
        choose_package_name(import_path, names.iter().map(String::as_str))
    }
}

impl ModuleLoader for GoModuleLoader {
    fn load(&self, path: &str) -> Result<Arc<ModuleDescriptor>> {
        if let Some(module) = self
            .packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Ok(module.clone());
        }
        let dir = self
            .package_dir(path)
            .ok_or_else(|| Error::ModuleNotFound(path.to_string()))?;
        let module = Arc::new(self.parse_package(path, &dir)?);
        self.package_names
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), module.name.clone());
        self.packages
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), module.clone());
        Ok(module)
    }
}

/// Nearest `go.mod` at or above `start`.
pub fn find_main_module(start: &Path) -> Result<Option<MainModule>> {
    let start = if start.as_os_str().is_empty() {
        Path::new(".")
    } else {
        start
    };
    let start = fs::canonicalize(start)?;
    for dir in start.ancestors() {
        let go_mod = dir.join("go.mod");
        if !go_mod.is_file() {
            continue;
        }
        let contents = fs::read_to_string(&go_mod)?;
        let parsed = GoMod::parse(&contents);
        let path = parsed.module.clone().ok_or_else(|| {
            Error::load(
                go_mod.display().to_string(),
                "go.mod has no module directive",
            )
        })?;
        return Ok(Some(MainModule {
            path,
            dir: dir.to_path_buf(),
            go_mod: parsed,
        }));
    }
    Ok(None)
}

/// Package name for a directory whose files declare `names`. The name the
/// import path suggests wins when some file declares it; otherwise the most
/// common one, the earliest file breaking ties.
fn choose_package_name<'a>(
    import_path: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for name in names {
        match counts.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, count)) => *count += 1,
            None => counts.push((name, 1)),
        }
    }
    let expected = guess_package_name(import_path);
    if counts.iter().any(|(name, _)| *name == expected) {
        return Some(expected);
    }
    counts
        .iter()
        .rev()
        .max_by_key(|(_, count)| *count)
        .map(|(name, _)| name.to_string())
}

/// Non-test `.go` files directly inside `dir`, in file name order.
fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| Error::load(dir.display().to_string(), err.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.ends_with(".go") && !name.ends_with("_test.go") {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
