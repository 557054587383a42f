//! The parts of `go.mod` the loader needs: the module path, `require` and
//! `replace` directives.

/// `path version` pair of a `require` line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Requirement {
    pub path: String,
    pub version: String,
}

/// Where a `replace` directive sends a module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// A directory, relative to the `go.mod` unless absolute.
    Dir(String),
    Module(Requirement),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Replacement {
    pub path: String,
    /// Only this version is replaced when set.
    pub version: Option<String>,
    pub target: ReplaceTarget,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GoMod {
    pub module: Option<String>,
    pub requires: Vec<Requirement>,
    pub replaces: Vec<Replacement>,
}

impl GoMod {
    pub fn parse(contents: &str) -> Self {
        let mut go_mod = GoMod::default();
        let mut block: Option<String> = None;

        for line in contents.lines() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }
            if let Some(verb) = &block {
                if line == ")" {
                    block = None;
                } else {
                    go_mod.directive(verb, line);
                }
                continue;
            }
            let (verb, rest) = match line.split_once(char::is_whitespace) {
                Some((verb, rest)) => (verb, rest.trim()),
                None => (line, ""),
            };
            if rest == "(" {
                block = Some(verb.to_string());
            } else {
                go_mod.directive(verb, rest);
            }
        }
        go_mod
    }

    fn directive(&mut self, verb: &str, args: &str) {
        match verb {
            "module" if self.module.is_none() => {
                let path = unquote(args);
                if !path.is_empty() {
                    self.module = Some(path.to_string());
                }
            }
            "require" => {
                let mut fields = args.split_whitespace().map(unquote);
                if let (Some(path), Some(version)) = (fields.next(), fields.next()) {
                    self.requires.push(Requirement {
                        path: path.to_string(),
                        version: version.to_string(),
                    });
                }
            }
            "replace" => {
                if let Some(replacement) = parse_replace(args) {
                    self.replaces.push(replacement);
                }
            }
            _ => {}
        }
    }

    /// The requirement providing `import_path`: the longest module path that
    /// is the import path or one of its prefixes.
    pub fn requirement_for(&self, import_path: &str) -> Option<&Requirement> {
        self.requires
            .iter()
            .filter(|req| is_path_prefix(&req.path, import_path))
            .max_by_key(|req| req.path.len())
    }

    pub fn replacement_for(&self, requirement: &Requirement) -> Option<&Replacement> {
        let exact = self.replaces.iter().find(|replace| {
            replace.path == requirement.path
                && replace.version.as_deref() == Some(requirement.version.as_str())
        });
        exact.or_else(|| {
            self.replaces
                .iter()
                .find(|replace| replace.path == requirement.path && replace.version.is_none())
        })
    }
}

/// The path of the `module` directive of a `go.mod` file.
pub fn parse_module_directive(contents: &str) -> Option<String> {
    GoMod::parse(contents).module
}

/// `module` is `path` or a parent of it in the import path hierarchy.
pub fn is_path_prefix(module: &str, path: &str) -> bool {
    path == module
        || path
            .strip_prefix(module)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Module cache directory name of a module path or version: upper case
/// letters are written as `!` followed by the lower case letter.
pub fn escape_module_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        if ch.is_ascii_uppercase() {
            escaped.push('!');
            escaped.push(ch.to_ascii_lowercase());
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

fn parse_replace(args: &str) -> Option<Replacement> {
    let (from, to) = args.split_once("=>")?;
    let mut from = from.split_whitespace().map(unquote);
    let path = from.next()?.to_string();
    let version = from.next().map(str::to_string);

    let mut to = to.split_whitespace().map(unquote);
    let target_path = to.next()?;
    let target = match to.next() {
        Some(version) => ReplaceTarget::Module(Requirement {
            path: target_path.to_string(),
            version: version.to_string(),
        }),
        None => ReplaceTarget::Dir(target_path.to_string()),
    };
    Some(Replacement {
        path,
        version,
        target,
    })
}

fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or_default()
}

fn unquote(field: &str) -> &str {
    field.trim().trim_matches('"').trim_matches('`')
}
