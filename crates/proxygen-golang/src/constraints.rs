//! Build constraints: which files of a package directory belong to a build.
//!
//! Mirrors the go tool's rules for `_GOOS`/`_GOARCH` file name suffixes and
//! for `//go:build` lines (falling back to `// +build` when a file has no
//! `//go:build` line).

use std::collections::BTreeSet;

const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

/// Target platform and extra tags files are matched against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: String,
    pub goarch: String,
    /// Tags given with `-tags`; `cgo` counts as enabled only when listed here.
    pub tags: BTreeSet<String>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::host()
    }
}

impl BuildContext {
    pub fn new(goos: impl Into<String>, goarch: impl Into<String>) -> Self {
        Self {
            goos: goos.into(),
            goarch: goarch.into(),
            tags: BTreeSet::new(),
        }
    }

    /// The platform this process runs on, in Go's naming.
    pub fn host() -> Self {
        let goos = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        let goarch = match std::env::consts::ARCH {
            "x86_64" => "amd64",
            "x86" => "386",
            "aarch64" => "arm64",
            "powerpc64" if cfg!(target_endian = "little") => "ppc64le",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            "wasm32" => "wasm",
            other => other,
        };
        Self::new(goos, goarch)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    fn has_tag(&self, tag: &str) -> bool {
        tag == self.goos
            || tag == self.goarch
            || (tag == "unix" && UNIX_OS.contains(&self.goos.as_str()))
            || (self.goos == "android" && tag == "linux")
            || (self.goos == "illumos" && tag == "solaris")
            || (self.goos == "ios" && tag == "darwin")
            || tag == "gc"
            || is_release_tag(tag)
            || self.tags.contains(tag)
    }

    /// Whether a file named `name` with contents `source` is part of the build.
    pub fn includes(&self, name: &str, source: &str) -> bool {
        self.matches_file_name(name) && self.matches_source(source)
    }

    /// `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` suffix rules.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.split('.').next().unwrap_or(name);
        let Some(underscore) = stem.find('_') else {
            return true;
        };
        let mut parts: Vec<&str> = stem[underscore..].split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.has_tag(parts[n - 2]) && self.has_tag(parts[n - 1]);
        }
        if n >= 1 && KNOWN_OS.contains(&parts[n - 1]) {
            return self.has_tag(parts[n - 1]);
        }
        if n >= 1 && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.has_tag(parts[n - 1]);
        }
        true
    }

    /// Evaluates the constraint lines of the file header.
    pub fn matches_source(&self, source: &str) -> bool {
        let header = constraint_lines(source);
        if let Some(expr) = header.go_build {
            return match Expr::parse(&expr) {
                Some(expr) => expr.eval(&|tag| self.has_tag(tag)),
                None => false,
            };
        }
        header
            .plus_build
            .iter()
            .all(|line| self.matches_plus_build(line))
    }

    /// `// +build a,!b c`: space separated alternatives of comma joined terms.
    fn matches_plus_build(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !tag.is_empty() && !self.has_tag(tag),
                None => self.has_tag(term),
            })
        })
    }
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

#[derive(Default)]
struct ConstraintHeader {
    go_build: Option<String>,
    plus_build: Vec<String>,
}

/// Constraint comments before the package clause.
fn constraint_lines(source: &str) -> ConstraintHeader {
    let mut header = ConstraintHeader::default();
    let mut in_block = false;
    for line in source.lines() {
        let line = line.trim();
        if in_block {
            in_block = !line.contains("*/");
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if let Some(comment) = line.strip_prefix("//") {
            if let Some(expr) = comment.strip_prefix("go:build") {
                if header.go_build.is_none() && expr.starts_with(char::is_whitespace) {
                    header.go_build = Some(expr.trim().to_string());
                }
            } else if let Some(expr) = comment.trim_start().strip_prefix("+build") {
                if expr.starts_with(char::is_whitespace) {
                    header.plus_build.push(expr.trim().to_string());
                }
            }
            continue;
        }
        if line.starts_with("/*") {
            in_block = !line[2..].contains("*/");
            continue;
        }
        break;
    }
    header
}

#[derive(Debug, PartialEq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn parse(text: &str) -> Option<Expr> {
        let tokens = tokenize(text)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.or()?;
        (parser.pos == parser.tokens.len()).then_some(expr)
    }

    fn eval(&self, has_tag: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Tag(tag) => has_tag(tag),
            Expr::Not(inner) => !inner.eval(has_tag),
            Expr::And(lhs, rhs) => lhs.eval(has_tag) && rhs.eval(has_tag),
            Expr::Or(lhs, rhs) => lhs.eval(has_tag) || rhs.eval(has_tag),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(text: &str) -> Option<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '!' => tokens.push(Token::Not),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '&' if chars.next_if_eq(&'&').is_some() => tokens.push(Token::And),
            '|' if chars.next_if_eq(&'|').is_some() => tokens.push(Token::Or),
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = c.to_string();
                while let Some(next) = chars.next_if(|n| n.is_alphanumeric() || *n == '_' || *n == '.') {
                    tag.push(next);
                }
                tokens.push(Token::Tag(tag));
            }
            _ => return None,
        }
    }
    Some(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn eat(&mut self, token: &Token) -> bool {
        if self.tokens.get(self.pos) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or(&mut self) -> Option<Expr> {
        let mut expr = self.and()?;
        while self.eat(&Token::Or) {
            expr = Expr::Or(Box::new(expr), Box::new(self.and()?));
        }
        Some(expr)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut expr = self.not()?;
        while self.eat(&Token::And) {
            expr = Expr::And(Box::new(expr), Box::new(self.not()?));
        }
        Some(expr)
    }

    fn not(&mut self) -> Option<Expr> {
        if self.eat(&Token::Not) {
            return Some(Expr::Not(Box::new(self.not()?)));
        }
        if self.eat(&Token::Open) {
            let expr = self.or()?;
            return self.eat(&Token::Close).then_some(expr);
        }
        match self.tokens.get(self.pos).cloned() {
            Some(Token::Tag(tag)) => {
                self.pos += 1;
                Some(Expr::Tag(tag))
            }
            _ => None,
        }
    }
}
