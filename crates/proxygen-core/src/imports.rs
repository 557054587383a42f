//! Import bookkeeping for one generation request.
//!
//! Two tables are involved. [`ExistingImport`]s describe the import
//! declarations of the file being read, keyed by the selector the file uses.
//! The [`ImportTable`] describes the imports of the file being generated,
//! keyed by package path, with deterministic aliases.
//!
//! Aliases are handed out twice: provisionally when a table is built (so a
//! resolved expression can be rendered at any time), and again by
//! [`ImportTable::finalize`] once every method, embedded ones included, has
//! been resolved and usage is known. Both passes number entries in path order.

use serde::Serialize;

/// One import declaration of a source file that is being read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExistingImport {
    pub path: String,
    /// Declared package name of the imported package.
    pub name: String,
    /// File-local alias written in the import declaration, if any.
    pub alias: Option<String>,
}

impl ExistingImport {
    pub fn new(path: impl Into<String>, name: impl Into<String>, alias: Option<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            alias,
        }
    }

    /// The qualifier this import is referenced by in source. Blank and dot
    /// imports have none.
    pub fn selector(&self) -> Option<&str> {
        match self.alias.as_deref() {
            Some("_") | Some(".") => None,
            Some(alias) => Some(alias),
            None => Some(&self.name),
        }
    }
}

/// Find the import a qualifier refers to.
pub fn find_by_selector<'a>(
    existing: &'a [ExistingImport],
    qualifier: &str,
) -> Option<&'a ExistingImport> {
    existing
        .iter()
        .find(|import| import.selector() == Some(qualifier))
}

/// Why an import ends up in the generated file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Usage {
    /// Referenced by the root interface's own methods or its own name.
    Root,
    /// Referenced by a method flattened in from an embedded interface.
    EmbeddedInterface,
    /// Declares an embedded interface that gets a conformance assertion.
    EmbeddingOwner,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImportEntry {
    pub path: String,
    pub original_name: String,
    pub alias: String,
    pub used_by_root: bool,
    pub used_as_embedding_owner: bool,
    pub used_as_embedding_interface: bool,
}

impl ImportEntry {
    fn new(path: String, original_name: String) -> Self {
        Self {
            path,
            original_name,
            alias: String::new(),
            used_by_root: false,
            used_as_embedding_owner: false,
            used_as_embedding_interface: false,
        }
    }

    pub fn is_used(&self) -> bool {
        self.used_by_root || self.used_as_embedding_owner || self.used_as_embedding_interface
    }

    fn mark(&mut self, usage: Usage) {
        match usage {
            Usage::Root => self.used_by_root = true,
            Usage::EmbeddedInterface => self.used_as_embedding_interface = true,
            Usage::EmbeddingOwner => self.used_as_embedding_owner = true,
        }
    }

    fn absorb(&mut self, other: &ImportEntry) {
        self.used_by_root |= other.used_by_root;
        self.used_as_embedding_owner |= other.used_as_embedding_owner;
        self.used_as_embedding_interface |= other.used_as_embedding_interface;
    }
}

/// Imports of the generated file: at most one entry per path, kept sorted by
/// path so that aliases never depend on discovery order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportTable {
    interface_name: String,
    entries: Vec<ImportEntry>,
}

impl ImportTable {
    /// An empty table whose aliases embed `interface_name`.
    pub fn new(interface_name: impl Into<String>) -> Self {
        Self {
            interface_name: interface_name.into(),
            entries: Vec::new(),
        }
    }

    /// Build a table from `(path, package name)` candidates and assign
    /// provisional aliases.
    pub fn provisional<I, P, N>(interface_name: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = (P, N)>,
        P: Into<String>,
        N: Into<String>,
    {
        let mut table = Self::new(interface_name);
        for (path, name) in candidates {
            table.insert_entry(ImportEntry::new(path.into(), name.into()));
        }
        table.renumber();
        table
    }

    pub fn entries(&self) -> &[ImportEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&ImportEntry> {
        self.position(path).ok().map(|idx| &self.entries[idx])
    }

    pub fn alias_of(&self, path: &str) -> Option<&str> {
        self.get(path).map(|entry| entry.alias.as_str())
    }

    /// Add `path` if it is not present yet. Aliases are renumbered.
    pub fn insert(&mut self, path: impl Into<String>, name: impl Into<String>) -> bool {
        let inserted = self.insert_entry(ImportEntry::new(path.into(), name.into()));
        if inserted {
            self.renumber();
        }
        inserted
    }

    /// Record that `path` is referenced. Returns `false` if the table has no
    /// entry for it.
    pub fn mark_used(&mut self, path: &str, usage: Usage) -> bool {
        match self.position(path) {
            Ok(idx) => {
                self.entries[idx].mark(usage);
                true
            }
            Err(_) => false,
        }
    }

    /// Merge the entries of `other` into this table. Entries with the same
    /// path collapse into one whose usage flags are the union of both.
    pub fn merge(&mut self, other: ImportTable) {
        for entry in other.entries {
            match self.position(&entry.path) {
                Ok(idx) => self.entries[idx].absorb(&entry),
                Err(idx) => self.entries.insert(idx, entry),
            }
        }
        self.renumber();
    }

    /// Drop every unused entry and renumber the rest densely in path order.
    pub fn finalize(mut self) -> Self {
        self.entries.retain(ImportEntry::is_used);
        self.renumber();
        self
    }

    fn position(&self, path: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|entry| entry.path.as_str().cmp(path))
    }

    fn insert_entry(&mut self, entry: ImportEntry) -> bool {
        match self.position(&entry.path) {
            Ok(_) => false,
            Err(idx) => {
                self.entries.insert(idx, entry);
                true
            }
        }
    }

    fn renumber(&mut self) {
        for (index, entry) in self.entries.iter_mut().enumerate() {
            entry.alias = import_alias(&entry.original_name, &self.interface_name, index);
        }
    }
}

/// `<ownerPackage><InterfaceName><index>`
pub fn import_alias(package: &str, interface_name: &str, index: usize) -> String {
    format!("{}{}{}", identifier_fragment(package), interface_name, index)
}

fn identifier_fragment(package: &str) -> String {
    let cleaned: String = package
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_')
        .collect();
    match cleaned.chars().next() {
        Some(first) if !first.is_ascii_digit() => cleaned,
        _ => format!("pkg{}", cleaned),
    }
}

/// Best-effort package name for an import path whose package clause is not
/// available: the last path element, skipping a `/vN` major-version element
/// and dropping a gopkg-style `.vN` suffix.
pub fn guess_package_name(path: &str) -> String {
    let mut segments = path.rsplit('/').filter(|segment| !segment.is_empty());
    let last = segments.next().unwrap_or(path);
    let segment = if is_major_version(last) {
        segments.next().unwrap_or(last)
    } else {
        last
    };
    let segment = match segment.rsplit_once('.') {
        Some((stem, suffix)) if is_major_version(suffix) => stem,
        _ => segment,
    };
    let segment = segment.strip_prefix("go-").unwrap_or(segment);
    segment
        .chars()
        .filter(|ch| ch.is_alphanumeric() || *ch == '_')
        .collect()
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|ch| ch.is_ascii_digit())
}
