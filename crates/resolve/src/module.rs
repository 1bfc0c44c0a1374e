//! Loaded modules and their dependency edges

use indexmap::IndexSet;
use std::fmt;

/// A parsed interface description, identified by `<Namespace>-<Version>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Package name, unique within a run (e.g. "Gtk-3.0")
    pub package_name: String,
    pub namespace: String,
    pub version: String,
    /// Declared dependency package names, in document order
    pub dependencies: Vec<String>,
    /// Every package reachable through `dependencies`, excluding this one
    pub transitive: IndexSet<String>,
}

impl Module {
    pub fn new(namespace: impl Into<String>, version: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let version = version.into();
        Self {
            package_name: package_name(&namespace, &version),
            namespace,
            version,
            dependencies: Vec::new(),
            transitive: IndexSet::new(),
        }
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    /// Whether this module directly declares `package`
    pub fn depends_on(&self, package: &str) -> bool {
        self.dependencies.iter().any(|dep| dep == package)
    }

    /// The list symbol lookups scan: the module itself, then its closure
    pub fn lookup_dependencies(&self) -> Vec<String> {
        std::iter::once(self.package_name.clone())
            .chain(self.transitive.iter().cloned())
            .collect()
    }
}

/// Build a package name from its parts
pub fn package_name(namespace: &str, version: &str) -> String {
    format!("{}-{}", namespace, version)
}

/// A dependency string split into namespace and version
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dependency {
    pub namespace: String,
    pub version: String,
    pub package_name: String,
}

impl Dependency {
    /// Split on the last `-`; a name without one has an empty version
    pub fn parse(package_name: &str) -> Self {
        let (namespace, version) = match package_name.rsplit_once('-') {
            Some((namespace, version)) => (namespace, version),
            None => (package_name, ""),
        };
        Self {
            namespace: namespace.to_string(),
            version: version.to_string(),
            package_name: package_name.to_string(),
        }
    }
}

/// Why a module takes part in the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Requested by the user
    Explicit,
    /// Pulled in because another module depends on it
    Transitive,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Explicit => write!(f, "explicit"),
            Origin::Transitive => write!(f, "transitive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModule {
    pub module: Module,
    pub origin: Origin,
}

impl ResolvedModule {
    pub fn new(module: Module, origin: Origin) -> Self {
        Self { module, origin }
    }

    pub fn package_name(&self) -> &str {
        &self.module.package_name
    }

    pub fn namespace(&self) -> &str {
        &self.module.namespace
    }
}
