//! Module registry: loads documents and expands their dependencies
//!
//! Loading is a worklist. Each pass takes a seed of package names, loads the
//! ones not seen before and reports what it discovered as a [`LoadPass`]
//! snapshot. The driver recomputes transitive closures and feeds every newly
//! reachable name into the next pass until one discovers nothing.

use indexmap::{IndexMap, IndexSet};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::{HashMap, HashSet};

use crate::document::{Document, DocumentSource};
use crate::errors::{ResolveResult, ResolveWarning};
use crate::module::{Dependency, Module, Origin, ResolvedModule};

/// What a single pass did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadPass {
    pub seed: Vec<String>,
    /// Package names loaded for the first time in this pass
    pub discovered: Vec<String>,
    /// Names with no document, first reported in this pass
    pub failed: Vec<String>,
}

impl LoadPass {
    pub fn is_exhausted(&self) -> bool {
        self.discovered.is_empty()
    }
}

/// Result of [`ModuleRegistry::load`]
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub loaded: Vec<ResolvedModule>,
    pub failed: IndexSet<String>,
}

/// Owns every module loaded during one run and the graph of their edges
pub struct ModuleRegistry<S> {
    source: S,
    /// Edges point from a module to each dependency it declares. Nodes exist
    /// for declared dependencies whether or not they were ever loaded.
    graph: DiGraph<Dependency, ()>,
    nodes: HashMap<String, NodeIndex>,
    loaded: IndexMap<String, ResolvedModule>,
    documents: HashMap<String, Document>,
    attempted: HashSet<String>,
    failed: IndexSet<String>,
    warnings: Vec<ResolveWarning>,
}

impl<S: DocumentSource> ModuleRegistry<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            loaded: IndexMap::new(),
            documents: HashMap::new(),
            attempted: HashSet::new(),
            failed: IndexSet::new(),
            warnings: Vec::new(),
        }
    }

    /// Load `requested` and everything they transitively depend on
    pub fn load(&mut self, requested: &[String], ignore: &[String]) -> ResolveResult<LoadOutcome> {
        let mut seed = requested.to_vec();
        let mut origin = Origin::Explicit;

        loop {
            let pass = self.run_pass(&seed, origin)?;
            if pass.is_exhausted() {
                break;
            }
            tracing::debug!("Pass discovered {}", pass.discovered.join(", "));
            self.compute_closures();
            seed = self.next_seed(ignore);
            origin = Origin::Transitive;
        }

        Ok(LoadOutcome {
            loaded: self.loaded.values().cloned().collect(),
            failed: self.failed.clone(),
        })
    }

    /// Load every name in `seed` that has not been attempted yet
    pub fn run_pass(&mut self, seed: &[String], origin: Origin) -> ResolveResult<LoadPass> {
        let mut pass = LoadPass {
            seed: seed.to_vec(),
            discovered: Vec::new(),
            failed: Vec::new(),
        };

        for name in seed {
            if self.loaded.contains_key(name) || !self.attempted.insert(name.clone()) {
                continue;
            }

            let Some(document) = self.source.load(name)? else {
                if self.failed.insert(name.clone()) {
                    self.warn(ResolveWarning::ModuleNotFound { name: name.clone() });
                    pass.failed.push(name.clone());
                }
                continue;
            };

            let module = document.module();
            if &module.package_name != name {
                self.warn(ResolveWarning::IdentityMismatch {
                    requested: name.clone(),
                    declared: module.package_name.clone(),
                });
                self.attempted.insert(module.package_name.clone());
                if self.loaded.contains_key(&module.package_name) {
                    continue;
                }
            }

            pass.discovered.push(module.package_name.clone());
            self.insert(module, document, origin);
        }

        Ok(pass)
    }

    fn insert(&mut self, module: Module, document: Document, origin: Origin) {
        let from = self.node(&module.package_name);
        for dependency in &module.dependencies {
            let to = self.node(dependency);
            self.graph.update_edge(from, to, ());
        }
        self.documents.insert(module.package_name.clone(), document);
        self.loaded
            .insert(module.package_name.clone(), ResolvedModule::new(module, origin));
    }

    fn node(&mut self, package_name: &str) -> NodeIndex {
        if let Some(&index) = self.nodes.get(package_name) {
            return index;
        }
        let index = self.graph.add_node(Dependency::parse(package_name));
        self.nodes.insert(package_name.to_string(), index);
        index
    }

    /// Recompute the transitive closure of every loaded module
    pub fn compute_closures(&mut self) {
        let closures: Vec<(String, IndexSet<String>)> = self
            .loaded
            .keys()
            .map(|name| (name.clone(), self.closure_of(name)))
            .collect();

        for (name, closure) in closures {
            if let Some(resolved) = self.loaded.get_mut(&name) {
                resolved.module.transitive = closure;
            }
        }
    }

    /// Every package reachable from `package_name`, excluding itself
    pub fn closure_of(&self, package_name: &str) -> IndexSet<String> {
        let Some(&start) = self.nodes.get(package_name) else {
            return IndexSet::new();
        };

        let mut closure = IndexSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(index) = dfs.next(&self.graph) {
            if index != start {
                closure.insert(self.graph[index].package_name.clone());
            }
        }
        closure
    }

    fn next_seed(&mut self, ignore: &[String]) -> Vec<String> {
        let mut seed = IndexSet::new();
        for resolved in self.loaded.values() {
            for name in &resolved.module.transitive {
                if !self.loaded.contains_key(name) && !self.attempted.contains(name) {
                    seed.insert(name.clone());
                }
            }
        }

        for name in seed.iter().filter(|name| ignore.contains(*name)) {
            let dependents = self.dependents_of(name);
            self.warn(ResolveWarning::IgnoredDependencyRequired {
                dependency: name.clone(),
                dependents,
            });
        }

        seed.into_iter().collect()
    }

    /// Loaded modules declaring a direct dependency on `package_name`
    pub fn dependents_of(&self, package_name: &str) -> Vec<String> {
        let Some(&index) = self.nodes.get(package_name) else {
            return Vec::new();
        };
        let incoming: HashSet<&str> = self
            .graph
            .neighbors_directed(index, Direction::Incoming)
            .map(|n| self.graph[n].package_name.as_str())
            .collect();

        self.loaded
            .keys()
            .filter(|name| incoming.contains(name.as_str()))
            .cloned()
            .collect()
    }

    pub fn module(&self, package_name: &str) -> Option<&ResolvedModule> {
        self.loaded.get(package_name)
    }

    pub fn modules(&self) -> impl Iterator<Item = &ResolvedModule> {
        self.loaded.values()
    }

    /// The parsed document a loaded module came from
    pub fn document(&self, package_name: &str) -> Option<&Document> {
        self.documents.get(package_name)
    }

    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ResolveWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, warning: ResolveWarning) {
        warning.emit();
        self.warnings.push(warning);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemorySource;

    /// Serves the document of `target` when asked for `alias`
    struct AliasSource {
        inner: MemorySource,
        alias: &'static str,
        target: &'static str,
    }

    impl DocumentSource for AliasSource {
        fn load(&mut self, package_name: &str) -> ResolveResult<Option<Document>> {
            let name = if package_name == self.alias {
                self.target
            } else {
                package_name
            };
            self.inner.load(name)
        }
    }

    fn aliased() -> AliasSource {
        AliasSource {
            inner: MemorySource::new().with("GLib", "2.0", &[]),
            alias: "GLib-2",
            target: "GLib-2.0",
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn closure(registry: &ModuleRegistry<MemorySource>, name: &str) -> Vec<String> {
        let mut items: Vec<_> = registry
            .module(name)
            .unwrap()
            .module
            .transitive
            .iter()
            .cloned()
            .collect();
        items.sort();
        items
    }

    #[test]
    fn test_load_pulls_in_transitive_dependencies() {
        let source = MemorySource::new()
            .with("Gtk", "3.0", &["Gdk-3.0"])
            .with("Gdk", "3.0", &["GLib-2.0"])
            .with("GLib", "2.0", &[]);
        let mut registry = ModuleRegistry::new(source);

        let outcome = registry.load(&names(&["Gtk-3.0"]), &[]).unwrap();

        let loaded: Vec<_> = outcome.loaded.iter().map(|m| m.package_name()).collect();
        assert_eq!(loaded, vec!["Gtk-3.0", "Gdk-3.0", "GLib-2.0"]);
        assert_eq!(outcome.loaded[0].origin, Origin::Explicit);
        assert_eq!(outcome.loaded[1].origin, Origin::Transitive);
        assert_eq!(outcome.loaded[2].origin, Origin::Transitive);
        assert_eq!(closure(&registry, "Gtk-3.0"), vec!["GLib-2.0", "Gdk-3.0"]);
        assert!(outcome.failed.is_empty());
    }

    #[test]
    fn test_cycle_terminates_without_self() {
        let source = MemorySource::new()
            .with("A", "1", &["B-1"])
            .with("B", "1", &["A-1"]);
        let mut registry = ModuleRegistry::new(source);

        registry.load(&names(&["A-1"]), &[]).unwrap();

        assert_eq!(closure(&registry, "A-1"), vec!["B-1"]);
        assert_eq!(closure(&registry, "B-1"), vec!["A-1"]);
    }

    #[test]
    fn test_missing_dependency_warned_once() {
        let source = MemorySource::new()
            .with("Gtk", "3.0", &["Missing-1.0"])
            .with("Gdk", "3.0", &["Missing-1.0"]);
        let mut registry = ModuleRegistry::new(source);

        let outcome = registry
            .load(&names(&["Gtk-3.0", "Gdk-3.0", "Nope-2.0"]), &[])
            .unwrap();

        assert_eq!(outcome.loaded.len(), 2);
        assert_eq!(
            outcome.failed.iter().collect::<Vec<_>>(),
            vec!["Nope-2.0", "Missing-1.0"]
        );
        let missing = registry
            .warnings()
            .iter()
            .filter(|w| {
                matches!(w, ResolveWarning::ModuleNotFound { name } if name == "Missing-1.0")
            })
            .count();
        assert_eq!(missing, 1);
    }

    #[test]
    fn test_ignored_dependency_still_loaded_with_warning() {
        let source = MemorySource::new()
            .with("Gtk", "3.0", &["GLib-2.0"])
            .with("GLib", "2.0", &[]);
        let mut registry = ModuleRegistry::new(source);

        let outcome = registry
            .load(&names(&["Gtk-3.0"]), &names(&["GLib-2.0"]))
            .unwrap();

        assert_eq!(outcome.loaded.len(), 2);
        assert!(registry.warnings().contains(&ResolveWarning::IgnoredDependencyRequired {
            dependency: "GLib-2.0".into(),
            dependents: names(&["Gtk-3.0"]),
        }));
    }

    #[test]
    fn test_run_pass_snapshot() {
        let source = MemorySource::new().with("Gtk", "3.0", &["Gdk-3.0"]);
        let mut registry = ModuleRegistry::new(source);

        let first = registry
            .run_pass(&names(&["Gtk-3.0", "Gdk-3.0"]), Origin::Explicit)
            .unwrap();
        assert_eq!(first.discovered, names(&["Gtk-3.0"]));
        assert_eq!(first.failed, names(&["Gdk-3.0"]));

        let second = registry.run_pass(&names(&["Gtk-3.0"]), Origin::Explicit).unwrap();
        assert!(second.is_exhausted());
        assert!(second.failed.is_empty());
    }

    #[test]
    fn test_dependents_of() {
        let source = MemorySource::new()
            .with("Gtk", "3.0", &["GLib-2.0"])
            .with("Gio", "2.0", &["GLib-2.0"])
            .with("GLib", "2.0", &[]);
        let mut registry = ModuleRegistry::new(source);
        registry.load(&names(&["Gtk-3.0", "Gio-2.0"]), &[]).unwrap();

        assert_eq!(registry.dependents_of("GLib-2.0"), names(&["Gtk-3.0", "Gio-2.0"]));
        assert!(registry.dependents_of("Gtk-3.0").is_empty());
        assert!(registry.document("GLib-2.0").is_some());
    }

    #[test]
    fn test_identity_mismatch_keys_by_declared_name() {
        let mut registry = ModuleRegistry::new(aliased());

        let outcome = registry.load(&names(&["GLib-2"]), &[]).unwrap();

        let loaded: Vec<_> = outcome.loaded.iter().map(|m| m.package_name()).collect();
        assert_eq!(loaded, vec!["GLib-2.0"]);
        assert!(registry.warnings().contains(&ResolveWarning::IdentityMismatch {
            requested: "GLib-2".into(),
            declared: "GLib-2.0".into(),
        }));
        let again = registry.run_pass(&names(&["GLib-2.0"]), Origin::Explicit).unwrap();
        assert!(again.is_exhausted());
    }

    #[test]
    fn test_identity_mismatch_with_loaded_module_is_skipped() {
        let mut registry = ModuleRegistry::new(aliased());

        let pass = registry
            .run_pass(&names(&["GLib-2.0", "GLib-2"]), Origin::Explicit)
            .unwrap();

        assert_eq!(pass.discovered, names(&["GLib-2.0"]));
        assert!(pass.failed.is_empty());
        assert_eq!(registry.modules().count(), 1);
        assert_eq!(registry.warnings().len(), 1);
    }
}
