//! Version-qualified symbol keys
//!
//! A type reference inside a document is bare (`Window`), qualified with the
//! owner's namespace (`Gtk.Window`), fully qualified (`Gtk-3.0.Gtk.Window`),
//! or qualified with a foreign namespace (`Gdk.Window`). Every form maps to a
//! key of the shape `<Package>.<Namespace>.<Name>`, where the package is
//! chosen from the requesting module's dependency list.
//!
//! A [`SymbolSession`] is owned by a single run.

use indexmap::IndexMap;

use crate::document::{Document, DocumentElement};
use crate::errors::ResolveWarning;
use crate::module::Module;

const SEPARATOR: char = '.';

/// Compute the key for `reference` as seen from the owning module
///
/// Returns the namespace that could not be matched when no dependency
/// provides it.
pub fn qualify<'r>(
    dependencies: &[String],
    reference: &'r str,
    owner_package_name: &str,
    owner_namespace: &str,
) -> Result<String, &'r str> {
    if reference
        .strip_prefix(owner_package_name)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
    {
        return Ok(reference.to_string());
    }

    if reference
        .strip_prefix(owner_namespace)
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
    {
        return Ok(format!("{}{}{}", owner_package_name, SEPARATOR, reference));
    }

    let Some((namespace, _)) = reference.split_once(SEPARATOR) else {
        return Ok(format!(
            "{}{sep}{}{sep}{}",
            owner_package_name,
            owner_namespace,
            reference,
            sep = SEPARATOR
        ));
    };

    dependencies
        .iter()
        .find(|dep| {
            dep.strip_prefix(namespace)
                .is_some_and(|rest| rest.starts_with('-'))
        })
        .map(|dep| format!("{}{}{}", dep, SEPARATOR, reference))
        .ok_or(namespace)
}

/// Key → element table for one resolution run
#[derive(Debug, Clone)]
pub struct SymbolSession<E = DocumentElement> {
    symbols: IndexMap<String, E>,
    warnings: Vec<ResolveWarning>,
}

impl<E> Default for SymbolSession<E> {
    fn default() -> Self {
        Self {
            symbols: IndexMap::new(),
            warnings: Vec::new(),
        }
    }
}

impl<E> SymbolSession<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for `reference`, or `None` with a warning if its namespace is unknown
    pub fn resolve_key(
        &mut self,
        dependencies: &[String],
        reference: &str,
        owner_package_name: &str,
        owner_namespace: &str,
    ) -> Option<String> {
        match qualify(dependencies, reference, owner_package_name, owner_namespace) {
            Ok(key) => Some(key),
            Err(namespace) => {
                let warning = ResolveWarning::UnresolvedNamespace {
                    namespace: namespace.to_string(),
                    reference: reference.to_string(),
                    owner: owner_package_name.to_string(),
                };
                warning.emit();
                self.warnings.push(warning);
                None
            }
        }
    }

    pub fn get(
        &mut self,
        dependencies: &[String],
        reference: &str,
        owner_package_name: &str,
        owner_namespace: &str,
    ) -> Option<&E> {
        let key = self.resolve_key(dependencies, reference, owner_package_name, owner_namespace)?;
        self.symbols.get(&key)
    }

    /// Store `element` under the key for `reference`; no-op if there is none
    pub fn set(
        &mut self,
        dependencies: &[String],
        reference: &str,
        owner_package_name: &str,
        owner_namespace: &str,
        element: E,
    ) {
        if let Some(key) =
            self.resolve_key(dependencies, reference, owner_package_name, owner_namespace)
        {
            self.symbols.insert(key, element);
        }
    }

    /// Bind an owner module for shorter lookups
    pub fn scope<'s>(&'s mut self, module: &Module) -> ModuleScope<'s, E> {
        ModuleScope {
            session: self,
            package_name: module.package_name.clone(),
            namespace: module.namespace.clone(),
            dependencies: module.lookup_dependencies(),
        }
    }

    pub fn lookup_key(&self, key: &str) -> Option<&E> {
        self.symbols.get(key)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<ResolveWarning> {
        std::mem::take(&mut self.warnings)
    }
}

/// A reference that does not map to a registered symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    pub module: String,
    pub element: String,
    pub reference: String,
    /// Key the reference maps to, when its namespace was resolvable
    pub key: Option<String>,
}

impl SymbolSession<DocumentElement> {
    /// Register every element of `document` under its bare name
    pub fn register_document(&mut self, module: &Module, document: &Document) {
        let mut scope = self.scope(module);
        for element in &document.elements {
            scope.set(&element.name, element.clone());
        }
    }

    /// References of `document` that do not resolve to a registered element
    pub fn unresolved_references(
        &mut self,
        module: &Module,
        document: &Document,
    ) -> Vec<UnresolvedReference> {
        let mut scope = self.scope(module);
        let mut unresolved = Vec::new();
        for element in &document.elements {
            for reference in &element.references {
                let key = scope.resolve_key(reference);
                if key.as_deref().and_then(|k| scope.lookup_key(k)).is_none() {
                    unresolved.push(UnresolvedReference {
                        module: module.package_name.clone(),
                        element: element.name.clone(),
                        reference: reference.clone(),
                        key,
                    });
                }
            }
        }
        unresolved
    }
}

/// A session seen from one owning module
pub struct ModuleScope<'s, E> {
    session: &'s mut SymbolSession<E>,
    package_name: String,
    namespace: String,
    dependencies: Vec<String>,
}

impl<E> ModuleScope<'_, E> {
    pub fn resolve_key(&mut self, reference: &str) -> Option<String> {
        self.session
            .resolve_key(&self.dependencies, reference, &self.package_name, &self.namespace)
    }

    pub fn get(&mut self, reference: &str) -> Option<&E> {
        self.session
            .get(&self.dependencies, reference, &self.package_name, &self.namespace)
    }

    pub fn set(&mut self, reference: &str, element: E) {
        self.session.set(
            &self.dependencies,
            reference,
            &self.package_name,
            &self.namespace,
            element,
        );
    }

    fn lookup_key(&self, key: &str) -> Option<&E> {
        self.session.lookup_key(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::ElementKind;

    fn deps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn element(name: &str, references: &[&str]) -> DocumentElement {
        DocumentElement {
            name: name.to_string(),
            kind: ElementKind::Class,
            references: deps(references),
        }
    }

    #[test]
    fn test_bare_and_shorthand_agree() {
        let mut session = SymbolSession::<()>::new();
        let d = deps(&["Gtk-3.0"]);

        assert_eq!(
            session.resolve_key(&d, "Window", "Gtk-3.0", "Gtk").as_deref(),
            Some("Gtk-3.0.Gtk.Window")
        );
        assert_eq!(
            session.resolve_key(&d, "Gtk.Window", "Gtk-3.0", "Gtk").as_deref(),
            Some("Gtk-3.0.Gtk.Window")
        );
        assert_eq!(
            session
                .resolve_key(&d, "Gtk-3.0.Gtk.Window", "Gtk-3.0", "Gtk")
                .as_deref(),
            Some("Gtk-3.0.Gtk.Window")
        );
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_foreign_namespace_uses_dependency_version() {
        let mut session = SymbolSession::<()>::new();
        let d = deps(&["Gdk-3.0", "GLib-2.0"]);

        assert_eq!(
            session.resolve_key(&d, "Gdk.Window", "Gtk-3.0", "Gtk").as_deref(),
            Some("Gdk-3.0.Gdk.Window")
        );
        assert_eq!(
            session.resolve_key(&d, "GLib.Error", "Gtk-3.0", "Gtk").as_deref(),
            Some("GLib-2.0.GLib.Error")
        );
    }

    #[test]
    fn test_namespace_prefix_needs_dash() {
        // "Gdk" must not match "GdkPixbuf-2.0"
        let mut session = SymbolSession::<()>::new();
        let d = deps(&["GdkPixbuf-2.0", "Gdk-3.0"]);

        assert_eq!(
            session.resolve_key(&d, "Gdk.Pixbuf", "Gtk-3.0", "Gtk").as_deref(),
            Some("Gdk-3.0.Gdk.Pixbuf")
        );
    }

    #[test]
    fn test_unknown_namespace_warns_once() {
        let mut session = SymbolSession::<()>::new();

        assert_eq!(session.resolve_key(&[], "Foo.Bar", "Gtk-3.0", "Gtk"), None);
        assert_eq!(
            session.warnings(),
            &[ResolveWarning::UnresolvedNamespace {
                namespace: "Foo".into(),
                reference: "Foo.Bar".into(),
                owner: "Gtk-3.0".into(),
            }]
        );
    }

    #[test]
    fn test_get_and_set() {
        let mut session = SymbolSession::new();
        let d = deps(&["Gtk-3.0"]);

        session.set(&d, "Window", "Gtk-3.0", "Gtk", 7);
        session.set(&[], "Foo.Bar", "Gtk-3.0", "Gtk", 9);

        assert_eq!(session.len(), 1);
        assert_eq!(session.get(&d, "Gtk.Window", "Gtk-3.0", "Gtk"), Some(&7));
        assert_eq!(session.get(&d, "Widget", "Gtk-3.0", "Gtk"), None);
    }

    #[test]
    fn test_sessions_are_isolated() {
        let d = deps(&["Gtk-3.0"]);
        let mut first = SymbolSession::new();
        first.set(&d, "Window", "Gtk-3.0", "Gtk", 1);

        let mut second = SymbolSession::<i32>::new();
        assert_eq!(second.get(&d, "Window", "Gtk-3.0", "Gtk"), None);
    }

    #[test]
    fn test_register_document_and_report_unresolved() {
        let gdk = Module::new("Gdk", "3.0");
        let gdk_doc = Document {
            namespace: "Gdk".into(),
            version: "3.0".into(),
            dependencies: Vec::new(),
            elements: vec![element("Window", &[])],
        };
        let mut gtk = Module::new("Gtk", "3.0").with_dependencies(["Gdk-3.0"]);
        gtk.transitive.insert("Gdk-3.0".into());
        let gtk_doc = Document {
            namespace: "Gtk".into(),
            version: "3.0".into(),
            dependencies: vec!["Gdk-3.0".into()],
            elements: vec![
                element("Widget", &[]),
                element("Window", &["Gdk.Window", "Widget", "Bin", "Pango.Layout"]),
            ],
        };

        let mut session = SymbolSession::new();
        session.register_document(&gdk, &gdk_doc);
        session.register_document(&gtk, &gtk_doc);

        assert!(session.lookup_key("Gdk-3.0.Gdk.Window").is_some());
        assert_eq!(session.scope(&gtk).get("Window").map(|e| e.name.as_str()), Some("Window"));

        let unresolved = session.unresolved_references(&gtk, &gtk_doc);
        let refs: Vec<_> = unresolved.iter().map(|u| u.reference.as_str()).collect();
        assert_eq!(refs, vec!["Bin", "Pango.Layout"]);
        assert_eq!(unresolved[0].key.as_deref(), Some("Gtk-3.0.Gtk.Bin"));
        assert_eq!(unresolved[1].key, None);
    }
}
