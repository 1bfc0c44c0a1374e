//! Partitioning of loaded modules by namespace

use indexmap::IndexMap;

use crate::module::ResolvedModule;

/// All loaded versions of one namespace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGroup {
    /// Namespace as spelled by the first module discovered
    pub namespace: String,
    pub modules: Vec<ResolvedModule>,
    pub has_conflict: bool,
}

impl ModuleGroup {
    pub fn package_names(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(|m| m.package_name())
    }

    pub fn find(&self, package_name: &str) -> Option<&ResolvedModule> {
        self.modules.iter().find(|m| m.package_name() == package_name)
    }
}

/// Group by lowercased namespace, preserving discovery order
pub fn group_modules<'a, I>(modules: I) -> IndexMap<String, ModuleGroup>
where
    I: IntoIterator<Item = &'a ResolvedModule>,
{
    let mut groups: IndexMap<String, ModuleGroup> = IndexMap::new();
    for resolved in modules {
        let group = groups
            .entry(resolved.namespace().to_lowercase())
            .or_insert_with(|| ModuleGroup {
                namespace: resolved.namespace().to_string(),
                modules: Vec::new(),
                has_conflict: false,
            });
        group.modules.push(resolved.clone());
        group.has_conflict = group.modules.len() >= 2;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{Module, Origin};

    fn resolved(namespace: &str, version: &str) -> ResolvedModule {
        ResolvedModule::new(Module::new(namespace, version), Origin::Explicit)
    }

    #[test]
    fn test_conflicting_versions_share_a_group() {
        let modules = vec![
            resolved("Gtk", "3.0"),
            resolved("GLib", "2.0"),
            resolved("Gtk", "4.0"),
        ];
        let groups = group_modules(&modules);

        assert_eq!(groups.len(), 2);
        let gtk = &groups["gtk"];
        assert!(gtk.has_conflict);
        assert_eq!(gtk.namespace, "Gtk");
        assert_eq!(gtk.package_names().collect::<Vec<_>>(), vec!["Gtk-3.0", "Gtk-4.0"]);
        assert!(!groups["glib"].has_conflict);
    }

    #[test]
    fn test_namespace_match_is_case_insensitive() {
        let modules = vec![resolved("GObject", "2.0"), resolved("Gobject", "3.0")];
        let groups = group_modules(&modules);

        assert_eq!(groups.len(), 1);
        assert!(groups["gobject"].has_conflict);
        assert_eq!(groups["gobject"].namespace, "GObject");
    }

    #[test]
    fn test_empty_input() {
        assert!(group_modules(&Vec::<ResolvedModule>::new()).is_empty());
    }
}
