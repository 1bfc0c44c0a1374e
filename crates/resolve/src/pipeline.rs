//! Entry points combining discovery, loading, grouping and conflict resolution

use indexmap::{IndexMap, IndexSet};

use crate::conflict::{ConflictResolver, IgnoreStore, Prompter};
use crate::document::DocumentSource;
use crate::errors::{ResolveResult, ResolveWarning};
use crate::grouper::{ModuleGroup, group_modules};
use crate::locator::DescriptorLocator;
use crate::module::ResolvedModule;
use crate::registry::ModuleRegistry;

/// Everything loaded for a set of patterns, before conflicts are decided
#[derive(Debug, Clone, Default)]
pub struct ModulesReport {
    pub grouped: IndexMap<String, ModuleGroup>,
    pub loaded: Vec<ResolvedModule>,
    /// Names and patterns with no descriptor
    pub failed: IndexSet<String>,
    pub warnings: Vec<ResolveWarning>,
}

impl ModulesReport {
    pub fn conflicts(&self) -> impl Iterator<Item = &ModuleGroup> {
        self.grouped.values().filter(|g| g.has_conflict)
    }
}

/// Modules chosen for generation
#[derive(Debug, Clone, Default)]
pub struct ResolvedReport {
    pub keep: Vec<ResolvedModule>,
    /// Groups of everything loaded, conflicts included
    pub grouped: IndexMap<String, ModuleGroup>,
    /// Package names discarded while resolving conflicts
    pub ignore: Vec<String>,
    pub failed: IndexSet<String>,
    pub warnings: Vec<ResolveWarning>,
}

/// Locate `patterns`, load them with their dependencies and group the result
pub fn get_modules<S: DocumentSource>(
    locator: &DescriptorLocator,
    registry: &mut ModuleRegistry<S>,
    patterns: &[String],
    ignore: &[String],
) -> ResolveResult<ModulesReport> {
    let located = locator.locate(patterns, ignore);
    let requested: Vec<String> = located.names.into_iter().collect();

    let outcome = registry.load(&requested, ignore)?;

    let mut failed: IndexSet<String> = located.unmatched.into_iter().collect();
    failed.extend(outcome.failed);

    let mut warnings = located.warnings;
    warnings.extend(registry.take_warnings());

    Ok(ModulesReport {
        grouped: group_modules(&outcome.loaded),
        loaded: outcome.loaded,
        failed,
        warnings,
    })
}

/// [`get_modules`], then decide conflicts unless `skip_conflict_prompt` is set
pub fn get_modules_resolved<S, P>(
    locator: &DescriptorLocator,
    registry: &mut ModuleRegistry<S>,
    patterns: &[String],
    ignore: &[String],
    skip_conflict_prompt: bool,
    prompter: P,
    store: Option<&mut dyn IgnoreStore>,
) -> ResolveResult<ResolvedReport>
where
    S: DocumentSource,
    P: Prompter,
{
    let report = get_modules(locator, registry, patterns, ignore)?;

    if skip_conflict_prompt {
        return Ok(ResolvedReport {
            keep: report.loaded,
            grouped: report.grouped,
            ignore: Vec::new(),
            failed: report.failed,
            warnings: report.warnings,
        });
    }

    let mut resolver = ConflictResolver::new(prompter);
    let resolution = resolver.resolve(&report.grouped, &report.loaded, ignore, store)?;

    let mut warnings = report.warnings;
    warnings.extend(resolution.warnings);

    Ok(ResolvedReport {
        keep: resolution.keep,
        grouped: report.grouped,
        ignore: resolution.ignore,
        failed: report.failed,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::ScriptedPrompter;
    use crate::document::FileSource;
    use std::fs;
    use std::path::Path;

    fn write_doc(dir: &Path, namespace: &str, version: &str, deps: &[&str]) {
        let doc = serde_json::json!({
            "namespace": namespace,
            "version": version,
            "dependencies": deps,
        });
        fs::write(
            dir.join(format!("{}-{}.json", namespace, version)),
            doc.to_string(),
        )
        .unwrap();
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_modules_reports_unmatched_patterns() {
        let tmp = tempfile::tempdir().unwrap();
        write_doc(tmp.path(), "Gtk", "3.0", &["GLib-2.0"]);
        write_doc(tmp.path(), "GLib", "2.0", &[]);

        let locator = DescriptorLocator::new([tmp.path()]);
        let mut registry = ModuleRegistry::new(FileSource::json(locator.clone()));
        let report =
            get_modules(&locator, &mut registry, &strings(&["Gtk-3.0", "Adw-1"]), &[]).unwrap();

        assert_eq!(report.loaded.len(), 2);
        assert_eq!(report.failed.iter().collect::<Vec<_>>(), vec!["Adw-1"]);
        assert_eq!(report.conflicts().count(), 0);
    }

    #[test]
    fn test_skip_prompt_keeps_conflicting_versions() {
        let tmp = tempfile::tempdir().unwrap();
        write_doc(tmp.path(), "Gtk", "3.0", &[]);
        write_doc(tmp.path(), "Gtk", "4.0", &[]);

        let locator = DescriptorLocator::new([tmp.path()]);
        let mut registry = ModuleRegistry::new(FileSource::json(locator.clone()));
        let mut prompter = ScriptedPrompter::default();
        let report = get_modules_resolved(
            &locator,
            &mut registry,
            &strings(&["Gtk-*"]),
            &[],
            true,
            &mut prompter,
            None,
        )
        .unwrap();

        assert_eq!(report.keep.len(), 2);
        assert!(report.grouped["gtk"].has_conflict);
        assert!(prompter.asked.is_empty());
    }
}
