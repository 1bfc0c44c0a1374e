//! Human-readable summaries printed after each command

use colored::*;
use gilt_resolve::{
    ModuleGroup, ModulesReport, Origin, ResolvedModule, ResolvedReport, UnresolvedReference,
};
use indexmap::{IndexMap, IndexSet};

pub fn print_modules(report: &ModulesReport) {
    println!("{}", "Modules".bold());
    print_groups(&report.grouped);
    print_failed(&report.failed);

    let conflicts = report.conflicts().count();
    if conflicts > 0 {
        println!(
            "\n{} {} namespace(s) with more than one version; run `gilt resolve` to choose",
            "!".yellow().bold(),
            conflicts
        );
    }
}

pub fn print_resolved(report: &ResolvedReport) {
    println!("{}", "Kept".bold());
    for module in &report.keep {
        println!("  {}", describe(module));
    }
    if !report.ignore.is_empty() {
        println!("{}", "Ignored".bold());
        for name in &report.ignore {
            println!("  {}", name.dimmed());
        }
    }
    print_failed(&report.failed);
}

pub fn print_unresolved(unresolved: &[UnresolvedReference]) {
    println!(
        "{} {} unresolved type reference(s)",
        "✗".red().bold(),
        unresolved.len()
    );
    for item in unresolved {
        let target = item.key.as_deref().unwrap_or("unknown namespace");
        println!(
            "  {}.{} -> {} ({})",
            item.module,
            item.element,
            item.reference.yellow(),
            target.dimmed()
        );
    }
}

fn print_groups(grouped: &IndexMap<String, ModuleGroup>) {
    for group in grouped.values() {
        if group.has_conflict {
            println!("  {} {}", group.namespace.red().bold(), "(conflict)".red());
            for module in &group.modules {
                println!("    {}", describe(module));
            }
        } else {
            for module in &group.modules {
                println!("  {}", describe(module));
            }
        }
    }
}

fn print_failed(failed: &IndexSet<String>) {
    if failed.is_empty() {
        return;
    }
    println!("{}", "Not found".bold());
    for name in failed {
        println!("  {}", name.red());
    }
}

fn describe(module: &ResolvedModule) -> String {
    match module.origin {
        Origin::Explicit => module.package_name().to_string(),
        Origin::Transitive => format!("{} {}", module.package_name(), "(dependency)".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gilt_resolve::Module;

    #[test]
    fn test_describe_marks_dependencies() {
        colored::control::set_override(false);
        let explicit = ResolvedModule::new(Module::new("Gtk", "3.0"), Origin::Explicit);
        let transitive = ResolvedModule::new(Module::new("GLib", "2.0"), Origin::Transitive);

        assert_eq!(describe(&explicit), "Gtk-3.0");
        assert_eq!(describe(&transitive), "GLib-2.0 (dependency)");
    }
}
