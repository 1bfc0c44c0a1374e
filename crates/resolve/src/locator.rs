//! Descriptor discovery
//!
//! Expands user-supplied package name patterns against the search
//! directories. A pattern is either an exact package name or ends in `*`,
//! which matches any suffix.

use glob::{Pattern, glob};
use indexmap::IndexSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::ResolveWarning;

pub const DEFAULT_EXTENSION: &str = "json";

/// Finds descriptor files in a list of directories
#[derive(Debug, Clone)]
pub struct DescriptorLocator {
    search_dirs: Vec<PathBuf>,
    extension: String,
}

/// Outcome of expanding a set of patterns
#[derive(Debug, Clone, Default)]
pub struct Located {
    /// Package names found, deduplicated, in discovery order
    pub names: IndexSet<String>,
    /// Patterns that matched no descriptor anywhere
    pub unmatched: Vec<String>,
    pub warnings: Vec<ResolveWarning>,
}

impl DescriptorLocator {
    pub fn new<I, P>(search_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_dirs: search_dirs.into_iter().map(Into::into).collect(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Expand `patterns`, dropping names listed in `ignore`
    pub fn locate(&self, patterns: &[String], ignore: &[String]) -> Located {
        let mut located = Located::default();

        let mut searchable = Vec::new();
        for dir in &self.search_dirs {
            match fs::metadata(dir) {
                Ok(meta) if meta.is_dir() => searchable.push(dir.as_path()),
                Ok(_) => located.warn(ResolveWarning::DirectoryUnreadable {
                    path: dir.clone(),
                    reason: "not a directory".to_string(),
                }),
                Err(e) => located.warn(ResolveWarning::DirectoryUnreadable {
                    path: dir.clone(),
                    reason: e.to_string(),
                }),
            }
        }

        for pattern in patterns {
            let mut matched = false;
            for dir in &searchable {
                for name in self.expand(dir, pattern, &mut located) {
                    matched = true;
                    if ignore.contains(&name) {
                        located.warn(ResolveWarning::Ignored { name });
                        continue;
                    }
                    located.names.insert(name);
                }
            }

            if !matched {
                located.warn(ResolveWarning::PatternUnmatched {
                    pattern: pattern.clone(),
                });
                located.unmatched.push(pattern.clone());
            }
        }

        located
    }

    /// Path of the descriptor for `package_name`, first directory wins
    pub fn find(&self, package_name: &str) -> Option<PathBuf> {
        let file_name = format!("{}.{}", package_name, self.extension);
        self.search_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|path| path.is_file())
    }

    /// Package names in `dir` matching `pattern`, sorted
    fn expand(&self, dir: &Path, pattern: &str, located: &mut Located) -> Vec<String> {
        let glob_pattern = self.glob_pattern(dir, pattern);
        let entries = match glob(&glob_pattern) {
            Ok(entries) => entries,
            Err(e) => {
                located.warn(ResolveWarning::DirectoryUnreadable {
                    path: dir.to_path_buf(),
                    reason: format!("invalid pattern `{}`: {}", glob_pattern, e.msg),
                });
                return Vec::new();
            }
        };

        let suffix = format!(".{}", self.extension);
        let mut names = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    if !path.is_file() {
                        continue;
                    }
                    let stem = path
                        .file_name()
                        .and_then(|f| f.to_str())
                        .and_then(|f| f.strip_suffix(suffix.as_str()));
                    if let Some(stem) = stem {
                        names.push(stem.to_string());
                    }
                }
                Err(e) => located.warn(ResolveWarning::DirectoryUnreadable {
                    path: e.path().to_path_buf(),
                    reason: e.error().to_string(),
                }),
            }
        }

        names.sort();
        names
    }

    /// Only a trailing `*` is a wildcard; everything else is matched literally
    fn glob_pattern(&self, dir: &Path, pattern: &str) -> String {
        let file_name = match pattern.strip_suffix('*') {
            Some(prefix) => format!("{}*", Pattern::escape(prefix)),
            None => Pattern::escape(pattern),
        };
        let dir = Pattern::escape(&dir.to_string_lossy());
        Path::new(&dir)
            .join(format!("{}.{}", file_name, Pattern::escape(&self.extension)))
            .to_string_lossy()
            .into_owned()
    }
}

impl Located {
    /// Record and log `warning` unless an identical one was already recorded
    fn warn(&mut self, warning: ResolveWarning) {
        if !self.warnings.contains(&warning) {
            warning.emit();
            self.warnings.push(warning);
        }
    }
}
