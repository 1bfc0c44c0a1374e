//! Error and notice types for the gilt resolver
//!
//! Fatal conditions are [`ResolveError`]s and abort the run. Everything the
//! resolver can recover from is a [`ResolveWarning`]: it is logged where it is
//! raised and collected by the component that raised it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Conditions that abort a resolution run
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A conflict group was asked for a package it does not contain
    #[error("Module `{package}` not found in group `{group}`")]
    ModuleNotFound { package: String, group: String },

    /// The prompter answered with something that was not offered
    #[error(
        "Invalid answer `{answer}` to \"{question}\" (expected one of: {})",
        .choices.join(", ")
    )]
    InvalidAnswer {
        question: String,
        answer: String,
        choices: Vec<String>,
    },

    /// The prompter could not produce an answer at all
    #[error("No answer to \"{question}\": {reason}")]
    Prompt { question: String, reason: String },

    /// A descriptor was found but could not be parsed
    #[error("Malformed descriptor `{}`: {reason}", .path.display())]
    Document { path: PathBuf, reason: String },

    /// Reading a descriptor failed after it was located
    #[error("Failed to read `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The ignore list could not be persisted
    #[error("Failed to persist ignore list: {0}")]
    Store(String),
}

impl ResolveError {
    pub fn module_not_found(package: impl Into<String>, group: impl Into<String>) -> Self {
        Self::ModuleNotFound {
            package: package.into(),
            group: group.into(),
        }
    }

    pub fn invalid_answer(question: &str, answer: &str, choices: &[String]) -> Self {
        Self::InvalidAnswer {
            question: question.to_string(),
            answer: answer.to_string(),
            choices: choices.to_vec(),
        }
    }

    pub fn document(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Document {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Error code for categorization
    pub fn code(&self) -> &'static str {
        match self {
            Self::ModuleNotFound { .. } => "G0001",
            Self::InvalidAnswer { .. } => "G0002",
            Self::Prompt { .. } => "G0003",
            Self::Document { .. } => "G0004",
            Self::Io { .. } => "G0005",
            Self::Store(_) => "G0006",
        }
    }
}

/// Recoverable conditions surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveWarning {
    #[error("No descriptor found for module `{name}`")]
    ModuleNotFound { name: String },

    #[error("No descriptor matches `{pattern}`")]
    PatternUnmatched { pattern: String },

    #[error("Cannot search directory `{}`: {reason}", .path.display())]
    DirectoryUnreadable { path: PathBuf, reason: String },

    #[error("Ignoring `{name}`")]
    Ignored { name: String },

    #[error(
        "`{dependency}` is ignored but required by {}; consider ignoring those modules too",
        .dependents.join(", ")
    )]
    IgnoredDependencyRequired {
        dependency: String,
        dependents: Vec<String>,
    },

    #[error("`{dependent}` is kept although its dependency `{dependency}` was discarded")]
    DependentKept {
        dependent: String,
        dependency: String,
    },

    #[error("Descriptor for `{requested}` declares itself as `{declared}`")]
    IdentityMismatch { requested: String, declared: String },

    #[error(
        "Cannot resolve namespace `{namespace}` of type reference `{reference}` from `{owner}`"
    )]
    UnresolvedNamespace {
        namespace: String,
        reference: String,
        owner: String,
    },
}

impl ResolveWarning {
    /// Log this notice through `tracing`
    pub fn emit(&self) {
        match self {
            Self::Ignored { .. } => tracing::info!("{}", self),
            _ => tracing::warn!("{}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_error_codes_are_distinct() {
        let errors = [
            ResolveError::module_not_found("Gtk-3.0", "gtk"),
            ResolveError::invalid_answer("q", "a", &["b".to_string()]),
            ResolveError::Prompt {
                question: "q".into(),
                reason: "eof".into(),
            },
            ResolveError::document("Gtk-3.0.json", "bad"),
            ResolveError::Io {
                path: "Gtk-3.0.json".into(),
                source: std::io::Error::other("denied"),
            },
            ResolveError::Store("denied".into()),
        ];
        let codes: HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_invalid_answer_message_lists_choices() {
        let err = ResolveError::invalid_answer(
            "Pick",
            "Gtk-5.0",
            &["All".to_string(), "Gtk-3.0".to_string()],
        );
        assert_eq!(
            err.to_string(),
            "Invalid answer `Gtk-5.0` to \"Pick\" (expected one of: All, Gtk-3.0)"
        );
    }

    #[test]
    fn test_warning_names_dependents() {
        let warning = ResolveWarning::IgnoredDependencyRequired {
            dependency: "GLib-2.0".into(),
            dependents: vec!["Gio-2.0".into(), "Gtk-3.0".into()],
        };
        assert!(warning.to_string().contains("Gio-2.0, Gtk-3.0"));
    }
}
