#![forbid(unsafe_code)]
#![allow(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![deny(unused_must_use)]

//! gilt module resolution and symbol keys
//!
//! This crate provides:
//! - Discovery of interface descriptions by package name pattern
//! - Loading of modules and their transitive dependencies
//! - Grouping by namespace and interactive version conflict resolution
//! - Version-qualified symbol keys for type references
//!
//! Parsing raw descriptors, prompting the user and persisting configuration
//! happen behind the [`DocumentParser`], [`Prompter`] and [`IgnoreStore`]
//! traits.

pub mod conflict;
pub mod document;
pub mod errors;
pub mod grouper;
pub mod locator;
pub mod module;
pub mod pipeline;
pub mod registry;
pub mod symbol_table;

// Re-export main types
pub use conflict::{
    ConflictResolver, ConflictState, IgnoreStore, Prompter, Resolution, ScriptedPrompter,
    Selection,
};
pub use document::{
    Document, DocumentElement, DocumentParser, DocumentSource, ElementKind, FileSource,
    JsonDocumentParser, MemorySource,
};
pub use errors::{ResolveError, ResolveResult, ResolveWarning};
pub use grouper::{ModuleGroup, group_modules};
pub use locator::{DescriptorLocator, Located};
pub use module::{Dependency, Module, Origin, ResolvedModule};
pub use pipeline::{ModulesReport, ResolvedReport, get_modules, get_modules_resolved};
pub use registry::{LoadOutcome, LoadPass, ModuleRegistry};
pub use symbol_table::{ModuleScope, SymbolSession, UnresolvedReference};
