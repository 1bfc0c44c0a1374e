//! Pre-parsed interface descriptions and where they come from
//!
//! The resolver never looks inside a raw descriptor itself. A
//! [`DocumentParser`] turns file contents into a [`Document`], and a
//! [`DocumentSource`] answers "is there a document for this package name".

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::errors::{ResolveError, ResolveResult};
use crate::locator::DescriptorLocator;
use crate::module::Module;

/// One namespace at one version, as produced by a parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub namespace: String,
    pub version: String,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub elements: Vec<DocumentElement>,
}

impl Document {
    pub fn module(&self) -> Module {
        Module::new(&self.namespace, &self.version).with_dependencies(self.dependencies.clone())
    }
}

/// A named type or function declared by a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentElement {
    pub name: String,
    pub kind: ElementKind,
    /// Type references as written in the document (bare or qualified)
    #[serde(default)]
    pub references: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Class,
    Interface,
    Record,
    Enum,
    Bitfield,
    Callback,
    Alias,
    Function,
    Constant,
}

/// Turns raw descriptor text into a [`Document`]
pub trait DocumentParser {
    fn parse(&self, path: &Path, contents: &str) -> ResolveResult<Document>;
}

/// Parser for descriptors already serialized as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentParser;

impl DocumentParser for JsonDocumentParser {
    fn parse(&self, path: &Path, contents: &str) -> ResolveResult<Document> {
        serde_json::from_str(contents).map_err(|e| ResolveError::document(path, e))
    }
}

/// Supplies documents by package name
pub trait DocumentSource {
    /// `Ok(None)` means no document exists for `package_name`
    fn load(&mut self, package_name: &str) -> ResolveResult<Option<Document>>;
}

/// Reads descriptors from the locator's search directories
#[derive(Debug)]
pub struct FileSource<P = JsonDocumentParser> {
    locator: DescriptorLocator,
    parser: P,
}

impl FileSource<JsonDocumentParser> {
    pub fn json(locator: DescriptorLocator) -> Self {
        Self::new(locator, JsonDocumentParser)
    }
}

impl<P: DocumentParser> FileSource<P> {
    pub fn new(locator: DescriptorLocator, parser: P) -> Self {
        Self { locator, parser }
    }
}

impl<P: DocumentParser> DocumentSource for FileSource<P> {
    fn load(&mut self, package_name: &str) -> ResolveResult<Option<Document>> {
        let Some(path) = self.locator.find(package_name) else {
            return Ok(None);
        };
        tracing::debug!("Reading {}", path.display());
        let contents = fs::read_to_string(&path).map_err(|source| ResolveError::Io {
            path: path.clone(),
            source,
        })?;
        self.parser.parse(&path, &contents).map(Some)
    }
}

/// Documents held in memory, keyed by package name
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    documents: IndexMap<String, Document>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, document: Document) {
        let key = crate::module::package_name(&document.namespace, &document.version);
        self.documents.insert(key, document);
    }

    /// Shorthand for a document with dependencies and no elements
    pub fn with(mut self, namespace: &str, version: &str, dependencies: &[&str]) -> Self {
        self.insert(Document {
            namespace: namespace.to_string(),
            version: version.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            elements: Vec::new(),
        });
        self
    }
}

impl DocumentSource for MemorySource {
    fn load(&mut self, package_name: &str) -> ResolveResult<Option<Document>> {
        Ok(self.documents.get(package_name).cloned())
    }
}
