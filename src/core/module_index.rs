//! Lookup table from module name to function bodies, used to follow calls
//! across source units.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::locator::SourceLocator;
use super::parser::{CodeParser, ParseOutcome, SourceStore};
use super::syntax::{Expr, SyntaxTree};

/// A source unit or location that was skipped while building the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDiagnostic {
    pub path: PathBuf,
    pub reason: String,
}

impl IndexDiagnostic {
    pub fn new(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Module name -> function name -> function body.
///
/// Built once per run and read-only afterwards. When several units declare
/// the same module, later units override earlier ones per function name.
#[derive(Debug, Clone, Default)]
pub struct ModuleIndex {
    modules: BTreeMap<String, BTreeMap<String, Expr>>,
    diagnostics: Vec<IndexDiagnostic>,
}

impl ModuleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every source unit reachable from `locations`
    pub fn build(parser: &mut CodeParser, store: &dyn SourceStore, locations: &[String]) -> Self {
        let locator = SourceLocator::new(parser.file_extensions());
        let (paths, mut diagnostics) = locator.locate(locations);

        let mut index = Self::build_from_paths(parser, store, &paths);
        diagnostics.append(&mut index.diagnostics);
        index.diagnostics = diagnostics;
        index
    }

    /// Index the given units in order
    pub fn build_from_paths(parser: &mut CodeParser, store: &dyn SourceStore, paths: &[PathBuf]) -> Self {
        let mut index = Self::new();

        for path in paths {
            match parser.load(store, path) {
                ParseOutcome::Success(tree) => index.merge(tree),
                ParseOutcome::NotFound => index.skip(path, "source not found"),
                ParseOutcome::ParseError(reason) => index.skip(path, reason),
            }
        }

        info!(
            "Indexed {} modules from {} source units ({} skipped)",
            index.modules.len(),
            paths.len(),
            index.diagnostics.len()
        );

        index
    }

    /// Merge every module a unit declares; existing functions with the same name are replaced
    pub fn merge(&mut self, tree: SyntaxTree) {
        if tree.modules.is_empty() {
            debug!("{} declares no module", tree.path.display());
        }

        for module in tree.modules {
            let functions = self.modules.entry(module.name).or_default();
            for function in module.functions {
                functions.insert(function.name, function.body);
            }
        }
    }

    fn skip(&mut self, path: &Path, reason: impl Into<String>) {
        let diagnostic = IndexDiagnostic::new(path, reason);
        warn!("Skipping {}: {}", path.display(), diagnostic.reason);
        self.diagnostics.push(diagnostic);
    }

    pub fn function_body(&self, module: &str, function: &str) -> Option<&Expr> {
        self.modules.get(module).and_then(|functions| functions.get(function))
    }

    pub fn contains_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn module_names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    /// Function names defined by `module`, sorted
    pub fn functions(&self, module: &str) -> Vec<&str> {
        self.modules
            .get(module)
            .map(|functions| functions.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn diagnostics(&self) -> &[IndexDiagnostic] {
        &self.diagnostics
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
