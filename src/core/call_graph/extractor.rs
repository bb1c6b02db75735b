use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::config::ExtractionConfig;
use crate::error::{CalltrailError, Result};
use super::{CallRecord, ExtractionResult, UNKNOWN_MODULE};
use crate::core::module_index::ModuleIndex;
use crate::core::parser::{CodeParser, ParseOutcome, SourceStore};
use crate::core::syntax::{Expr, SyntaxTree};

/// Tuning knobs for the call walk
#[derive(Debug, Clone, Default)]
pub struct ExtractionOptions {
    /// Maximum number of nested resolutions (None = unlimited)
    pub max_depth: Option<usize>,
    /// Walk remote-call arguments before recording the call itself
    pub walk_call_arguments: bool,
}

impl From<&ExtractionConfig> for ExtractionOptions {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            walk_call_arguments: config.walk_call_arguments,
        }
    }
}

/// Reconstructs the call sequence of one entry function, following
/// resolvable calls into their definitions through the module index
pub struct CallGraphExtractor<'a> {
    index: &'a ModuleIndex,
    options: ExtractionOptions,
}

/// State local to one extraction
struct Traversal {
    /// (module, function) pairs currently being expanded
    in_progress: HashSet<(String, String)>,
    depth: usize,
}

impl<'a> CallGraphExtractor<'a> {
    pub fn new(index: &'a ModuleIndex, options: ExtractionOptions) -> Self {
        Self { index, options }
    }

    /// Read and parse `path`, then extract the calls made by `function`.
    ///
    /// A missing unit yields `UnknownModule` with no calls; a unit that
    /// fails to parse is an error.
    pub fn extract(
        &self,
        parser: &mut CodeParser,
        store: &dyn SourceStore,
        path: &Path,
        function: &str,
    ) -> Result<ExtractionResult> {
        match parser.load(store, path) {
            ParseOutcome::Success(tree) => Ok(self.extract_from_tree(&tree, function)),
            ParseOutcome::NotFound => {
                info!("{} not found, producing an empty diagram", path.display());
                Ok(ExtractionResult::unknown())
            }
            ParseOutcome::ParseError(reason) => Err(CalltrailError::Parser(reason)),
        }
    }

    pub fn extract_from_tree(&self, tree: &SyntaxTree, function: &str) -> ExtractionResult {
        let Some((module, definition)) = tree.find_function(function) else {
            let module_name = tree.module_name().unwrap_or(UNKNOWN_MODULE);
            info!("Function {} not found in {}", function, tree.path.display());
            return ExtractionResult::new(module_name, Vec::new());
        };

        let mut traversal = Traversal {
            in_progress: HashSet::new(),
            depth: 0,
        };
        traversal.in_progress.insert((module.name.clone(), function.to_string()));

        let calls = self.walk(&definition.body, &module.name, &mut traversal);
        debug!("{}.{} makes {} calls", module.name, function, calls.len());

        ExtractionResult::new(module.name.clone(), calls)
    }

    fn walk(&self, expr: &Expr, caller: &str, traversal: &mut Traversal) -> Vec<CallRecord> {
        match expr {
            // Both sides of a pipe stay attributed to the enclosing caller
            Expr::Pipe { left, right } => {
                let mut records = self.walk(left, caller, traversal);
                records.extend(self.walk(right, caller, traversal));
                records
            }
            Expr::RemoteCall { module, function, args } => {
                let mut records = Vec::new();
                if self.options.walk_call_arguments {
                    for arg in args {
                        records.extend(self.walk(arg, caller, traversal));
                    }
                }
                records.push(CallRecord::new(caller, module.as_str(), function.as_str()));
                records.extend(self.expand(module, function, traversal));
                records
            }
            Expr::Var(_) | Expr::Other => Vec::new(),
            Expr::Pair(left, right) => {
                let mut records = self.walk(left, caller, traversal);
                records.extend(self.walk(right, caller, traversal));
                records
            }
            Expr::LocalCall { args: items, .. } | Expr::Sequence(items) => items
                .iter()
                .flat_map(|item| self.walk(item, caller, traversal))
                .collect(),
        }
    }

    /// Records made by `module.function`'s body, with `module` as the caller
    fn expand(&self, module: &str, function: &str, traversal: &mut Traversal) -> Vec<CallRecord> {
        let Some(body) = self.index.function_body(module, function) else {
            return Vec::new();
        };

        let key = (module.to_string(), function.to_string());
        if traversal.in_progress.contains(&key) {
            debug!("Cycle through {}.{}, not expanding again", module, function);
            return Vec::new();
        }
        if let Some(max_depth) = self.options.max_depth {
            if traversal.depth >= max_depth {
                debug!("Depth limit {} reached at {}.{}", max_depth, module, function);
                return Vec::new();
            }
        }

        traversal.in_progress.insert(key.clone());
        traversal.depth += 1;
        let records = self.walk(body, module, traversal);
        traversal.depth -= 1;
        traversal.in_progress.remove(&key);

        records
    }
}
