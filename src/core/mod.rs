mod engine;
mod parser;
mod locator;
mod module_index;
mod renderer;
mod syntax;

// Call-sequence extraction
mod call_graph;

// Language-specific parsers
mod languages;

pub use parser::{CodeParser, FsSourceStore, MemorySourceStore, ParseOutcome, SourceStore, SourceText};
pub use locator::SourceLocator;
pub use module_index::{IndexDiagnostic, ModuleIndex};
pub use renderer::{DiagramDocument, SequenceDiagramRenderer};
pub use syntax::{Expr, FunctionDef, ModuleDef, SyntaxTree};
pub use languages::{ElixirParser, LanguageParser};

pub use call_graph::{
    CallGraphExtractor, CallRecord, ExtractionOptions, ExtractionResult, UNKNOWN_MODULE,
};

// Export the main engine
pub use engine::Engine;
