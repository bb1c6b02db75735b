//! Language-specific parsers
//!
//! Each language gets its own module with a consistent interface for lowering
//! source code into the shared `SyntaxTree` representation.

mod elixir;

pub use elixir::ElixirParser;

use crate::error::Result;
use super::syntax::SyntaxTree;

/// Trait that all language parsers must implement
pub trait LanguageParser {
    /// Parse source code into a syntax tree; malformed input is an error
    fn parse(&mut self, content: &str, file_path: &std::path::Path) -> Result<SyntaxTree>;

    /// Get the file extensions this parser handles
    fn file_extensions(&self) -> &[&str];

    /// Get the language name
    fn language_name(&self) -> &str;
}
