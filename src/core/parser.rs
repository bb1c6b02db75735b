use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::ParsingConfig;
use crate::error::{CalltrailError, Result};
use super::languages::{ElixirParser, LanguageParser};
use super::syntax::SyntaxTree;

/// Text of a source unit, or a note that it does not exist
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceText {
    Found(String),
    NotFound,
}

/// Storage collaborator used to read source units
pub trait SourceStore {
    fn read_text(&self, path: &Path) -> Result<SourceText>;
}

/// Reads source units from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSourceStore;

impl SourceStore for FsSourceStore {
    fn read_text(&self, path: &Path) -> Result<SourceText> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(SourceText::Found(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SourceText::NotFound),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store keyed by path
#[derive(Debug, Default, Clone)]
pub struct MemorySourceStore {
    files: HashMap<PathBuf, String>,
}

impl MemorySourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }

    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl SourceStore for MemorySourceStore {
    fn read_text(&self, path: &Path) -> Result<SourceText> {
        Ok(match self.files.get(path) {
            Some(text) => SourceText::Found(text.clone()),
            None => SourceText::NotFound,
        })
    }
}

/// Result of loading and parsing one source unit
#[derive(Debug)]
pub enum ParseOutcome {
    NotFound,
    ParseError(String),
    Success(SyntaxTree),
}

/// Multi-language code parser that delegates to language-specific parsers
pub struct CodeParser {
    config: ParsingConfig,
    language_parsers: HashMap<String, Box<dyn LanguageParser>>,
}

impl CodeParser {
    pub fn new(config: &ParsingConfig) -> Result<Self> {
        let mut language_parsers: HashMap<String, Box<dyn LanguageParser>> = HashMap::new();

        for language in &config.languages {
            match language.as_str() {
                "elixir" => {
                    let elixir_parser = ElixirParser::new()?;
                    language_parsers.insert("elixir".to_string(), Box::new(elixir_parser));
                }
                other => {
                    debug!("Skipping unsupported language: {}", other);
                    continue;
                }
            }
        }

        if language_parsers.is_empty() {
            return Err(CalltrailError::Config(format!(
                "No supported language in {:?}",
                config.languages
            )));
        }

        Ok(Self {
            config: config.clone(),
            language_parsers,
        })
    }

    /// Read a unit through `store` and parse it
    pub fn load(&mut self, store: &dyn SourceStore, path: &Path) -> ParseOutcome {
        let content = match store.read_text(path) {
            Ok(SourceText::Found(content)) => content,
            Ok(SourceText::NotFound) => return ParseOutcome::NotFound,
            Err(e) => {
                debug!("Treating unreadable {} as missing: {}", path.display(), e);
                return ParseOutcome::NotFound;
            }
        };

        match self.parse_source(&content, path) {
            Ok(tree) => ParseOutcome::Success(tree),
            Err(e) => ParseOutcome::ParseError(e.to_string()),
        }
    }

    /// Parse already-loaded source text
    pub fn parse_source(&mut self, content: &str, path: &Path) -> Result<SyntaxTree> {
        if content.len() > self.config.max_file_size {
            return Err(CalltrailError::Parser(
                format!("File {} exceeds maximum size limit", path.display())
            ));
        }

        let language = self.detect_language(path)?;
        match self.language_parsers.get_mut(&language) {
            Some(parser) => parser.parse(content, path),
            None => Err(CalltrailError::Parser(format!("No parser registered for {}", language))),
        }
    }

    /// File extensions handled by the registered parsers
    pub fn file_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.language_parsers
            .values()
            .flat_map(|parser| parser.file_extensions().iter().map(|ext| ext.to_string()))
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    /// Detect programming language from file path
    fn detect_language(&self, path: &Path) -> Result<String> {
        if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
            for (lang, parser) in &self.language_parsers {
                if parser.file_extensions().contains(&extension) {
                    return Ok(lang.clone());
                }
            }
        }

        Err(CalltrailError::Parser(
            format!("Could not detect language for file: {}", path.display())
        ))
    }
}
